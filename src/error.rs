//! Custom error types for storyforge

use thiserror::Error;

/// Main error type for storyforge operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Classification error: {0}")]
    Classify(String),

    #[error("Research error: {0}")]
    Research(String),

    #[error("LLM provider error: {0}")]
    Llm(String),

    #[error("LLM provider unavailable after retries: {0}")]
    LlmTransient(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Generation error: {0}")]
    Generation(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Domain not allowed: {0}")]
    BlockedDomain(String),

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("{0}")]
    Other(String),
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl Error {
    /// Whether a retry against the provider could plausibly succeed.
    /// Malformed replies and missing fields are terminal; only transport-level
    /// failures are transient.
    pub fn is_transient(&self) -> bool {
        matches!(self, Error::LlmTransient(_))
    }
}

/// Result type alias for storyforge
pub type Result<T> = std::result::Result<T, Error>;
