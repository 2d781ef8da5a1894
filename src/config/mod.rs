//! Configuration management for storyforge
//!
//! Handles loading, saving, and validating configuration from TOML files.

mod defaults;

pub use defaults::*;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::{debug, info};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LLM provider configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Documentation research configuration
    #[serde(default)]
    pub research: ResearchConfig,

    /// Embedding backend configuration
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Document store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Theme keyword tables for the classifier
    #[serde(default)]
    pub keywords: ThemeKeywords,

    /// Deck generation defaults
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Paths configuration (internal, not user-editable)
    #[serde(skip)]
    pub paths: PathsConfig,
}

/// LLM provider configuration (OpenAI-style chat completions endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable name holding the API key
    #[serde(default = "default_llm_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_llm_temperature")]
    pub temperature: f32,

    #[serde(default = "default_llm_max_attempts")]
    pub max_attempts: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_llm_api_key_env(),
            max_tokens: default_llm_max_tokens(),
            temperature: default_llm_temperature(),
            max_attempts: default_llm_max_attempts(),
        }
    }
}

impl LlmConfig {
    /// An LLM client is configured when the API key is present. Absence means
    /// extraction and generation steps are skipped, not failed.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty())
    }
}

/// Documentation research configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchConfig {
    /// Allowed documentation domains (suffix match on the URL host)
    #[serde(default = "default_allowed_domains")]
    pub allowed_domains: Vec<String>,

    /// Maximum characters kept per scraped page
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,

    /// Maximum sources (primary + related) per feature
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,

    /// Minimum relevance score for discovered related pages
    #[serde(default = "default_related_min_score")]
    pub related_min_score: f32,

    /// Requests per second per host
    #[serde(default = "default_rate_limit_per_host")]
    pub rate_limit_per_host: f64,

    /// Requests per second across all hosts
    #[serde(default = "default_global_rate_limit")]
    pub global_rate_limit: u32,

    /// User agent string
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "default_fetch_timeout")]
    pub timeout_secs: u64,

    /// Generic main-content selectors, tried in order
    #[serde(default = "default_content_selectors")]
    pub content_selectors: Vec<String>,

    /// Per-host selector overrides (host -> ordered selector list)
    #[serde(default)]
    pub host_selectors: HashMap<String, Vec<String>>,
}

impl Default for ResearchConfig {
    fn default() -> Self {
        Self {
            allowed_domains: default_allowed_domains(),
            max_content_length: default_max_content_length(),
            max_sources: default_max_sources(),
            related_min_score: default_related_min_score(),
            rate_limit_per_host: default_rate_limit_per_host(),
            global_rate_limit: default_global_rate_limit(),
            user_agent: default_user_agent(),
            timeout_secs: default_fetch_timeout(),
            content_selectors: default_content_selectors(),
            host_selectors: HashMap::new(),
        }
    }
}

impl ResearchConfig {
    /// Selector list for a host: override if configured, else the generic list.
    pub fn selectors_for_host(&self, host: &str) -> &[String] {
        self.host_selectors
            .get(host)
            .map(|v| v.as_slice())
            .unwrap_or(&self.content_selectors)
    }
}

/// Embedding backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Backend URL; empty disables the embedding step
    #[serde(default = "default_embedding_backend_url")]
    pub backend_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            backend_url: default_embedding_backend_url(),
            model: default_embedding_model(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_configured(&self) -> bool {
        !self.backend_url.is_empty()
    }
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Store base URL; empty disables persistence
    #[serde(default = "default_store_url")]
    pub url: String,

    #[serde(default = "default_store_index")]
    pub index: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            index: default_store_index(),
        }
    }
}

impl StoreConfig {
    pub fn is_configured(&self) -> bool {
        !self.url.is_empty()
    }
}

/// Immutable keyword tables for the theme classifier. Built once at startup
/// and passed in explicitly; there is no global keyword state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThemeKeywords {
    #[serde(default = "default_ai_keywords")]
    pub ai: Vec<String>,

    #[serde(default = "default_simplify_keywords")]
    pub simplify: Vec<String>,

    #[serde(default = "default_optimize_keywords")]
    pub optimize: Vec<String>,
}

impl Default for ThemeKeywords {
    fn default() -> Self {
        Self {
            ai: default_ai_keywords(),
            simplify: default_simplify_keywords(),
            optimize: default_optimize_keywords(),
        }
    }
}

/// Deck generation defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_slide_count")]
    pub slide_count: usize,

    #[serde(default = "default_audience")]
    pub audience: String,

    #[serde(default = "default_narrative_style")]
    pub narrative_style: String,

    #[serde(default = "default_technical_depth")]
    pub technical_depth: String,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            slide_count: default_slide_count(),
            audience: default_audience(),
            narrative_style: default_narrative_style(),
            technical_depth: default_technical_depth(),
        }
    }
}

/// Resolved filesystem paths
#[derive(Debug, Clone, Default)]
pub struct PathsConfig {
    pub base_dir: PathBuf,
    pub config_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            research: ResearchConfig::default(),
            embedding: EmbeddingConfig::default(),
            store: StoreConfig::default(),
            keywords: ThemeKeywords::default(),
            generation: GenerationConfig::default(),
            paths: PathsConfig::default(),
        }
    }
}

impl Config {
    /// Resolve paths under the given base directory (defaults to
    /// `~/.config/storyforge`).
    pub fn init_paths(&mut self, base_dir: Option<PathBuf>) {
        let base = base_dir.unwrap_or_else(|| {
            dirs::config_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("storyforge")
        });
        self.paths.config_file = base.join("config.toml");
        self.paths.base_dir = base;
    }

    /// Load configuration, falling back to defaults when no file exists.
    pub fn load_from(base_dir: Option<PathBuf>) -> Result<Self> {
        let mut config = Config::default();
        config.init_paths(base_dir);

        if config.paths.config_file.exists() {
            debug!("Loading config from {:?}", config.paths.config_file);
            let content = std::fs::read_to_string(&config.paths.config_file)?;
            let mut loaded: Config = toml::from_str(&content)?;
            loaded.paths = config.paths;
            config = loaded;
        } else {
            debug!("No config file found, using defaults");
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.paths.config_file.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&self.paths.config_file, content)?;
        info!("Saved config to {:?}", self.paths.config_file);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.research.rate_limit_per_host <= 0.0 {
            return Err(Error::Config(
                "research.rate_limit_per_host must be positive".to_string(),
            ));
        }

        if self.research.max_sources == 0 {
            return Err(Error::Config(
                "research.max_sources must be at least 1".to_string(),
            ));
        }

        if self.research.related_min_score < 0.0 || self.research.related_min_score > 1.0 {
            return Err(Error::Config(
                "research.related_min_score must be between 0.0 and 1.0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(
                "llm.temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.llm.max_attempts == 0 {
            return Err(Error::Config(
                "llm.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.keywords.ai.is_empty()
            || self.keywords.simplify.is_empty()
            || self.keywords.optimize.is_empty()
        {
            return Err(Error::Config(
                "keywords tables must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.generation.slide_count, 7);
        assert_eq!(config.keywords.ai.len(), 24);
        assert_eq!(config.keywords.simplify.len(), 19);
        assert_eq!(config.keywords.optimize.len(), 19);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let mut config = Config::default();
        config.init_paths(Some(tmp.path().to_path_buf()));
        config.llm.model = "test-model".to_string();

        config.save().unwrap();
        assert!(config.paths.config_file.exists());

        let loaded = Config::load_from(Some(tmp.path().to_path_buf())).unwrap();
        assert_eq!(loaded.llm.model, "test-model");
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.research.rate_limit_per_host = 0.0;
        assert!(config.validate().is_err());

        config.research.rate_limit_per_host = 2.0;
        assert!(config.validate().is_ok());

        config.llm.temperature = 3.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_selectors_for_host_override() {
        let mut config = ResearchConfig::default();
        config.host_selectors.insert(
            "docs.example.com".to_string(),
            vec!["div.docs-body".to_string()],
        );

        assert_eq!(
            config.selectors_for_host("docs.example.com"),
            &["div.docs-body".to_string()]
        );
        assert_eq!(
            config.selectors_for_host("other.example.com"),
            config.content_selectors.as_slice()
        );
    }
}
