//! Default values for configuration

/// Default LLM endpoint (OpenAI-style chat completions)
pub fn default_llm_base_url() -> String {
    std::env::var("STORYFORGE_LLM_URL")
        .unwrap_or_else(|_| "https://api.openai.com".to_string())
}

/// Default model identifier
pub fn default_llm_model() -> String {
    "gpt-4o".to_string()
}

/// Default environment variable name for the provider API key
pub fn default_llm_api_key_env() -> String {
    "STORYFORGE_LLM_API_KEY".to_string()
}

/// Default max tokens per completion
pub fn default_llm_max_tokens() -> u32 {
    4096
}

/// Default sampling temperature
pub fn default_llm_temperature() -> f32 {
    0.7
}

/// Default retry attempts for transient provider errors
pub fn default_llm_max_attempts() -> u32 {
    3
}

/// Default allowed documentation domains
pub fn default_allowed_domains() -> Vec<String> {
    vec![
        "elastic.co".to_string(),
        "github.com".to_string(),
        "docs.github.com".to_string(),
    ]
}

/// Default maximum characters kept per scraped page
pub fn default_max_content_length() -> usize {
    50_000
}

/// Default maximum sources (primary + related) per feature
pub fn default_max_sources() -> usize {
    10
}

/// Default minimum relevance score for related pages
pub fn default_related_min_score() -> f32 {
    0.3
}

/// Default rate limit (requests per second per host)
pub fn default_rate_limit_per_host() -> f64 {
    2.0
}

/// Default global rate limit (requests per second across all hosts)
pub fn default_global_rate_limit() -> u32 {
    8
}

/// Default user agent
pub fn default_user_agent() -> String {
    format!("storyforge/{} (Documentation Researcher)", env!("CARGO_PKG_VERSION"))
}

/// Default request timeout in seconds
pub fn default_fetch_timeout() -> u64 {
    30
}

/// Generic main-content selectors, tried in order; first match wins
pub fn default_content_selectors() -> Vec<String> {
    vec![
        "main".to_string(),
        "article".to_string(),
        "div.main-content".to_string(),
        "div.content".to_string(),
        "div#content".to_string(),
        "body".to_string(),
    ]
}

/// Default embedding backend URL (empty = embeddings skipped)
pub fn default_embedding_backend_url() -> String {
    std::env::var("STORYFORGE_EMBEDDING_BACKEND_URL").unwrap_or_default()
}

/// Default embedding model
pub fn default_embedding_model() -> String {
    "elser-v2".to_string()
}

/// Default document store URL (empty = store disabled)
pub fn default_store_url() -> String {
    std::env::var("STORYFORGE_STORE_URL").unwrap_or_default()
}

/// Default document store index name
pub fn default_store_index() -> String {
    "storyforge_features".to_string()
}

/// Default slide count for generated decks
pub fn default_slide_count() -> usize {
    7
}

/// Default audience descriptor
pub fn default_audience() -> String {
    "technical decision makers".to_string()
}

/// Default narrative style
pub fn default_narrative_style() -> String {
    "customer journey".to_string()
}

/// Default technical depth
pub fn default_technical_depth() -> String {
    "medium".to_string()
}

/// AI-Innovation keyword table (24 terms)
pub fn default_ai_keywords() -> Vec<String> {
    [
        "machine learning",
        "artificial intelligence",
        "ai-powered",
        "ai-driven",
        "ai assistant",
        "genai",
        "generative ai",
        "llm",
        "large language model",
        "agent",
        "agentic",
        "copilot",
        "chatbot",
        "semantic search",
        "vector search",
        "vector database",
        "embedding",
        "neural",
        "inference",
        "retrieval-augmented",
        "natural language",
        "transformer",
        "anomaly detection",
        "predictive",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Simplify keyword table (19 terms)
pub fn default_simplify_keywords() -> Vec<String> {
    [
        "simplif",
        "automat",
        "effortless",
        "streamline",
        "intuitive",
        "out of the box",
        "zero config",
        "managed service",
        "serverless",
        "consolidat",
        "unified",
        "single pane",
        "guided",
        "turnkey",
        "low-code",
        "no-code",
        "declarative",
        "one-click",
        "onboarding",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

/// Optimize keyword table (19 terms)
pub fn default_optimize_keywords() -> Vec<String> {
    [
        "optimiz",
        "performance",
        "faster",
        "latency",
        "throughput",
        "efficien",
        "cost",
        "memory",
        "storage",
        "compress",
        "scalab",
        "speed",
        "benchmark",
        "reduce",
        "footprint",
        "cache",
        "utilization",
        "density",
        "hardware",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
