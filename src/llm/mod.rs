//! LLM provider boundary
//!
//! One contract covers every provider: a system prompt, a user prompt, and a
//! raw text reply that may arrive wrapped in a fenced code block. Provider
//! selection is configuration; the core only sees [`LlmClient`].

mod http_backend;

pub use http_backend::HttpLlmClient;

use crate::error::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

/// A single completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one request and return the raw reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String>;

    /// Model identifier stamped onto extraction records.
    fn model(&self) -> &str;
}

/// Retry a completion on transient provider errors only. Malformed replies are
/// the caller's problem and are never retried here.
pub async fn complete_with_retry(
    client: &dyn LlmClient,
    request: &CompletionRequest,
    max_attempts: u32,
) -> Result<String> {
    let max_attempts = max_attempts.max(1);
    let mut last_err = None;

    for attempt in 0..max_attempts {
        match client.complete(request).await {
            Ok(reply) => return Ok(reply),
            Err(e) if e.is_transient() => {
                warn!("LLM attempt {}/{} failed: {}", attempt + 1, max_attempts, e);
                last_err = Some(e);
                if attempt + 1 < max_attempts {
                    tokio::time::sleep(backoff_delay(attempt)).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| Error::Llm("no attempts made".to_string())))
}

/// Exponential backoff: 1s, 2s, 4s, ... capped at 10s.
fn backoff_delay(attempt: u32) -> Duration {
    let secs = 1u64 << attempt.min(4);
    Duration::from_secs(secs.min(10))
}

/// Strip ```json / ``` fences a provider may wrap the reply in.
pub fn strip_code_fences(response: &str) -> String {
    let response = response.trim();

    if response.starts_with("```json") {
        let content = response.strip_prefix("```json").unwrap_or(response);
        let content = content.strip_suffix("```").unwrap_or(content);
        return content.trim().to_string();
    }

    if response.starts_with("```") {
        let content = response.strip_prefix("```").unwrap_or(response);
        let content = content.strip_suffix("```").unwrap_or(content);
        return content.trim().to_string();
    }

    response.to_string()
}
