//! OpenAI-style chat completions backend

use super::{CompletionRequest, LlmClient};
use crate::config::LlmConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: String,
}

pub struct HttpLlmClient {
    client: Client,
    endpoint: Url,
    model: String,
    api_key: String,
}

impl HttpLlmClient {
    /// Build a client from config. Returns None when no API key is present,
    /// which callers treat as "skip LLM steps".
    pub fn from_config(config: &LlmConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key() else {
            return Ok(None);
        };

        let base = Url::parse(&config.base_url)?;
        let endpoint = base
            .join("/v1/chat/completions")
            .map_err(|e| Error::Config(format!("Invalid LLM base URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint,
            model: config.model.clone(),
            api_key,
        }))
    }

    fn classify_status(status: StatusCode, body: &str) -> Error {
        if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
            Error::LlmTransient(format!("HTTP {}: {}", status, truncate(body, 200)))
        } else {
            Error::Llm(format!("HTTP {}: {}", status, truncate(body, 200)))
        }
    }
}

#[async_trait]
impl LlmClient for HttpLlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: request.system_prompt.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: request.user_prompt.clone(),
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() || e.is_connect() {
                    Error::LlmTransient(e.to_string())
                } else {
                    Error::Llm(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Self::classify_status(status, &text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Llm(format!("Malformed provider response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Llm("Provider returned no choices".to_string()))
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn truncate(text: &str, max: usize) -> &str {
    if text.len() <= max {
        text
    } else {
        let mut end = max;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        &text[..end]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert!(
            HttpLlmClient::classify_status(StatusCode::TOO_MANY_REQUESTS, "slow down")
                .is_transient()
        );
        assert!(
            HttpLlmClient::classify_status(StatusCode::BAD_GATEWAY, "upstream").is_transient()
        );
        assert!(!HttpLlmClient::classify_status(StatusCode::BAD_REQUEST, "nope").is_transient());
        assert!(!HttpLlmClient::classify_status(StatusCode::UNAUTHORIZED, "key").is_transient());
    }

    #[test]
    fn test_from_config_without_key_is_none() {
        let mut config = LlmConfig::default();
        config.api_key_env = "STORYFORGE_TEST_MISSING_KEY".to_string();
        assert!(HttpLlmClient::from_config(&config).unwrap().is_none());
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let text = "héllo wörld";
        let cut = truncate(text, 2);
        assert!(cut.len() <= 2);
        assert!(text.starts_with(cut));
    }
}
