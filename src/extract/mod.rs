//! Stage 1: structured extraction from scraped documentation
//!
//! Sends raw page text plus a fixed-schema prompt to the LLM provider and
//! parses the JSON reply into an [`ExtractedContent`] record. The five
//! required fields must come back non-empty or the extraction fails; a
//! malformed reply is terminal and never retried.

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::llm::{complete_with_retry, strip_code_fences, CompletionRequest, LlmClient};
use crate::models::ExtractedContent;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;

/// Maximum characters of scraped text embedded into the user prompt.
const MAX_PROMPT_CHARS: usize = 8_000;

const EXTRACTION_SYSTEM_PROMPT: &str = r#"You are a technical content analyst. You read product documentation and distill it into a structured JSON record for marketing and training material.

Respond with a single JSON object matching this schema exactly (no prose, no markdown outside the JSON):
{
  "summary": "2-3 sentence plain-language summary of the feature",
  "use_cases": ["concrete scenario the feature addresses", ...],
  "key_capabilities": ["specific capability", ...],
  "benefits": ["customer-facing benefit", ...],
  "technical_requirements": ["version, license, or infrastructure requirement", ...],
  "configuration_examples": ["short config snippet or setting", ...],
  "metrics_examples": ["quantified improvement from the docs", ...],
  "api_commands": ["API call or CLI command", ...],
  "limitations": ["known limitation or caveat", ...],
  "comparisons": ["comparison with an alternative approach", ...],
  "demo_scenario": "one walkthrough-able demo idea or null",
  "business_impact": ["business-level outcome", ...],
  "competitive_advantages": ["differentiator", ...],
  "visual_suggestions": ["diagram or screenshot idea", ...],
  "target_audience": "primary audience or null",
  "complexity_level": "beginner|intermediate|advanced or null"
}

Extraction guidelines:
1. summary, use_cases, key_capabilities, benefits, and technical_requirements are mandatory and must be non-empty.
2. Use only information present in the supplied documentation; never invent capabilities.
3. Keep every list item to one sentence.
4. Prefer concrete configuration examples (setting names, YAML keys, flags) over descriptions of configuration.
5. Quote quantified metrics exactly as the docs state them (percentages, latencies, dollar figures).
6. Include API commands verbatim, including the HTTP verb or CLI binary name.
7. Record version availability and license tier requirements under technical_requirements.
8. Record preview/beta/GA status under technical_requirements when stated.
9. List limitations the docs admit to, including scale ceilings and unsupported platforms.
10. Note comparisons the docs draw against previous versions or competing approaches.
11. Propose exactly one demo_scenario when the docs describe something walkthrough-able, else null.
12. business_impact items must name an outcome (cost, risk, time), not restate a capability.
13. competitive_advantages must be defensible from the text, not marketing superlatives.
14. visual_suggestions should reference actual structures in the docs (architecture, data flow, UI).
15. Infer target_audience from the docs' register (developers, SREs, security analysts, executives).
16. Set complexity_level from the prerequisites the docs assume.
"#;

/// Raw shape of the provider reply. Only the five required fields are
/// mandatory at the serde level; emptiness is checked separately so the error
/// can name the field.
#[derive(Debug, Deserialize)]
struct ExtractionReply {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    use_cases: Vec<String>,
    #[serde(default)]
    key_capabilities: Vec<String>,
    #[serde(default)]
    benefits: Vec<String>,
    #[serde(default)]
    technical_requirements: Vec<String>,
    #[serde(default)]
    configuration_examples: Vec<String>,
    #[serde(default)]
    metrics_examples: Vec<String>,
    #[serde(default)]
    api_commands: Vec<String>,
    #[serde(default)]
    limitations: Vec<String>,
    #[serde(default)]
    comparisons: Vec<String>,
    #[serde(default)]
    demo_scenario: Option<String>,
    #[serde(default)]
    business_impact: Vec<String>,
    #[serde(default)]
    competitive_advantages: Vec<String>,
    #[serde(default)]
    visual_suggestions: Vec<String>,
    #[serde(default)]
    target_audience: Option<String>,
    #[serde(default)]
    complexity_level: Option<String>,
}

pub struct ExtractionStage<'a> {
    client: &'a dyn LlmClient,
    llm: &'a LlmConfig,
}

impl<'a> ExtractionStage<'a> {
    pub fn new(client: &'a dyn LlmClient, llm: &'a LlmConfig) -> Self {
        Self { client, llm }
    }

    /// Run Stage-1 extraction over one feature's scraped text.
    pub async fn extract(
        &self,
        feature_name: &str,
        raw_text: &str,
        source_url: &str,
    ) -> Result<ExtractedContent> {
        let request = CompletionRequest {
            system_prompt: EXTRACTION_SYSTEM_PROMPT.to_string(),
            user_prompt: build_user_prompt(feature_name, raw_text, source_url),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
        };

        let reply = complete_with_retry(self.client, &request, self.llm.max_attempts).await?;
        debug!("Stage-1 reply: {} chars", reply.len());

        parse_extraction_reply(&reply, self.client.model())
    }
}

fn build_user_prompt(feature_name: &str, raw_text: &str, source_url: &str) -> String {
    format!(
        "Feature: {}\nSource: {}\n\nDocumentation:\n{}",
        feature_name,
        source_url,
        truncate_chars(raw_text, MAX_PROMPT_CHARS)
    )
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Parse and validate the provider reply. Malformed JSON or a missing/empty
/// required field is a terminal extraction failure.
pub fn parse_extraction_reply(reply: &str, model: &str) -> Result<ExtractedContent> {
    let cleaned = strip_code_fences(reply);

    let parsed: ExtractionReply = serde_json::from_str(&cleaned)
        .map_err(|e| Error::Extraction(format!("Reply is not valid JSON: {}", e)))?;

    let missing: Vec<&str> = [
        ("summary", parsed.summary.trim().is_empty()),
        ("use_cases", parsed.use_cases.is_empty()),
        ("key_capabilities", parsed.key_capabilities.is_empty()),
        ("benefits", parsed.benefits.is_empty()),
        (
            "technical_requirements",
            parsed.technical_requirements.is_empty(),
        ),
    ]
    .iter()
    .filter(|(_, empty)| *empty)
    .map(|(name, _)| *name)
    .collect();

    if !missing.is_empty() {
        return Err(Error::Extraction(format!(
            "Required field(s) missing or empty: {}",
            missing.join(", ")
        )));
    }

    Ok(ExtractedContent {
        summary: parsed.summary,
        use_cases: parsed.use_cases,
        key_capabilities: parsed.key_capabilities,
        benefits: parsed.benefits,
        technical_requirements: parsed.technical_requirements,
        configuration_examples: parsed.configuration_examples,
        metrics_examples: parsed.metrics_examples,
        api_commands: parsed.api_commands,
        limitations: parsed.limitations,
        comparisons: parsed.comparisons,
        demo_scenario: parsed.demo_scenario,
        business_impact: parsed.business_impact,
        competitive_advantages: parsed.competitive_advantages,
        visual_suggestions: parsed.visual_suggestions,
        target_audience: parsed.target_audience,
        complexity_level: parsed.complexity_level,
        extracted_at: Utc::now(),
        model: model.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_reply() -> String {
        r#"{
            "summary": "A feature that does things.",
            "use_cases": ["Searching logs"],
            "key_capabilities": ["Fast indexing"],
            "benefits": ["Lower latency"],
            "technical_requirements": ["Version 9.0+"],
            "metrics_examples": ["95% less memory"],
            "demo_scenario": "Index a sample dataset",
            "complexity_level": "intermediate"
        }"#
        .to_string()
    }

    #[test]
    fn test_parse_valid_reply() {
        let extracted = parse_extraction_reply(&valid_reply(), "test-model").unwrap();
        assert_eq!(extracted.summary, "A feature that does things.");
        assert_eq!(extracted.metrics_examples, vec!["95% less memory"]);
        assert_eq!(extracted.demo_scenario.as_deref(), Some("Index a sample dataset"));
        assert!(extracted.limitations.is_empty());
        assert_eq!(extracted.model, "test-model");
    }

    #[test]
    fn test_parse_fenced_reply() {
        let fenced = format!("```json\n{}\n```", valid_reply());
        assert!(parse_extraction_reply(&fenced, "m").is_ok());
    }

    #[test]
    fn test_missing_required_field_fails() {
        let reply = r#"{
            "summary": "Something",
            "use_cases": ["one"],
            "key_capabilities": ["one"],
            "benefits": ["one"]
        }"#;
        let err = parse_extraction_reply(reply, "m").unwrap_err();
        assert!(err.to_string().contains("technical_requirements"));
    }

    #[test]
    fn test_empty_required_list_fails() {
        let reply = r#"{
            "summary": "Something",
            "use_cases": [],
            "key_capabilities": ["one"],
            "benefits": ["one"],
            "technical_requirements": ["one"]
        }"#;
        let err = parse_extraction_reply(reply, "m").unwrap_err();
        assert!(err.to_string().contains("use_cases"));
    }

    #[test]
    fn test_blank_summary_fails() {
        let reply = r#"{
            "summary": "   ",
            "use_cases": ["one"],
            "key_capabilities": ["one"],
            "benefits": ["one"],
            "technical_requirements": ["one"]
        }"#;
        assert!(parse_extraction_reply(reply, "m").is_err());
    }

    #[test]
    fn test_invalid_json_fails_terminally() {
        let err = parse_extraction_reply("not json at all", "m").unwrap_err();
        assert!(!err.is_transient());
    }

    #[test]
    fn test_user_prompt_truncates_to_limit() {
        let long_text = "x".repeat(20_000);
        let prompt = build_user_prompt("Feat", &long_text, "https://example.com");
        assert!(prompt.contains("Feature: Feat"));
        assert!(prompt.len() < 8_200);
    }

    #[test]
    fn test_truncate_chars_handles_multibyte() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 3), "ééé");
        assert_eq!(truncate_chars("short", 100), "short");
    }
}
