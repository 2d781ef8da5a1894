//! Stage 2: narrative deck generation
//!
//! Assembles the Stage-1 records of one or more features into a single prompt
//! requesting an N-slide story arc, then parses and post-processes the reply.
//! Requires at least one feature with a completed extraction; fails before any
//! provider call otherwise.

use crate::config::LlmConfig;
use crate::error::{Error, Result};
use crate::llm::{complete_with_retry, strip_code_fences, CompletionRequest, LlmClient};
use crate::models::{
    Domain, ExtractedContent, Feature, Presentation, SlideContent, StoryArc, StoryPosition, Theme,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

/// Per-feature caps applied when rendering context blocks.
const MAX_USE_CASES: usize = 3;
const MAX_CAPABILITIES: usize = 4;
const MAX_BENEFITS: usize = 3;
const MAX_ENRICHMENT_ITEMS: usize = 3;

/// Generation parameters accepted from the CLI/API surface.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    pub domain: Domain,
    pub audience: String,
    pub narrative_style: String,
    pub technical_depth: String,
    pub slide_count: usize,
    pub quarter: String,
}

#[derive(Debug, Deserialize)]
struct DeckReply {
    #[serde(default)]
    title: String,
    #[serde(default)]
    slides: Vec<SlideReply>,
    #[serde(default)]
    story_arc: Option<StoryArcReply>,
}

#[derive(Debug, Deserialize)]
struct SlideReply {
    title: String,
    #[serde(default)]
    subtitle: Option<String>,
    #[serde(default)]
    content: String,
    #[serde(default)]
    business_value: String,
    #[serde(default)]
    theme: String,
    #[serde(default)]
    speaker_notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StoryArcReply {
    #[serde(default)]
    opening_hook: String,
    #[serde(default)]
    central_theme: String,
    #[serde(default)]
    narrative_thread: String,
    #[serde(default)]
    climax_feature: Option<String>,
    #[serde(default)]
    resolution_message: String,
    #[serde(default)]
    call_to_action: String,
}

pub struct GenerationStage<'a> {
    client: &'a dyn LlmClient,
    llm: &'a LlmConfig,
}

impl<'a> GenerationStage<'a> {
    pub fn new(client: &'a dyn LlmClient, llm: &'a LlmConfig) -> Self {
        Self { client, llm }
    }

    /// Generate a deck from features carrying completed Stage-1 extractions.
    pub async fn generate(
        &self,
        features: &[Feature],
        params: &GenerationParams,
    ) -> Result<Presentation> {
        let qualifying: Vec<(&Feature, &ExtractedContent)> = features
            .iter()
            .filter_map(|f| f.extraction().map(|e| (f, e)))
            .collect();

        if qualifying.is_empty() {
            return Err(Error::Generation(
                "No features with completed extraction; nothing to generate".to_string(),
            ));
        }

        let request = CompletionRequest {
            system_prompt: build_system_prompt(params),
            user_prompt: build_user_prompt(&qualifying, params),
            max_tokens: self.llm.max_tokens,
            temperature: self.llm.temperature,
        };

        let reply = complete_with_retry(self.client, &request, self.llm.max_attempts).await?;
        debug!("Stage-2 reply: {} chars", reply.len());

        let feature_ids = qualifying.iter().map(|(f, _)| f.id.clone()).collect();
        parse_deck_reply(&reply, params, feature_ids)
    }
}

fn build_system_prompt(params: &GenerationParams) -> String {
    let mut prompt = format!(
        "You are a presentation writer building a {slides}-slide feature-launch deck \
         for {audience}. Narrative style: {style}. Technical depth: {depth}.\n\n\
         Respond with a single JSON object (no prose outside the JSON):\n\
         {{\n\
         \x20 \"title\": \"deck title\",\n\
         \x20 \"slides\": [\n\
         \x20   {{\"title\": \"...\", \"subtitle\": \"... or null\", \"content\": \"markdown body\", \
         \"business_value\": \"one sentence\", \"theme\": \"simplify|optimize|ai_innovation\", \
         \"speaker_notes\": \"... or null\"}}\n\
         \x20 ],\n\
         \x20 \"story_arc\": {{\"opening_hook\": \"...\", \"central_theme\": \"...\", \
         \"narrative_thread\": \"...\", \"climax_feature\": \"feature name or null\", \
         \"resolution_message\": \"...\", \"call_to_action\": \"...\"}}\n\
         }}\n\n\
         Produce exactly {slides} slides, in order.",
        slides = params.slide_count,
        audience = params.audience,
        style = params.narrative_style,
        depth = params.technical_depth,
    );

    if params.slide_count == 7 {
        prompt.push_str(
            "\n\nUse this mandatory 7-slide narrative skeleton:\n\
             1. Hook: the customer pain this launch answers\n\
             2. Overview: what is shipping and why it matters\n\
             3. Simplify deep-dive\n\
             4. Optimize deep-dive\n\
             5. AI Innovation deep-dive\n\
             6. Business case: quantified impact\n\
             7. Call to action\n",
        );
    }

    prompt
}

fn build_user_prompt(features: &[(&Feature, &ExtractedContent)], params: &GenerationParams) -> String {
    let mut blocks = Vec::with_capacity(features.len() + 1);
    blocks.push(format!(
        "Domain: {} ({})\nQuarter: {}",
        params.domain.title(),
        params.domain.tagline(),
        params.quarter
    ));

    for (feature, extracted) in features {
        blocks.push(feature_context_block(feature, extracted));
    }

    blocks.join("\n\n---\n\n")
}

/// Compact context block for one feature, with every list capped to keep the
/// prompt bounded.
fn feature_context_block(feature: &Feature, extracted: &ExtractedContent) -> String {
    let mut lines = vec![
        format!("Feature: {}", feature.name),
        format!("Summary: {}", extracted.summary),
    ];

    push_capped(&mut lines, "Use cases", &extracted.use_cases, MAX_USE_CASES);
    push_capped(
        &mut lines,
        "Key capabilities",
        &extracted.key_capabilities,
        MAX_CAPABILITIES,
    );
    push_capped(&mut lines, "Benefits", &extracted.benefits, MAX_BENEFITS);

    if let Some(demo) = &extracted.demo_scenario {
        lines.push(format!("Demo scenario: {}", demo));
    }
    push_capped(
        &mut lines,
        "Business impact",
        &extracted.business_impact,
        MAX_ENRICHMENT_ITEMS,
    );
    push_capped(
        &mut lines,
        "Competitive advantages",
        &extracted.competitive_advantages,
        MAX_ENRICHMENT_ITEMS,
    );
    push_capped(
        &mut lines,
        "Visual suggestions",
        &extracted.visual_suggestions,
        MAX_ENRICHMENT_ITEMS,
    );
    push_capped(
        &mut lines,
        "Comparisons",
        &extracted.comparisons,
        MAX_ENRICHMENT_ITEMS,
    );

    lines.join("\n")
}

fn push_capped(lines: &mut Vec<String>, label: &str, items: &[String], cap: usize) {
    if items.is_empty() {
        return;
    }
    let shown: Vec<&str> = items.iter().take(cap).map(|s| s.as_str()).collect();
    lines.push(format!("{}: {}", label, shown.join("; ")));
}

/// Parse the provider reply into a [`Presentation`]. An unrecognized theme on
/// one slide is defaulted, never fatal; an empty slide list is.
pub fn parse_deck_reply(
    reply: &str,
    params: &GenerationParams,
    feature_ids: Vec<String>,
) -> Result<Presentation> {
    let cleaned = strip_code_fences(reply);

    let parsed: DeckReply = serde_json::from_str(&cleaned)
        .map_err(|e| Error::Generation(format!("Reply is not valid JSON: {}", e)))?;

    if parsed.slides.is_empty() {
        return Err(Error::Generation("Reply contained no slides".to_string()));
    }

    let total = parsed.slides.len();
    let slides: Vec<SlideContent> = parsed
        .slides
        .into_iter()
        .enumerate()
        .map(|(index, slide)| {
            let theme = Theme::parse_loose(&slide.theme).unwrap_or_else(|| {
                warn!(
                    "Unrecognized theme '{}' on slide {}; defaulting to AI Innovation",
                    slide.theme,
                    index + 1
                );
                Theme::AiInnovation
            });

            SlideContent {
                title: slide.title,
                subtitle: slide.subtitle,
                body: slide.content,
                business_value: slide.business_value,
                theme,
                story_position: Some(StoryPosition::for_index(index, total)),
                talk_track: slide.speaker_notes,
                customer_stories: Vec::new(),
                business_impact: None,
            }
        })
        .collect();

    let story_arc = parsed.story_arc.map(|arc| StoryArc {
        opening_hook: arc.opening_hook,
        central_theme: arc.central_theme,
        narrative_thread: arc.narrative_thread,
        climax_feature: arc.climax_feature,
        resolution_message: arc.resolution_message,
        call_to_action: arc.call_to_action,
    });

    let title = if parsed.title.trim().is_empty() {
        format!("{} - {}", params.domain.title(), params.quarter)
    } else {
        parsed.title
    };

    let featured_themes = Presentation::derive_featured_themes(&slides);

    Ok(Presentation {
        title,
        slides,
        domain: params.domain,
        quarter: params.quarter.clone(),
        feature_ids,
        featured_themes,
        story_arc,
        generated_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentResearch, Domain, ResearchStatus};

    fn params() -> GenerationParams {
        GenerationParams {
            domain: Domain::Search,
            audience: "technical decision makers".to_string(),
            narrative_style: "customer journey".to_string(),
            technical_depth: "medium".to_string(),
            slide_count: 7,
            quarter: "Q3 2026".to_string(),
        }
    }

    fn extracted() -> ExtractedContent {
        ExtractedContent {
            summary: "Does things quickly.".to_string(),
            use_cases: vec!["a".into(), "b".into(), "c".into(), "d".into()],
            key_capabilities: vec!["cap".into()],
            benefits: vec!["ben".into()],
            technical_requirements: vec!["9.0+".into()],
            configuration_examples: vec![],
            metrics_examples: vec![],
            api_commands: vec![],
            limitations: vec![],
            comparisons: vec![],
            demo_scenario: Some("demo it".into()),
            business_impact: vec![],
            competitive_advantages: vec![],
            visual_suggestions: vec![],
            target_audience: None,
            complexity_level: None,
            extracted_at: Utc::now(),
            model: "m".into(),
        }
    }

    fn qualified_feature(name: &str) -> Feature {
        let mut f = Feature::new(name, "desc", Domain::Search);
        let mut research = ContentResearch::in_progress();
        research.status = ResearchStatus::Completed;
        research.extracted = Some(extracted());
        f.content_research = Some(research);
        f
    }

    struct NeverCallClient;

    #[async_trait::async_trait]
    impl LlmClient for NeverCallClient {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String> {
            panic!("provider must not be called when no feature qualifies");
        }

        fn model(&self) -> &str {
            "never"
        }
    }

    #[tokio::test]
    async fn test_no_qualifying_features_fails_without_provider_call() {
        let llm = LlmConfig::default();
        let stage = GenerationStage::new(&NeverCallClient, &llm);
        let unqualified = Feature::new("Bare", "no research", Domain::Search);

        let err = stage.generate(&[unqualified], &params()).await.unwrap_err();
        assert!(err.to_string().contains("No features"));
    }

    #[test]
    fn test_context_block_caps_lists() {
        let f = qualified_feature("Capped");
        let block = feature_context_block(&f, f.extraction().unwrap());
        // Four use cases supplied, three shown.
        assert!(block.contains("a; b; c"));
        assert!(!block.contains("; d"));
        assert!(block.contains("Demo scenario: demo it"));
    }

    #[test]
    fn test_system_prompt_has_skeleton_only_for_seven() {
        let seven = build_system_prompt(&params());
        assert!(seven.contains("7-slide narrative skeleton"));

        let mut five = params();
        five.slide_count = 5;
        assert!(!build_system_prompt(&five).contains("narrative skeleton"));
    }

    fn slide_json(theme: &str) -> String {
        format!(
            r#"{{"title": "T", "content": "body", "business_value": "v", "theme": "{}"}}"#,
            theme
        )
    }

    #[test]
    fn test_parse_deck_assigns_story_positions() {
        let slides: Vec<String> = (0..7).map(|_| slide_json("simplify")).collect();
        let reply = format!(
            r#"{{"title": "Deck", "slides": [{}], "story_arc": {{"opening_hook": "h", "central_theme": "c", "narrative_thread": "n", "resolution_message": "r", "call_to_action": "cta"}}}}"#,
            slides.join(",")
        );

        let deck = parse_deck_reply(&reply, &params(), vec!["f1".into()]).unwrap();
        assert_eq!(deck.slides.len(), 7);
        assert_eq!(deck.slides[0].story_position, Some(StoryPosition::OpeningHook));
        assert_eq!(deck.slides[1].story_position, Some(StoryPosition::Setup));
        assert_eq!(deck.slides[5].story_position, Some(StoryPosition::Climax));
        assert_eq!(deck.slides[6].story_position, Some(StoryPosition::CallToAction));
        assert!(deck.story_arc.is_some());
    }

    #[test]
    fn test_unknown_theme_defaults_to_ai() {
        let reply = format!(r#"{{"title": "Deck", "slides": [{}]}}"#, slide_json("growth"));
        let deck = parse_deck_reply(&reply, &params(), vec![]).unwrap();
        assert_eq!(deck.slides[0].theme, Theme::AiInnovation);
    }

    #[test]
    fn test_empty_slides_fails() {
        let reply = r#"{"title": "Deck", "slides": []}"#;
        assert!(parse_deck_reply(reply, &params(), vec![]).is_err());
    }

    #[test]
    fn test_fenced_reply_parses() {
        let reply = format!(
            "```json\n{{\"title\": \"Deck\", \"slides\": [{}]}}\n```",
            slide_json("optimize")
        );
        let deck = parse_deck_reply(&reply, &params(), vec![]).unwrap();
        assert_eq!(deck.slides[0].theme, Theme::Optimize);
    }

    #[test]
    fn test_blank_title_falls_back_to_domain_quarter() {
        let reply = format!(r#"{{"slides": [{}]}}"#, slide_json("simplify"));
        let deck = parse_deck_reply(&reply, &params(), vec![]).unwrap();
        assert_eq!(deck.title, "Search - Q3 2026");
    }
}
