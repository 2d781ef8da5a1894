//! Domain model: features, themes, research records, slides, presentations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Narrative theme a feature is presented under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Simplify,
    Optimize,
    AiInnovation,
}

impl Theme {
    pub const ALL: [Theme; 3] = [Theme::Simplify, Theme::Optimize, Theme::AiInnovation];

    pub fn title(&self) -> &'static str {
        match self {
            Theme::Simplify => "Simplify",
            Theme::Optimize => "Optimize",
            Theme::AiInnovation => "AI Innovation",
        }
    }

    pub fn tagline(&self) -> &'static str {
        match self {
            Theme::Simplify => "Do more with less effort",
            Theme::Optimize => "Faster, leaner, more cost-effective",
            Theme::AiInnovation => "Put AI to work on your data",
        }
    }

    /// Parse a theme string from an LLM reply. Tolerates display titles,
    /// snake_case tags, and a few spellings providers actually emit.
    pub fn parse_loose(value: &str) -> Option<Theme> {
        match value.trim().to_lowercase().replace([' ', '-'], "_").as_str() {
            "simplify" => Some(Theme::Simplify),
            "optimize" | "optimise" => Some(Theme::Optimize),
            "ai_innovation" | "aiinnovation" | "ai" => Some(Theme::AiInnovation),
            _ => None,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Product area a feature belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Search,
    Observability,
    Security,
    All,
}

impl Domain {
    pub fn title(&self) -> &'static str {
        match self {
            Domain::Search => "Search",
            Domain::Observability => "Observability",
            Domain::Security => "Security",
            Domain::All => "All Domains",
        }
    }

    pub fn tagline(&self) -> &'static str {
        match self {
            Domain::Search => "Relevance at any scale",
            Domain::Observability => "See every signal, act on what matters",
            Domain::Security => "Detect, investigate, respond",
            Domain::All => "One platform, every workload",
        }
    }

    /// Opening-hook challenge copy used by the template builder.
    pub fn challenge_copy(&self) -> &'static str {
        match self {
            Domain::Search => {
                "Teams struggle to deliver fast, relevant search experiences while \
                 data volumes and user expectations keep climbing."
            }
            Domain::Observability => {
                "Operations teams drown in telemetry from sprawling systems while \
                 incidents still take hours to diagnose."
            }
            Domain::Security => {
                "Security teams face more alerts than analysts, and attackers only \
                 need to be right once."
            }
            Domain::All => {
                "Organizations run separate tools for search, observability, and \
                 security, multiplying cost and fragmenting insight."
            }
        }
    }

    /// Keywords used to judge whether a related page is on-topic for this domain.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Domain::Search => &["search", "query", "index", "relevance", "ranking"],
            Domain::Observability => &["observability", "metrics", "logs", "traces", "apm", "alerting"],
            Domain::Security => &["security", "siem", "threat", "detection", "endpoint", "soc"],
            Domain::All => &["platform", "search", "observability", "security"],
        }
    }

    /// Base annual savings figure used by the unified ROI projection.
    pub fn roi_base_dollars(&self) -> u64 {
        match self {
            Domain::Search => 250_000,
            Domain::Observability => 300_000,
            Domain::Security => 400_000,
            Domain::All => 500_000,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// A product feature to research and present.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub documentation_urls: Vec<String>,
    #[serde(default)]
    pub theme: Option<Theme>,
    pub domain: Domain,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub content_research: Option<ContentResearch>,
}

impl Feature {
    pub fn new(name: &str, description: &str, domain: Domain) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: description.to_string(),
            benefits: Vec::new(),
            documentation_urls: Vec::new(),
            theme: None,
            domain,
            created_at: now,
            updated_at: now,
            content_research: None,
        }
    }

    /// Stage-1 record, if research completed with a successful extraction.
    pub fn extraction(&self) -> Option<&ExtractedContent> {
        self.content_research
            .as_ref()
            .filter(|r| r.status == ResearchStatus::Completed)
            .and_then(|r| r.extracted.as_ref())
    }
}

/// Research lifecycle. Transitions only move forward; a record is never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Whether a scraped page was declared on the feature or discovered from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRelation {
    Primary,
    Related,
}

/// One scraped documentation page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceContent {
    pub url: String,
    pub title: Option<String>,
    pub text: String,
    #[serde(default)]
    pub headings: Vec<String>,
    #[serde(default)]
    pub code_block_count: usize,
    #[serde(default)]
    pub image_count: usize,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub last_modified: Option<String>,
    pub relation: SourceRelation,
    pub fetched_at: DateTime<Utc>,
}

/// Sparse embeddings for the three derived research views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResearchEmbeddings {
    #[serde(default)]
    pub feature_summary: Vec<f32>,
    #[serde(default)]
    pub technical_content: Vec<f32>,
    #[serde(default)]
    pub full_documentation: Vec<f32>,
}

/// Research record owned by a single feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentResearch {
    pub status: ResearchStatus,
    #[serde(default)]
    pub sources: Vec<SourceContent>,
    #[serde(default)]
    pub extracted: Option<ExtractedContent>,
    #[serde(default)]
    pub embeddings: Option<ResearchEmbeddings>,
    /// Per-source failure notes; a failed URL never aborts the whole record.
    #[serde(default)]
    pub errors: Vec<String>,
    pub researched_at: DateTime<Utc>,
}

impl ContentResearch {
    pub fn in_progress() -> Self {
        Self {
            status: ResearchStatus::InProgress,
            sources: Vec::new(),
            extracted: None,
            embeddings: None,
            errors: Vec::new(),
            researched_at: Utc::now(),
        }
    }

    /// Concatenated scraped text across all sources.
    pub fn combined_text(&self) -> String {
        self.sources
            .iter()
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Stage-1 extraction output. The five required fields must be non-empty after
/// parsing or the extraction is failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractedContent {
    pub summary: String,
    pub use_cases: Vec<String>,
    pub key_capabilities: Vec<String>,
    pub benefits: Vec<String>,
    pub technical_requirements: Vec<String>,
    #[serde(default)]
    pub configuration_examples: Vec<String>,
    #[serde(default)]
    pub metrics_examples: Vec<String>,
    #[serde(default)]
    pub api_commands: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
    #[serde(default)]
    pub comparisons: Vec<String>,
    #[serde(default)]
    pub demo_scenario: Option<String>,
    #[serde(default)]
    pub business_impact: Vec<String>,
    #[serde(default)]
    pub competitive_advantages: Vec<String>,
    #[serde(default)]
    pub visual_suggestions: Vec<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    #[serde(default)]
    pub complexity_level: Option<String>,
    pub extracted_at: DateTime<Utc>,
    pub model: String,
}

/// Narrative role a slide plays, assigned by ordinal position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoryPosition {
    OpeningHook,
    Setup,
    RisingAction,
    Climax,
    CallToAction,
}

impl StoryPosition {
    /// Map a slide index to its narrative role. Precedence: first slide, last
    /// slide, second-to-last, second slide, everything else.
    pub fn for_index(index: usize, total: usize) -> StoryPosition {
        if index == 0 {
            StoryPosition::OpeningHook
        } else if index + 1 == total {
            StoryPosition::CallToAction
        } else if index + 2 == total {
            StoryPosition::Climax
        } else if index == 1 {
            StoryPosition::Setup
        } else {
            StoryPosition::RisingAction
        }
    }
}

/// One slide of a presentation. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlideContent {
    pub title: String,
    #[serde(default)]
    pub subtitle: Option<String>,
    /// Markdown body.
    pub body: String,
    pub business_value: String,
    pub theme: Theme,
    #[serde(default)]
    pub story_position: Option<StoryPosition>,
    #[serde(default)]
    pub talk_track: Option<String>,
    #[serde(default)]
    pub customer_stories: Vec<String>,
    #[serde(default)]
    pub business_impact: Option<String>,
}

/// Story arc produced alongside a generated deck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryArc {
    pub opening_hook: String,
    pub central_theme: String,
    pub narrative_thread: String,
    #[serde(default)]
    pub climax_feature: Option<String>,
    pub resolution_message: String,
    pub call_to_action: String,
}

/// A finished deck. Invariant: at least one slide.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Presentation {
    pub title: String,
    pub slides: Vec<SlideContent>,
    pub domain: Domain,
    pub quarter: String,
    pub feature_ids: Vec<String>,
    pub featured_themes: Vec<Theme>,
    #[serde(default)]
    pub story_arc: Option<StoryArc>,
    pub generated_at: DateTime<Utc>,
}

impl Presentation {
    /// Distinct themes across slides, in fixed Simplify/Optimize/AI order.
    pub fn derive_featured_themes(slides: &[SlideContent]) -> Vec<Theme> {
        Theme::ALL
            .into_iter()
            .filter(|t| slides.iter().any(|s| s.theme == *t))
            .collect()
    }
}

/// Classifier output. Always freshly computed, never persisted and mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub feature_id: String,
    pub theme: Theme,
    pub confidence: f32,
    pub reasoning: String,
    pub model: String,
}

/// A hands-on lab guide for one feature.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabGuide {
    pub title: String,
    pub feature_id: String,
    pub objectives: Vec<String>,
    pub setup_steps: Vec<String>,
    pub exercises: Vec<LabExercise>,
    pub validation: Vec<String>,
    pub cleanup: Vec<String>,
    pub estimated_minutes: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabExercise {
    pub title: String,
    pub steps: Vec<String>,
}
