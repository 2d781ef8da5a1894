//! Rule-based presentation builders
//!
//! Deterministic alternative to Stage-2 generation: a fixed slide skeleton
//! filled from feature data with no external calls. Never fails; sparse input
//! falls back to generic copy.

mod lab;
mod unified;

pub use lab::LabInstructionBuilder;
pub use unified::UnifiedPresentationBuilder;

use crate::models::{
    Domain, Feature, Presentation, SlideContent, StoryPosition, Theme,
};
use chrono::Utc;

/// Benefit strings containing any of these substrings feed the ROI slide.
const ROI_KEYWORDS: &[&str] = &["cost", "efficien", "overhead", "sav", "reduc", "roi", "productiv"];

/// Maximum features shown per deep-dive slide.
const MAX_FEATURES_PER_SLIDE: usize = 3;
/// Maximum benefits shown per feature on a deep-dive slide.
const MAX_BENEFITS_PER_FEATURE: usize = 3;
/// Maximum benefit lines on the ROI slide.
const MAX_ROI_LINES: usize = 5;

pub struct TemplatePresentationBuilder;

impl TemplatePresentationBuilder {
    /// Build the fixed 9-slide deck. Deterministic, no I/O.
    pub fn build(
        features: &[Feature],
        domain: Domain,
        quarter: &str,
        audience: &str,
    ) -> Presentation {
        let narrative_theme = dominant_theme(features);

        let mut slides = vec![
            opening_hook_slide(domain, audience, narrative_theme),
            innovation_overview_slide(features, domain, narrative_theme),
        ];

        for theme in Theme::ALL {
            slides.push(theme_deep_dive_slide(features, theme, domain));
        }

        slides.push(cross_platform_slide(domain, narrative_theme));
        slides.push(competitive_slide(narrative_theme));
        slides.push(roi_slide(features, narrative_theme));
        slides.push(call_to_action_slide(domain, quarter, narrative_theme));

        let total = slides.len();
        for (index, slide) in slides.iter_mut().enumerate() {
            slide.story_position = Some(StoryPosition::for_index(index, total));
        }

        let featured_themes = Presentation::derive_featured_themes(&slides);

        Presentation {
            title: format!("{} Innovations - {}", domain.title(), quarter),
            slides,
            domain,
            quarter: quarter.to_string(),
            feature_ids: features.iter().map(|f| f.id.clone()).collect(),
            featured_themes,
            story_arc: None,
            generated_at: Utc::now(),
        }
    }
}

/// Theme a feature is grouped under. Unthemed features fall to Simplify, the
/// same catch-all bias the classifier has.
pub(crate) fn effective_theme(feature: &Feature) -> Theme {
    feature.theme.unwrap_or(Theme::Simplify)
}

pub(crate) fn features_for_theme(features: &[Feature], theme: Theme) -> Vec<&Feature> {
    features
        .iter()
        .filter(|f| effective_theme(f) == theme)
        .collect()
}

/// Most common theme across the feature set, in Simplify/Optimize/AI order on
/// ties. Used for the narrative (non-deep-dive) slides.
fn dominant_theme(features: &[Feature]) -> Theme {
    let mut best = Theme::Simplify;
    let mut best_count = features_for_theme(features, best).len();
    for t in [Theme::Optimize, Theme::AiInnovation] {
        let count = features_for_theme(features, t).len();
        if count > best_count {
            best = t;
            best_count = count;
        }
    }
    best
}

fn slide(title: String, subtitle: Option<String>, body: String, value: String, theme: Theme) -> SlideContent {
    SlideContent {
        title,
        subtitle,
        body,
        business_value: value,
        theme,
        story_position: None,
        talk_track: None,
        customer_stories: Vec::new(),
        business_impact: None,
    }
}

fn opening_hook_slide(domain: Domain, audience: &str, theme: Theme) -> SlideContent {
    slide(
        "The Challenge".to_string(),
        Some(domain.title().to_string()),
        format!(
            "{}\n\nThis quarter's launches answer that head-on for {}.",
            domain.challenge_copy(),
            audience
        ),
        format!("Frame the launch around the pain {} teams feel today.", domain.title()),
        theme,
    )
}

fn innovation_overview_slide(features: &[Feature], domain: Domain, theme: Theme) -> SlideContent {
    let mut lines = Vec::new();
    for t in Theme::ALL {
        let names: Vec<&str> = features_for_theme(features, t)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        if names.is_empty() {
            lines.push(format!("**{}**: more to come this cycle", t.title()));
        } else {
            lines.push(format!("**{}**: {}", t.title(), names.join(", ")));
        }
    }

    slide(
        "What's New".to_string(),
        Some(format!("{} innovation at a glance", domain.title())),
        lines.join("\n\n"),
        "Every launch lands in one of three customer outcomes.".to_string(),
        theme,
    )
}

fn theme_deep_dive_slide(features: &[Feature], theme: Theme, domain: Domain) -> SlideContent {
    let themed = features_for_theme(features, theme);

    let body = if themed.is_empty() {
        format!(
            "The {} story for {} continues next cycle. Revisit the roadmap for \
             what's coming.",
            theme.title(),
            domain.title()
        )
    } else {
        themed
            .iter()
            .take(MAX_FEATURES_PER_SLIDE)
            .map(|f| {
                let benefits: Vec<String> = f
                    .benefits
                    .iter()
                    .take(MAX_BENEFITS_PER_FEATURE)
                    .map(|b| format!("  - {}", b))
                    .collect();
                if benefits.is_empty() {
                    format!("**{}**\n{}", f.name, f.description)
                } else {
                    format!("**{}**\n{}", f.name, benefits.join("\n"))
                }
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    slide(
        theme.title().to_string(),
        Some(theme.tagline().to_string()),
        body,
        format!("{}: {}", theme.title(), theme.tagline()),
        theme,
    )
}

fn cross_platform_slide(domain: Domain, theme: Theme) -> SlideContent {
    // One canned narrative per domain; the all-domains branch gets its own.
    let body = match domain {
        Domain::All => {
            "Search, Observability, and Security run on one engine and one \
             data layer. Adopt one solution and the others light up on the \
             same data, the same agents, and the same skills your team already \
             has."
        }
        Domain::Search => {
            "Everything built for Search carries over: the same index powers \
             log analytics and security detections, so relevance work pays off \
             across the whole platform."
        }
        Domain::Observability => {
            "Observability pipelines share storage and query semantics with \
             Search and Security, so telemetry you already collect feeds \
             detections and user-facing search without duplication."
        }
        Domain::Security => {
            "Security teams inherit the platform's search speed and \
             observability pipelines: one query language and one agent across \
             detection, hunting, and response."
        }
    };

    slide(
        "One Platform".to_string(),
        Some("Cross-platform benefits".to_string()),
        body.to_string(),
        "Platform leverage: one investment, three solutions.".to_string(),
        theme,
    )
}

fn competitive_slide(theme: Theme) -> SlideContent {
    slide(
        "Why We Win".to_string(),
        Some("Competitive differentiation".to_string()),
        "- Open platform, no data egress tax\n\
         - Single store for search, telemetry, and detections\n\
         - AI features grounded in your data, not a bolt-on chatbot\n\
         - Deploy anywhere: cloud, on-prem, air-gapped"
            .to_string(),
        "Differentiation customers can verify in a proof of value.".to_string(),
        theme,
    )
}

fn roi_slide(features: &[Feature], theme: Theme) -> SlideContent {
    let mut lines: Vec<String> = features
        .iter()
        .flat_map(|f| {
            f.benefits.iter().filter_map(move |b| {
                let lower = b.to_lowercase();
                ROI_KEYWORDS
                    .iter()
                    .any(|k| lower.contains(k))
                    .then(|| format!("- {} ({})", b, f.name))
            })
        })
        .collect();
    lines.truncate(MAX_ROI_LINES);

    let body = if lines.is_empty() {
        "Customers consistently report lower total cost of ownership after \
         consolidating onto the platform. Quantify against your current \
         tooling spend during the proof of value."
            .to_string()
    } else {
        lines.join("\n")
    };

    slide(
        "The Business Case".to_string(),
        Some("ROI highlights".to_string()),
        body,
        "Every launch above maps to a line item your CFO recognizes.".to_string(),
        theme,
    )
}

fn call_to_action_slide(domain: Domain, quarter: &str, theme: Theme) -> SlideContent {
    slide(
        "Next Steps".to_string(),
        Some(format!("{} {}", domain.title(), quarter)),
        format!(
            "1. Pick one {} use case and run a two-week proof of value\n\
             2. Upgrade to the current release to unlock the {} launches\n\
             3. Book a roadmap session with your account team",
            domain.title(),
            quarter
        ),
        "Turn interest into a scheduled proof of value.".to_string(),
        theme,
    )
}
