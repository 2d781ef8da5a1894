//! Cross-domain (unified) presentation builder
//!
//! Ten-slide variant of the template deck for launches spanning multiple
//! product areas: adds a synergy slide keyed by the set of represented
//! domains and a numeric ROI projection.

use crate::models::{Domain, Feature, Presentation, SlideContent, StoryPosition, Theme};
use chrono::Utc;
use std::collections::BTreeSet;

/// ROI multiplier cap applied regardless of how many domains are represented.
const ROI_MULTIPLIER_CAP: f64 = 2.5;

pub struct UnifiedPresentationBuilder;

impl UnifiedPresentationBuilder {
    /// Build the fixed 10-slide cross-domain deck. Deterministic, no I/O.
    pub fn build(features: &[Feature], quarter: &str, audience: &str) -> Presentation {
        let domains = represented_domains(features);

        let mut slides = vec![
            super::opening_hook_slide(Domain::All, audience, Theme::Simplify),
            super::innovation_overview_slide(features, Domain::All, Theme::Simplify),
        ];

        for theme in Theme::ALL {
            slides.push(super::theme_deep_dive_slide(features, theme, Domain::All));
        }

        slides.push(super::cross_platform_slide(Domain::All, Theme::Simplify));
        slides.push(synergy_slide(&domains));
        slides.push(super::competitive_slide(Theme::Simplify));
        slides.push(roi_projection_slide(&domains));
        slides.push(super::call_to_action_slide(Domain::All, quarter, Theme::Simplify));

        let total = slides.len();
        for (index, slide) in slides.iter_mut().enumerate() {
            slide.story_position = Some(StoryPosition::for_index(index, total));
        }

        let featured_themes = Presentation::derive_featured_themes(&slides);

        Presentation {
            title: format!("Platform Innovations - {}", quarter),
            slides,
            domain: Domain::All,
            quarter: quarter.to_string(),
            feature_ids: features.iter().map(|f| f.id.clone()).collect(),
            featured_themes,
            story_arc: None,
            generated_at: Utc::now(),
        }
    }
}

/// Sorted set of concrete domains represented in the feature list.
fn represented_domains(features: &[Feature]) -> Vec<Domain> {
    features
        .iter()
        .map(|f| f.domain)
        .filter(|d| *d != Domain::All)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Canned synergy narrative for a sorted domain combination. Unrecognized
/// combinations produce an empty block, not an error.
fn synergy_narrative(domains: &[Domain]) -> &'static str {
    use Domain::*;
    match domains {
        [Search, Observability] => {
            "The same relevance engine that powers user-facing search ranks \
             your telemetry: investigate incidents with full-text speed over \
             logs, traces, and metrics."
        }
        [Search, Security] => {
            "Detections are queries. The search platform's speed and relevance \
             tuning turn threat hunting from batch jobs into interactive \
             investigation."
        }
        [Observability, Security] => {
            "One pipeline feeds both SRE and SOC: the telemetry you collect \
             for uptime doubles as the evidence trail for detection and \
             response."
        }
        [Search, Observability, Security] => {
            "All three solutions share one store, one query language, and one \
             agent. Adopting the platform for any one of them makes the other \
             two incremental, not new projects."
        }
        _ => "",
    }
}

fn synergy_slide(domains: &[Domain]) -> SlideContent {
    let narrative = synergy_narrative(domains);
    let body = if narrative.is_empty() {
        String::new()
    } else {
        let names: Vec<&str> = domains.iter().map(|d| d.title()).collect();
        format!("{}\n\n{}", names.join(" + "), narrative)
    };

    SlideContent {
        title: "Better Together".to_string(),
        subtitle: Some("Cross-domain synergies".to_string()),
        body,
        business_value: "Each additional solution compounds the value of the last.".to_string(),
        theme: Theme::Simplify,
        story_position: None,
        talk_track: None,
        customer_stories: Vec::new(),
        business_impact: None,
    }
}

/// Projected annual value: sum of per-domain base figures times a capped
/// multiplier of `1 + 0.5 * domain_count`.
pub(crate) fn roi_projection_dollars(domains: &[Domain]) -> u64 {
    let base: u64 = domains.iter().map(|d| d.roi_base_dollars()).sum();
    let multiplier = (1.0 + 0.5 * domains.len() as f64).min(ROI_MULTIPLIER_CAP);
    (base as f64 * multiplier).round() as u64
}

fn roi_projection_slide(domains: &[Domain]) -> SlideContent {
    let projection = roi_projection_dollars(domains);
    let body = if domains.is_empty() {
        "Projection available once launches are assigned to domains. Use the \
         proof of value to baseline current spend."
            .to_string()
    } else {
        let names: Vec<&str> = domains.iter().map(|d| d.title()).collect();
        format!(
            "Projected annual value across {}: **${}**\n\n\
             Based on consolidation savings per domain with a platform \
             multiplier of min(2.5, 1 + 0.5 x domains adopted).",
            names.join(", "),
            format_thousands(projection)
        )
    };

    SlideContent {
        title: "Projected Value".to_string(),
        subtitle: Some("ROI projection".to_string()),
        body,
        business_value: "A concrete dollar anchor for the business case.".to_string(),
        theme: Theme::Optimize,
        story_position: None,
        talk_track: None,
        customer_stories: Vec::new(),
        business_impact: None,
    }
}

fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feature(name: &str, domain: Domain, theme: Theme) -> Feature {
        let mut f = Feature::new(name, "desc", domain);
        f.theme = Some(theme);
        f
    }

    #[test]
    fn test_always_ten_slides() {
        let deck = UnifiedPresentationBuilder::build(&[], "Q3 2026", "execs");
        assert_eq!(deck.slides.len(), 10);

        let features = vec![
            feature("A", Domain::Search, Theme::Simplify),
            feature("B", Domain::Security, Theme::Optimize),
        ];
        let deck = UnifiedPresentationBuilder::build(&features, "Q3 2026", "execs");
        assert_eq!(deck.slides.len(), 10);
        assert_eq!(deck.domain, Domain::All);
    }

    #[test]
    fn test_synergy_two_domain_key() {
        let features = vec![
            feature("A", Domain::Search, Theme::Simplify),
            feature("B", Domain::Observability, Theme::Optimize),
        ];
        let deck = UnifiedPresentationBuilder::build(&features, "Q3 2026", "execs");
        let synergy = &deck.slides[6];
        assert!(synergy.body.contains("Search + Observability"));
        assert!(synergy.body.contains("relevance engine"));
    }

    #[test]
    fn test_synergy_three_domain_key() {
        let domains = vec![Domain::Search, Domain::Observability, Domain::Security];
        assert!(synergy_narrative(&domains).contains("one store"));
    }

    #[test]
    fn test_unknown_domain_combination_yields_empty_block() {
        // A single domain is not a predefined synergy combination.
        let features = vec![feature("A", Domain::Search, Theme::Simplify)];
        let deck = UnifiedPresentationBuilder::build(&features, "Q3 2026", "execs");
        assert!(deck.slides[6].body.is_empty());
    }

    #[test]
    fn test_roi_projection_capped_multiplier() {
        // Two domains: (250k + 300k) * 2.0
        let two = roi_projection_dollars(&[Domain::Search, Domain::Observability]);
        assert_eq!(two, 1_100_000);

        // Three domains: multiplier 2.5 exactly at the cap
        let three =
            roi_projection_dollars(&[Domain::Search, Domain::Observability, Domain::Security]);
        assert_eq!(three, 2_375_000);
    }

    #[test]
    fn test_represented_domains_sorted_and_deduped() {
        let features = vec![
            feature("A", Domain::Security, Theme::Simplify),
            feature("B", Domain::Search, Theme::Simplify),
            feature("C", Domain::Search, Theme::Optimize),
        ];
        assert_eq!(
            represented_domains(&features),
            vec![Domain::Search, Domain::Security]
        );
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(1_100_000), "1,100,000");
        assert_eq!(format_thousands(950), "950");
    }
}
