//! Hands-on lab instruction builder
//!
//! Deterministic template fill producing a lab guide per feature. Works from
//! the Stage-1 extraction when one exists and falls back to generic copy when
//! it does not. Never fails.

use crate::models::{Domain, Feature, LabExercise, LabGuide};

/// Maximum exercises generated from key capabilities.
const MAX_EXERCISES: usize = 4;
/// Minutes budgeted per exercise, on top of a fixed setup allowance.
const MINUTES_PER_EXERCISE: u32 = 10;
const SETUP_MINUTES: u32 = 15;

pub struct LabInstructionBuilder;

impl LabInstructionBuilder {
    pub fn build(feature: &Feature) -> LabGuide {
        let extraction = feature.extraction();

        let objectives = match extraction {
            Some(e) if !e.use_cases.is_empty() => e
                .use_cases
                .iter()
                .take(3)
                .map(|u| format!("Understand how {} supports: {}", feature.name, u))
                .collect(),
            _ => {
                let mut objectives: Vec<String> = feature
                    .benefits
                    .iter()
                    .take(3)
                    .map(|b| format!("See first-hand how {} delivers: {}", feature.name, b))
                    .collect();
                if objectives.is_empty() {
                    objectives.push(format!("Get hands-on with {}", feature.name));
                }
                objectives
            }
        };

        let exercises = match extraction {
            Some(e) if !e.key_capabilities.is_empty() => e
                .key_capabilities
                .iter()
                .take(MAX_EXERCISES)
                .enumerate()
                .map(|(i, capability)| LabExercise {
                    title: format!("Exercise {}: {}", i + 1, capability),
                    steps: exercise_steps(&feature.name, capability, e.api_commands.first()),
                })
                .collect(),
            _ => vec![LabExercise {
                title: format!("Exercise 1: Explore {}", feature.name),
                steps: vec![
                    format!("Open the {} documentation and skim the overview.", feature.name),
                    format!("Enable {} in your lab environment.", feature.name),
                    "Note what changed in the UI or API responses.".to_string(),
                ],
            }],
        };

        let estimated_minutes = SETUP_MINUTES + exercises.len() as u32 * MINUTES_PER_EXERCISE;

        LabGuide {
            title: format!("Hands-on with {}", feature.name),
            feature_id: feature.id.clone(),
            objectives,
            setup_steps: setup_steps(feature.domain),
            exercises,
            validation: validation_steps(feature, extraction.map(|e| e.metrics_examples.as_slice())),
            cleanup: vec![
                "Delete the lab deployment or stop the local containers.".to_string(),
                "Remove any API keys created for this lab.".to_string(),
            ],
            estimated_minutes,
        }
    }
}

fn setup_steps(domain: Domain) -> Vec<String> {
    let mut steps = vec![
        "Provision a trial deployment or start a local cluster.".to_string(),
        "Create an API key with admin privileges for the lab.".to_string(),
    ];
    steps.push(match domain {
        Domain::Search => "Load the sample e-commerce dataset.".to_string(),
        Domain::Observability => "Install the agent on a sample host and confirm telemetry arrives.".to_string(),
        Domain::Security => "Enable the detection rules bundle and ingest the sample alert data.".to_string(),
        Domain::All => "Load the sample dataset for the solution you know least.".to_string(),
    });
    steps
}

fn exercise_steps(feature_name: &str, capability: &str, api_command: Option<&String>) -> Vec<String> {
    let mut steps = vec![
        format!("Locate {} in the UI or API reference.", capability),
        format!("Configure {} for the sample dataset.", feature_name),
    ];
    if let Some(command) = api_command {
        steps.push(format!("Run: `{}`", command));
    }
    steps.push("Compare behavior before and after enabling the capability.".to_string());
    steps
}

fn validation_steps(feature: &Feature, metrics: Option<&[String]>) -> Vec<String> {
    let mut steps = vec![format!(
        "Confirm {} is active and returning expected results.",
        feature.name
    )];
    if let Some(metrics) = metrics {
        steps.extend(
            metrics
                .iter()
                .take(2)
                .map(|m| format!("Check whether your lab reproduces: {}", m)),
        );
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentResearch, ExtractedContent, ResearchStatus};
    use chrono::Utc;

    fn bare_feature() -> Feature {
        let mut f = Feature::new("BBQ", "Better quantization", Domain::Search);
        f.benefits = vec!["Reduces memory usage by 95%".to_string()];
        f
    }

    fn extracted_feature() -> Feature {
        let mut f = bare_feature();
        let mut research = ContentResearch::in_progress();
        research.status = ResearchStatus::Completed;
        research.extracted = Some(ExtractedContent {
            summary: "s".into(),
            use_cases: vec!["vector search at scale".into()],
            key_capabilities: vec![
                "c1".into(),
                "c2".into(),
                "c3".into(),
                "c4".into(),
                "c5".into(),
            ],
            benefits: vec!["b".into()],
            technical_requirements: vec!["t".into()],
            configuration_examples: vec![],
            metrics_examples: vec!["95% memory reduction".into()],
            api_commands: vec!["PUT /index/_settings".into()],
            limitations: vec![],
            comparisons: vec![],
            demo_scenario: None,
            business_impact: vec![],
            competitive_advantages: vec![],
            visual_suggestions: vec![],
            target_audience: None,
            complexity_level: None,
            extracted_at: Utc::now(),
            model: "m".into(),
        });
        f.content_research = Some(research);
        f
    }

    #[test]
    fn test_lab_from_extraction_caps_exercises() {
        let guide = LabInstructionBuilder::build(&extracted_feature());
        assert_eq!(guide.exercises.len(), MAX_EXERCISES);
        assert_eq!(guide.estimated_minutes, 15 + 4 * 10);
        assert!(guide.exercises[0].steps.iter().any(|s| s.contains("PUT /index/_settings")));
        assert!(guide.validation.iter().any(|s| s.contains("95% memory reduction")));
    }

    #[test]
    fn test_lab_without_extraction_is_generic() {
        let guide = LabInstructionBuilder::build(&bare_feature());
        assert_eq!(guide.exercises.len(), 1);
        assert!(guide.objectives[0].contains("Reduces memory usage"));
        assert!(!guide.setup_steps.is_empty());
        assert!(!guide.cleanup.is_empty());
    }

    #[test]
    fn test_setup_steps_vary_by_domain() {
        let search = setup_steps(Domain::Search);
        let security = setup_steps(Domain::Security);
        assert_ne!(search.last(), security.last());
    }
}
