//! Keyword-scoring theme classifier
//!
//! Scores feature text against the three fixed keyword tables and picks a
//! dominant theme. The decision order is a business rule, not a tie-break
//! accident: AI-Innovation takes precedence whenever it scores at all and is
//! not beaten outright, and Simplify is the catch-all.

use crate::config::ThemeKeywords;
use crate::error::Result;
use crate::models::{ClassificationResult, Feature, Theme};
use regex::Regex;

const CLASSIFIER_MODEL: &str = "keyword-scorer-v1";

/// Confidence reported when no keyword matches at all.
const ZERO_MATCH_CONFIDENCE: f32 = 0.5;

#[derive(Debug)]
struct ThemeScore {
    score: u32,
    matched: Vec<String>,
}

pub struct ThemeClassifier {
    keywords: ThemeKeywords,
}

impl ThemeClassifier {
    pub fn new(keywords: ThemeKeywords) -> Self {
        Self { keywords }
    }

    /// Classify a feature into a theme.
    pub fn classify(&self, feature: &Feature) -> Theme {
        self.classify_with_confidence(feature).theme
    }

    /// Classify with confidence and reasoning. Pure function of the feature
    /// text and the injected keyword tables.
    pub fn classify_with_confidence(&self, feature: &Feature) -> ClassificationResult {
        let text = feature_text(feature);

        let ai = score_keywords(&text, &self.keywords.ai);
        let simplify = score_keywords(&text, &self.keywords.simplify);
        let optimize = score_keywords(&text, &self.keywords.optimize);

        // Decision order matters: AI gate first, then Optimize strictly above
        // Simplify, else the Simplify fallback (including the all-zero case).
        let (theme, dominant) = if ai.score > 0 && ai.score >= optimize.score && ai.score >= simplify.score
        {
            (Theme::AiInnovation, &ai)
        } else if optimize.score > simplify.score {
            (Theme::Optimize, &optimize)
        } else {
            (Theme::Simplify, &simplify)
        };

        let total = ai.score + simplify.score + optimize.score;
        let confidence = if total == 0 {
            ZERO_MATCH_CONFIDENCE
        } else {
            (dominant.score as f32 / total.max(1) as f32).min(1.0)
        };

        let reasoning = if dominant.matched.is_empty() {
            "No theme keywords matched; defaulting to Simplify.".to_string()
        } else {
            let shown: Vec<&str> = dominant
                .matched
                .iter()
                .take(3)
                .map(|s| s.as_str())
                .collect();
            format!(
                "Matched {} keyword(s) for {}: {}",
                dominant.matched.len(),
                theme.title(),
                shown.join(", ")
            )
        };

        ClassificationResult {
            feature_id: feature.id.clone(),
            theme,
            confidence,
            reasoning,
            model: CLASSIFIER_MODEL.to_string(),
        }
    }

    /// Classify a batch, assigning the theme back onto each feature.
    /// Best-effort: always succeeds, one result per feature.
    pub fn classify_batch(&self, features: &mut [Feature]) -> Result<Vec<ClassificationResult>> {
        let mut results = Vec::with_capacity(features.len());
        for feature in features.iter_mut() {
            let result = self.classify_with_confidence(feature);
            feature.theme = Some(result.theme);
            feature.updated_at = chrono::Utc::now();
            results.push(result);
        }
        Ok(results)
    }
}

/// Lowercase concatenation of name, description, benefits, and any scraped
/// research text.
fn feature_text(feature: &Feature) -> String {
    let mut parts: Vec<String> = vec![feature.name.clone(), feature.description.clone()];
    parts.extend(feature.benefits.iter().cloned());
    if let Some(research) = &feature.content_research {
        parts.push(research.combined_text());
    }
    parts.join(" ").to_lowercase()
}

/// Substring count plus one bonus point per keyword that also matches as a
/// whole word.
fn score_keywords(text: &str, keywords: &[String]) -> ThemeScore {
    let mut score = 0;
    let mut matched = Vec::new();

    for keyword in keywords {
        let keyword = keyword.to_lowercase();
        if text.contains(&keyword) {
            score += 1;
            if let Ok(re) = Regex::new(&format!(r"\b{}\b", regex::escape(&keyword))) {
                if re.is_match(text) {
                    score += 1;
                }
            }
            matched.push(keyword);
        }
    }

    ThemeScore { score, matched }
}
