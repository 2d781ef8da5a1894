//! Related-page discovery
//!
//! Scores links found inside primary documentation pages by a relevance
//! heuristic and keeps the best few for a second round of fetching.

use super::fetch::PageLink;
use crate::config::ResearchConfig;
use crate::models::Feature;
use std::collections::HashSet;
use url::Url;

/// Path segments that suggest documentation rather than marketing chrome.
const DOC_PATH_HINTS: &[&str] = &["/docs/", "/guide/", "/reference/", "/blog/", "/tutorial/"];

const ALLOWED_HOST_WEIGHT: f32 = 0.4;
const PATH_HINT_WEIGHT: f32 = 0.2;
const NAME_OVERLAP_WEIGHT: f32 = 0.3;
const DOMAIN_KEYWORD_WEIGHT: f32 = 0.1;

/// A related-page candidate with its relevance score.
#[derive(Debug, Clone)]
pub struct RelatedCandidate {
    pub url: String,
    pub score: f32,
}

/// Score one link for relevance to the feature.
pub fn relevance_score(link: &PageLink, feature: &Feature, config: &ResearchConfig) -> f32 {
    let Ok(url) = Url::parse(&link.url) else {
        return 0.0;
    };
    let host = url.host_str().unwrap_or_default();
    let haystack = format!("{} {}", url.path().to_lowercase(), link.text.to_lowercase());

    let mut score = 0.0;

    if config
        .allowed_domains
        .iter()
        .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    {
        score += ALLOWED_HOST_WEIGHT;
    }

    if DOC_PATH_HINTS.iter().any(|hint| url.path().contains(hint)) {
        score += PATH_HINT_WEIGHT;
    }

    let name_terms: Vec<String> = feature
        .name
        .to_lowercase()
        .split_whitespace()
        .filter(|t| t.len() > 2)
        .map(|t| t.to_string())
        .collect();
    if !name_terms.is_empty() {
        let matched = name_terms.iter().filter(|t| haystack.contains(t.as_str())).count();
        score += NAME_OVERLAP_WEIGHT * matched as f32 / name_terms.len() as f32;
    }

    if feature
        .domain
        .keywords()
        .iter()
        .any(|k| haystack.contains(k))
    {
        score += DOMAIN_KEYWORD_WEIGHT;
    }

    score
}

/// Select related candidates: dedupe, drop already-fetched URLs, keep scores
/// at or above the configured threshold, hard-cap at half of max_sources.
pub fn select_related(
    links: &[PageLink],
    fetched_urls: &[String],
    feature: &Feature,
    config: &ResearchConfig,
) -> Vec<RelatedCandidate> {
    let fetched: HashSet<&str> = fetched_urls.iter().map(|s| s.as_str()).collect();
    let mut seen = HashSet::new();

    let mut candidates: Vec<RelatedCandidate> = links
        .iter()
        .filter(|l| !fetched.contains(l.url.as_str()))
        .filter(|l| seen.insert(l.url.clone()))
        .map(|l| RelatedCandidate {
            url: l.url.clone(),
            score: relevance_score(l, feature, config),
        })
        .filter(|c| c.score >= config.related_min_score)
        .collect();

    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    candidates.truncate(config.max_sources / 2);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Domain;

    fn config() -> ResearchConfig {
        let mut config = ResearchConfig::default();
        config.allowed_domains = vec!["example.com".to_string()];
        config
    }

    fn feature() -> Feature {
        Feature::new("Vector Search", "semantic retrieval", Domain::Search)
    }

    fn link(url: &str, text: &str) -> PageLink {
        PageLink {
            url: url.to_string(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_docs_link_on_allowed_host_scores_high() {
        let l = link(
            "https://docs.example.com/docs/vector-search",
            "Vector search guide",
        );
        let score = relevance_score(&l, &feature(), &config());
        // allowed host + path hint + full name overlap + domain keyword
        assert!(score > 0.9);
    }

    #[test]
    fn test_off_list_marketing_link_scores_low() {
        let l = link("https://other.io/pricing", "Pricing");
        let score = relevance_score(&l, &feature(), &config());
        assert!(score < 0.3);
    }

    #[test]
    fn test_select_related_threshold_and_cap() {
        let mut config = config();
        config.max_sources = 4; // cap = 2

        let links = vec![
            link("https://docs.example.com/docs/vector-search", "Vector search"),
            link("https://docs.example.com/docs/vector-tuning", "Tuning vector search"),
            link("https://docs.example.com/docs/search-basics", "Search basics"),
            link("https://other.io/pricing", "Pricing"),
        ];
        let selected = select_related(&links, &[], &feature(), &config);

        assert_eq!(selected.len(), 2);
        assert!(selected.iter().all(|c| c.score >= 0.3));
        // Sorted best-first
        assert!(selected[0].score >= selected[1].score);
    }

    #[test]
    fn test_already_fetched_urls_excluded() {
        let links = vec![link(
            "https://docs.example.com/docs/vector-search",
            "Vector search",
        )];
        let fetched = vec!["https://docs.example.com/docs/vector-search".to_string()];
        assert!(select_related(&links, &fetched, &feature(), &config()).is_empty());
    }

    #[test]
    fn test_duplicate_links_deduped() {
        let links = vec![
            link("https://docs.example.com/docs/vector-search", "Vector search"),
            link("https://docs.example.com/docs/vector-search", "Same page again"),
        ];
        let selected = select_related(&links, &[], &feature(), &config());
        assert_eq!(selected.len(), 1);
    }
}
