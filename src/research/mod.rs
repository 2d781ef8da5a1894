//! Content research pipeline
//!
//! Fetches a feature's documentation pages, discovers related pages, and
//! optionally runs Stage-1 extraction and embedding generation. The pipeline
//! never propagates an error: failures are recorded on the research record
//! and the status is set accordingly.

mod fetch;
mod rate_limit;
mod related;

pub use fetch::{extract_page, FetchedPage, Fetcher, PageLink};
pub use rate_limit::{GlobalRateLimiter, HostRateLimiter, HostRateLimiterMap};
pub use related::{relevance_score, select_related, RelatedCandidate};

use crate::config::{LlmConfig, ResearchConfig};
use crate::embed::EmbeddingClient;
use crate::error::Result;
use crate::extract::ExtractionStage;
use crate::llm::LlmClient;
use crate::models::{
    ContentResearch, Feature, ResearchEmbeddings, ResearchStatus, SourceRelation,
};
use tracing::{debug, info, warn};
use url::Url;

/// Outcome of one optional pipeline step. Callers branch on this instead of
/// catching exceptions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Done,
    Skipped(String),
    Failed(String),
}

/// Per-run report of which optional steps ran.
#[derive(Debug, Clone)]
pub struct ResearchReport {
    pub extraction: StepOutcome,
    pub embeddings: StepOutcome,
}

pub struct ContentResearchPipeline<'a> {
    fetcher: Fetcher,
    host_limits: HostRateLimiterMap,
    global_limit: GlobalRateLimiter,
    llm: Option<(&'a dyn LlmClient, &'a LlmConfig)>,
    embedder: Option<&'a EmbeddingClient>,
}

impl<'a> ContentResearchPipeline<'a> {
    pub fn new(
        research: ResearchConfig,
        llm: Option<(&'a dyn LlmClient, &'a LlmConfig)>,
        embedder: Option<&'a EmbeddingClient>,
    ) -> Result<Self> {
        let host_limits = HostRateLimiterMap::new(research.rate_limit_per_host);
        let global_limit = GlobalRateLimiter::new(research.global_rate_limit);
        let fetcher = Fetcher::new(research)?;

        Ok(Self {
            fetcher,
            host_limits,
            global_limit,
            llm,
            embedder,
        })
    }

    /// Research one feature. Idempotent per call: any previous research record
    /// on the feature is overwritten. Never returns an error.
    pub async fn research(&self, feature: &mut Feature) -> ResearchReport {
        let mut record = ContentResearch::in_progress();
        let mut links: Vec<PageLink> = Vec::new();

        // Primary pages, declared on the feature.
        for url in feature.documentation_urls.clone() {
            match self.fetch_limited(&url, SourceRelation::Primary).await {
                Ok(page) => {
                    links.extend(page.links);
                    record.sources.push(page.source);
                }
                Err(e) => {
                    warn!("Failed to fetch {}: {}", url, e);
                    record.errors.push(format!("{}: {}", url, e));
                }
            }
        }

        // Related pages discovered inside the primary content.
        let fetched: Vec<String> = record.sources.iter().map(|s| s.url.clone()).collect();
        for candidate in select_related(&links, &fetched, feature, self.fetcher.config()) {
            debug!("Related candidate {} (score {:.2})", candidate.url, candidate.score);
            match self
                .fetch_limited(&candidate.url, SourceRelation::Related)
                .await
            {
                Ok(page) => record.sources.push(page.source),
                Err(e) => {
                    warn!("Failed to fetch related {}: {}", candidate.url, e);
                    record.errors.push(format!("{}: {}", candidate.url, e));
                }
            }
        }

        if record.sources.is_empty() {
            record.status = ResearchStatus::Failed;
            let report = ResearchReport {
                extraction: StepOutcome::Skipped("no sources fetched".to_string()),
                embeddings: StepOutcome::Skipped("no sources fetched".to_string()),
            };
            self.finish(feature, record);
            return report;
        }

        let extraction = self.run_extraction(feature, &mut record).await;
        let embeddings = self.run_embeddings(feature, &mut record).await;

        record.status = if matches!(extraction, StepOutcome::Failed(_)) {
            ResearchStatus::Failed
        } else {
            ResearchStatus::Completed
        };

        info!(
            "Research for '{}': {} source(s), extraction {:?}",
            feature.name,
            record.sources.len(),
            extraction
        );

        self.finish(feature, record);
        ResearchReport {
            extraction,
            embeddings,
        }
    }

    async fn fetch_limited(&self, url: &str, relation: SourceRelation) -> Result<FetchedPage> {
        let parsed = Url::parse(url)?;
        let host = parsed.host_str().unwrap_or_default().to_string();

        self.global_limit.wait().await;
        self.host_limits.wait(&host).await;

        self.fetcher.fetch(url, relation).await
    }

    /// Stage-1 extraction over the combined primary text. Skipped when no LLM
    /// client is configured; a failure marks the whole record failed.
    async fn run_extraction(
        &self,
        feature: &Feature,
        record: &mut ContentResearch,
    ) -> StepOutcome {
        let Some((client, llm_config)) = self.llm else {
            return StepOutcome::Skipped("no LLM client configured".to_string());
        };

        let primary_text: String = record
            .sources
            .iter()
            .filter(|s| s.relation == SourceRelation::Primary)
            .map(|s| s.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let source_url = record
            .sources
            .first()
            .map(|s| s.url.clone())
            .unwrap_or_default();

        let stage = ExtractionStage::new(client, llm_config);
        match stage.extract(&feature.name, &primary_text, &source_url).await {
            Ok(extracted) => {
                record.extracted = Some(extracted);
                StepOutcome::Done
            }
            Err(e) => {
                record.errors.push(format!("extraction: {}", e));
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    /// Sparse embeddings for the three derived views. Per-view failures leave
    /// that view empty; the step never fails the record.
    async fn run_embeddings(
        &self,
        feature: &Feature,
        record: &mut ContentResearch,
    ) -> StepOutcome {
        let Some(embedder) = self.embedder else {
            return StepOutcome::Skipped("no embedding backend configured".to_string());
        };

        let views = [
            ("feature_summary", feature_summary_view(feature, record)),
            ("technical_content", technical_view(record)),
            ("full_documentation", record.combined_text()),
        ];

        let mut embeddings = ResearchEmbeddings::default();
        let mut failures = 0;
        for (name, text) in views {
            if text.trim().is_empty() {
                continue;
            }
            match embedder.embed_text(vec![text]).await {
                Ok(mut vectors) if !vectors.is_empty() => {
                    let vector = vectors.remove(0);
                    match name {
                        "feature_summary" => embeddings.feature_summary = vector,
                        "technical_content" => embeddings.technical_content = vector,
                        _ => embeddings.full_documentation = vector,
                    }
                }
                Ok(_) => failures += 1,
                Err(e) => {
                    warn!("Embedding view '{}' failed: {}", name, e);
                    failures += 1;
                }
            }
        }

        record.embeddings = Some(embeddings);
        if failures > 0 {
            StepOutcome::Failed(format!("{} view(s) failed", failures))
        } else {
            StepOutcome::Done
        }
    }

    fn finish(&self, feature: &mut Feature, record: ContentResearch) {
        feature.content_research = Some(record);
        feature.updated_at = chrono::Utc::now();
    }
}

fn feature_summary_view(feature: &Feature, record: &ContentResearch) -> String {
    let mut parts = vec![feature.name.clone(), feature.description.clone()];
    parts.extend(feature.benefits.iter().cloned());
    if let Some(extracted) = &record.extracted {
        parts.push(extracted.summary.clone());
    }
    parts.join(" ")
}

fn technical_view(record: &ContentResearch) -> String {
    if let Some(extracted) = &record.extracted {
        let mut parts = extracted.key_capabilities.clone();
        parts.extend(extracted.technical_requirements.iter().cloned());
        parts.extend(extracted.api_commands.iter().cloned());
        parts.join(" ")
    } else {
        // Fall back to headings from code-bearing pages.
        record
            .sources
            .iter()
            .filter(|s| s.code_block_count > 0)
            .flat_map(|s| s.headings.iter().cloned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Domain;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(server: &MockServer) -> ResearchConfig {
        let mut config = ResearchConfig::default();
        let host = Url::parse(&server.uri()).unwrap().host_str().unwrap().to_string();
        config.allowed_domains = vec![host];
        config.rate_limit_per_host = 1000.0;
        config.global_rate_limit = 1000;
        config
    }

    const DOC_PAGE: &str = r#"
    <html><head><title>Doc</title></head><body>
    <main><h1>Feature docs</h1><p>Faster query performance for all.</p></main>
    </body></html>
    "#;

    #[tokio::test]
    async fn test_research_without_llm_completes_with_skip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/docs/feature"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOC_PAGE))
            .mount(&server)
            .await;

        let pipeline = ContentResearchPipeline::new(config_for(&server), None, None).unwrap();
        let mut feature = Feature::new("Feature", "desc", Domain::Search);
        feature.documentation_urls = vec![format!("{}/docs/feature", server.uri())];

        let report = pipeline.research(&mut feature).await;

        assert!(matches!(report.extraction, StepOutcome::Skipped(_)));
        let record = feature.content_research.unwrap();
        assert_eq!(record.status, ResearchStatus::Completed);
        assert_eq!(record.sources.len(), 1);
        assert!(record.sources[0].text.contains("Faster query"));
    }

    #[tokio::test]
    async fn test_research_all_urls_failing_marks_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let pipeline = ContentResearchPipeline::new(config_for(&server), None, None).unwrap();
        let mut feature = Feature::new("Feature", "desc", Domain::Search);
        feature.documentation_urls = vec![format!("{}/missing", server.uri())];

        pipeline.research(&mut feature).await;

        let record = feature.content_research.unwrap();
        assert_eq!(record.status, ResearchStatus::Failed);
        assert!(record.sources.is_empty());
        assert_eq!(record.errors.len(), 1);
    }

    #[tokio::test]
    async fn test_blocked_domain_recorded_not_propagated() {
        let server = MockServer::start().await;
        let mut config = config_for(&server);
        config.allowed_domains = vec!["example.com".to_string()];

        let pipeline = ContentResearchPipeline::new(config, None, None).unwrap();
        let mut feature = Feature::new("Feature", "desc", Domain::Search);
        feature.documentation_urls = vec![format!("{}/docs/feature", server.uri())];

        pipeline.research(&mut feature).await;

        let record = feature.content_research.unwrap();
        assert_eq!(record.status, ResearchStatus::Failed);
        assert!(record.errors[0].contains("Domain not allowed"));
    }

    #[tokio::test]
    async fn test_research_overwrites_previous_record() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(DOC_PAGE))
            .mount(&server)
            .await;

        let pipeline = ContentResearchPipeline::new(config_for(&server), None, None).unwrap();
        let mut feature = Feature::new("Feature", "desc", Domain::Search);
        feature.documentation_urls = vec![format!("{}/docs/feature", server.uri())];

        pipeline.research(&mut feature).await;
        let first = feature.content_research.clone().unwrap();
        pipeline.research(&mut feature).await;
        let second = feature.content_research.unwrap();

        // Same shape both times, not accumulated.
        assert_eq!(first.sources.len(), second.sources.len());
    }
}
