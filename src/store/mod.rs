//! Document store for finished decks and lab guides
//!
//! One trait with two implementations: an Elasticsearch-compatible HTTP store
//! for real persistence and an in-memory store for tests and dry runs.

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::models::{LabGuide, Presentation};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn put(&self, id: &str, doc: &Value) -> Result<()>;
    async fn get(&self, id: &str) -> Result<Option<Value>>;
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Value>>;
}

/// Stable document id for a deck: lowercase domain plus quarter slug.
pub fn presentation_doc_id(presentation: &Presentation) -> String {
    format!(
        "deck-{}-{}",
        slug(&presentation.domain.to_string()),
        slug(&presentation.quarter)
    )
}

pub fn lab_doc_id(guide: &LabGuide) -> String {
    format!("lab-{}", guide.feature_id)
}

fn slug(text: &str) -> String {
    text.to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

pub async fn save_presentation(
    store: &dyn DocumentStore,
    presentation: &Presentation,
) -> Result<String> {
    let id = presentation_doc_id(presentation);
    store.put(&id, &serde_json::to_value(presentation)?).await?;
    Ok(id)
}

pub async fn save_lab_guide(store: &dyn DocumentStore, guide: &LabGuide) -> Result<String> {
    let id = lab_doc_id(guide);
    store.put(&id, &serde_json::to_value(guide)?).await?;
    Ok(id)
}

/// Elasticsearch-compatible HTTP store.
pub struct ElasticStore {
    client: Client,
    base_url: String,
    index: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: Value,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<Value>,
}

impl ElasticStore {
    pub fn new(base_url: &str, index: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
        })
    }

    /// Build a store from config. An empty URL means persistence is disabled.
    pub fn from_config(config: &StoreConfig) -> Result<Option<Self>> {
        if !config.is_configured() {
            return Ok(None);
        }
        Ok(Some(Self::new(&config.url, &config.index)?))
    }

    fn doc_url(&self, id: &str) -> String {
        format!("{}/{}/_doc/{}", self.base_url, self.index, id)
    }
}

#[async_trait]
impl DocumentStore for ElasticStore {
    async fn put(&self, id: &str, doc: &Value) -> Result<()> {
        let response = self.client.put(self.doc_url(id)).json(doc).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Store(format!(
                "Failed to store document '{}': HTTP {} {}",
                id, status, body
            )));
        }
        debug!("Stored document '{}' in index '{}'", id, self.index);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Value>> {
        let response = self.client.get(self.doc_url(id)).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!(
                "Failed to get document '{}': HTTP {}",
                id, status
            )));
        }
        let body: GetResponse = response.json().await?;
        Ok(if body.found { body.source } else { None })
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Value>> {
        let url = format!("{}/{}/_search", self.base_url, self.index);
        let body = serde_json::json!({
            "size": limit,
            "query": { "query_string": { "query": query } }
        });
        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Store(format!("Search failed: HTTP {}", status)));
        }
        let parsed: SearchResponse = response.json().await?;
        Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
    }
}

/// In-memory store. Search is a naive substring match over the serialized
/// document, which is enough for tests.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<HashMap<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, id: &str, doc: &Value) -> Result<()> {
        self.docs.write().await.insert(id.to_string(), doc.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Value>> {
        Ok(self.docs.read().await.get(id).cloned())
    }

    async fn search(&self, query: &str, limit: usize) -> Result<Vec<Value>> {
        let needle = query.to_lowercase();
        let docs = self.docs.read().await;
        Ok(docs
            .values()
            .filter(|d| d.to_string().to_lowercase().contains(&needle))
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Domain, Theme};
    use chrono::Utc;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn deck() -> Presentation {
        Presentation {
            title: "Search Innovation".to_string(),
            slides: vec![crate::models::SlideContent {
                title: "Opening".to_string(),
                subtitle: None,
                body: "body".to_string(),
                business_value: "value".to_string(),
                theme: Theme::Simplify,
                story_position: None,
                talk_track: None,
                customer_stories: vec![],
                business_impact: None,
            }],
            domain: Domain::Search,
            quarter: "2026 Q1".to_string(),
            feature_ids: vec![],
            featured_themes: vec![Theme::Simplify],
            story_arc: None,
            generated_at: Utc::now(),
        }
    }

    #[test]
    fn test_presentation_doc_id_is_slugged() {
        assert_eq!(presentation_doc_id(&deck()), "deck-search-2026-q1");
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemoryStore::new();
        let id = save_presentation(&store, &deck()).await.unwrap();

        let doc = store.get(&id).await.unwrap().unwrap();
        assert_eq!(doc["title"], "Search Innovation");
        assert!(store.get("missing").await.unwrap().is_none());

        let hits = store.search("innovation", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert!(store.search("nothing-matches", 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_elastic_store_put_and_get() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/decks/_doc/deck-search-2026-q1"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "result": "created"
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/decks/_doc/deck-search-2026-q1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "found": true,
                "_source": {"title": "Search Innovation"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/decks/_doc/missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let store = ElasticStore::new(&server.uri(), "decks").unwrap();
        save_presentation(&store, &deck()).await.unwrap();

        let doc = store.get("deck-search-2026-q1").await.unwrap().unwrap();
        assert_eq!(doc["title"], "Search Innovation");
        assert!(store.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_elastic_store_search_unwraps_hits() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/decks/_search"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "hits": {"hits": [{"_source": {"title": "A"}}, {"_source": {"title": "B"}}]}
            })))
            .mount(&server)
            .await;

        let store = ElasticStore::new(&server.uri(), "decks").unwrap();
        let hits = store.search("title:A", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0]["title"], "A");
    }

    #[test]
    fn test_from_config_disabled_when_url_empty() {
        let config = StoreConfig {
            url: String::new(),
            index: "decks".to_string(),
        };
        assert!(ElasticStore::from_config(&config).unwrap().is_none());
    }
}
