//! Documentation page fetching and content extraction
//!
//! Fetches a page with a fixed User-Agent and timeout, strips boilerplate
//! elements, selects the main content via an ordered selector list, truncates
//! to the configured length, and collects light metadata.

use crate::config::ResearchConfig;
use crate::error::{Error, Result};
use crate::models::{SourceContent, SourceRelation};
use chrono::Utc;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

/// Elements removed wholesale before content selection.
const STRIP_TAGS: &[&str] = &["script", "style", "nav", "footer", "header", "aside"];

/// A fetched page plus the links discovered inside its main content.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub source: SourceContent,
    pub links: Vec<PageLink>,
}

/// An internal link candidate for related-page discovery.
#[derive(Debug, Clone)]
pub struct PageLink {
    pub url: String,
    pub text: String,
}

pub struct Fetcher {
    client: Client,
    config: ResearchConfig,
}

impl Fetcher {
    pub fn new(config: ResearchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()
            .map_err(|e| Error::Research(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ResearchConfig {
        &self.config
    }

    /// Whether the URL's host falls under the configured allow-list
    /// (suffix match, so `docs.example.com` matches `example.com`).
    pub fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = url.host_str() else {
            return false;
        };
        self.config
            .allowed_domains
            .iter()
            .any(|d| host == d || host.ends_with(&format!(".{}", d)))
    }

    /// Fetch one documentation page. Callers are responsible for rate
    /// limiting before invoking this.
    pub async fn fetch(&self, url: &str, relation: SourceRelation) -> Result<FetchedPage> {
        let parsed = Url::parse(url)?;
        if !self.is_allowed(&parsed) {
            return Err(Error::BlockedDomain(
                parsed.host_str().unwrap_or("<no host>").to_string(),
            ));
        }

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Research(format!("HTTP {}: {}", status, url)));
        }

        let last_modified = response
            .headers()
            .get(reqwest::header::LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let html = response.text().await?;
        let host = parsed.host_str().unwrap_or_default().to_string();

        Ok(extract_page(
            &html,
            url,
            &host,
            relation,
            last_modified,
            &self.config,
        ))
    }
}

/// Extract main content and metadata from raw HTML.
pub fn extract_page(
    html: &str,
    url: &str,
    host: &str,
    relation: SourceRelation,
    last_modified: Option<String>,
    config: &ResearchConfig,
) -> FetchedPage {
    let cleaned = strip_boilerplate(html);
    let document = Html::parse_document(&cleaned);

    let title = select_first_text(&document, "title");
    let author = select_meta(&document, "author");
    let last_modified =
        last_modified.or_else(|| select_meta(&document, "last-modified"));

    // First matching selector wins; "body" in the generic list guarantees a hit.
    let main_html = config
        .selectors_for_host(host)
        .iter()
        .filter_map(|s| Selector::parse(s).ok())
        .find_map(|sel| document.select(&sel).next().map(|e| e.html()))
        .unwrap_or_else(|| cleaned.clone());

    let text = html2text::from_read(main_html.as_bytes(), 80)
        .unwrap_or_else(|_| String::new());
    let text = truncate_chars(&normalize_whitespace(&text), config.max_content_length);

    let headings = collect_headings(&document);
    let code_block_count = count_selector(&document, "pre");
    let image_count = count_selector(&document, "img");
    let links = collect_links(&main_html, url);

    FetchedPage {
        source: SourceContent {
            url: url.to_string(),
            title,
            text,
            headings,
            code_block_count,
            image_count,
            author,
            last_modified,
            relation,
            fetched_at: Utc::now(),
        },
        links,
    }
}

/// Remove script/style/nav/footer/header/aside subtrees from raw HTML.
fn strip_boilerplate(html: &str) -> String {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    let patterns = PATTERNS.get_or_init(|| {
        STRIP_TAGS
            .iter()
            .filter_map(|tag| {
                Regex::new(&format!(r"(?is)<{tag}\b[^>]*>.*?</{tag}\s*>")).ok()
            })
            .collect()
    });

    let mut cleaned = html.to_string();
    for pattern in patterns {
        cleaned = pattern.replace_all(&cleaned, "").into_owned();
    }
    cleaned
}

fn select_first_text(document: &Html, selector: &str) -> Option<String> {
    let sel = Selector::parse(selector).ok()?;
    document
        .select(&sel)
        .next()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .filter(|t| !t.is_empty())
}

fn select_meta(document: &Html, name: &str) -> Option<String> {
    let sel = Selector::parse(&format!(r#"meta[name="{}"]"#, name)).ok()?;
    document
        .select(&sel)
        .next()
        .and_then(|e| e.value().attr("content"))
        .map(|s| s.to_string())
        .filter(|s| !s.is_empty())
}

fn collect_headings(document: &Html) -> Vec<String> {
    let mut headings = Vec::new();
    for level in 1..=3 {
        if let Ok(sel) = Selector::parse(&format!("h{}", level)) {
            for elem in document.select(&sel) {
                let text = elem.text().collect::<String>().trim().to_string();
                if !text.is_empty() {
                    headings.push(text);
                }
            }
        }
    }
    headings
}

fn count_selector(document: &Html, selector: &str) -> usize {
    Selector::parse(selector)
        .map(|sel| document.select(&sel).count())
        .unwrap_or(0)
}

/// Links inside the main content, resolved against the page URL.
/// Only same-host-or-subdomain links survive; anchors and mailto are dropped.
fn collect_links(main_html: &str, base_url: &str) -> Vec<PageLink> {
    let Ok(base) = Url::parse(base_url) else {
        return Vec::new();
    };
    let fragment = Html::parse_fragment(main_html);
    let Ok(sel) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    let mut links = Vec::new();
    for elem in fragment.select(&sel) {
        let Some(href) = elem.value().attr("href") else {
            continue;
        };
        if href.starts_with('#') || href.starts_with("mailto:") {
            continue;
        }
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if resolved.scheme() != "http" && resolved.scheme() != "https" {
            continue;
        }
        let text = elem.text().collect::<String>().trim().to_string();
        links.push(PageLink {
            url: resolved.to_string(),
            text,
        });
    }
    links
}

fn normalize_whitespace(text: &str) -> String {
    let lines: Vec<&str> = text.lines().map(|l| l.trim_end()).collect();
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0;
    for line in lines {
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }
    out.trim().to_string()
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}
