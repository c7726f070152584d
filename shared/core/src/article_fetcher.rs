//! Retrieves articles from arXiv or Reddit, normalizing both into the
//! `Article` shape. Encapsulates arXiv's three-tier empty-result fallback,
//! the arXiv-specific query encoding, and Atom feed parsing.

use crate::errors::FetchError;
use crate::models::{Article, ArticleSource, SourceSelection};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::Deserialize;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const DEFAULT_LIMIT: usize = 50;
pub const MAX_LIMIT: usize = 200;

const ARXIV_API_BASE: &str = "https://export.arxiv.org/api/query";
const REDDIT_BASE: &str = "https://www.reddit.com";
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);
const MAX_RETRIES: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(500);

/// Raw network access, abstracted so tests can substitute canned responses
/// instead of reaching the real arXiv/Reddit endpoints.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get_text(&self, url: &str) -> Result<String, FetchError>;
}

pub struct ReqwestFetch {
    client: reqwest::Client,
}

impl ReqwestFetch {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))?;

        if !response.status().is_success() {
            return Err(FetchError::Transient(format!(
                "upstream returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Transient(e.to_string()))
    }
}

pub struct ArticleFetcher<H: HttpFetch> {
    http: Arc<H>,
    last_request: Mutex<Option<Instant>>,
}

impl<H: HttpFetch> ArticleFetcher<H> {
    pub fn new(http: Arc<H>) -> Self {
        Self {
            http,
            last_request: Mutex::new(None),
        }
    }

    /// `free_text` is the original, un-normalized user query, used only as
    /// the arXiv path's third fallback tier; it is ignored for Reddit.
    pub async fn fetch(
        &self,
        selection: &SourceSelection,
        free_text: &str,
        limit: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let limit = limit.clamp(1, MAX_LIMIT);
        match selection {
            SourceSelection::Arxiv { category, .. } => {
                self.fetch_arxiv(&selection.search_expression(), category, free_text, limit)
                    .await
            }
            SourceSelection::Reddit { subreddit } => self.fetch_reddit(subreddit, limit).await,
        }
    }

    /// Three-tier fallback: the original expression, then category-only if
    /// the expression was an advanced query, then the original free-text
    /// query unescaped. Each tier only runs if the previous returned zero
    /// results.
    async fn fetch_arxiv(
        &self,
        expression: &str,
        category: &str,
        free_text: &str,
        limit: usize,
    ) -> Result<Vec<Article>, FetchError> {
        let primary = self.run_arxiv_query(expression, limit).await?;
        if !primary.is_empty() {
            return Ok(primary);
        }

        if is_advanced_expression(expression) {
            let category_only = format!("cat:{}", last_cat_token(expression).unwrap_or(category));
            let tier2 = self.run_arxiv_query(&category_only, limit).await?;
            if !tier2.is_empty() {
                return Ok(tier2);
            }
        }

        let tier3 = if free_text.trim().is_empty() { category } else { free_text };
        self.run_arxiv_query(tier3, limit).await
    }

    async fn run_arxiv_query(&self, expression: &str, limit: usize) -> Result<Vec<Article>, FetchError> {
        let encoded = encode_arxiv_expression(expression);
        let url = format!(
            "{ARXIV_API_BASE}?search_query={encoded}&start=0&max_results={limit}&sortBy=relevance&sortOrder=descending"
        );
        let xml = self.request_with_retry(&url).await?;
        parse_atom_feed(&xml, ArticleSource::Arxiv)
    }

    async fn fetch_reddit(&self, subreddit: &str, limit: usize) -> Result<Vec<Article>, FetchError> {
        let url = format!("{REDDIT_BASE}/r/{subreddit}.rss");
        let xml = self.request_with_retry(&url).await?;
        let mut articles = parse_atom_feed(&xml, ArticleSource::Reddit)?;
        articles.truncate(limit);
        for article in &mut articles {
            article.authors.clear();
        }
        Ok(articles)
    }

    /// Serializes outbound requests behind the fetcher-wide 1s throttle,
    /// then retries transient failures up to `MAX_RETRIES` times with
    /// exponential backoff.
    async fn request_with_retry(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 0;
        loop {
            self.throttle().await;
            match self.http.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if attempt + 1 >= MAX_RETRIES => return Err(e),
                Err(e) => {
                    tracing::warn!(error = %e, attempt, "transient fetch failure, retrying");
                    tokio::time::sleep(RETRY_BASE_DELAY * 2u32.pow(attempt)).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(t) = *last {
            let elapsed = t.elapsed();
            if elapsed < MIN_REQUEST_INTERVAL {
                tokio::time::sleep(MIN_REQUEST_INTERVAL - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

fn is_advanced_expression(expr: &str) -> bool {
    (expr.contains("all:") || expr.contains("+AND+") || expr.contains("+OR+")) && expr.contains("cat:")
}

fn last_cat_token(expr: &str) -> Option<&str> {
    expr.rsplit("cat:").next().map(|tail| {
        tail.split("+AND+")
            .next()
            .unwrap_or(tail)
            .split("+OR+")
            .next()
            .unwrap_or(tail)
    })
}

/// Percent-encodes an arXiv search expression while leaving `:`, `+`, and
/// `"` literal, since those are arXiv query-grammar operators.
fn encode_arxiv_expression(expr: &str) -> String {
    urlencoding::encode(expr)
        .replace("%3A", ":")
        .replace("%2B", "+")
        .replace("%22", "\"")
}

#[derive(Debug, Deserialize)]
struct AtomFeed {
    #[serde(rename = "entry", default)]
    entries: Vec<AtomEntry>,
}

#[derive(Debug, Deserialize)]
struct AtomEntry {
    id: String,
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    published: Option<String>,
    #[serde(default)]
    updated: Option<String>,
    #[serde(rename = "author", default)]
    authors: Vec<AtomAuthor>,
}

#[derive(Debug, Deserialize)]
struct AtomAuthor {
    #[serde(default)]
    name: String,
}

fn parse_atom_feed(xml: &str, source: ArticleSource) -> Result<Vec<Article>, FetchError> {
    let feed: AtomFeed = quick_xml::de::from_str(xml)
        .map_err(|e| FetchError::Transient(format!("atom parse error: {e}")))?;

    Ok(feed
        .entries
        .into_iter()
        .map(|entry| {
            let id = entry.id.rsplit('/').next().unwrap_or(&entry.id).to_string();
            let published = entry
                .published
                .as_deref()
                .or(entry.updated.as_deref())
                .and_then(parse_timestamp);

            Article {
                id,
                title: clean_text(&entry.title),
                link: entry.id,
                summary: clean_text(&entry.summary),
                authors: entry.authors.into_iter().map(|a| a.name).collect(),
                published,
                source,
            }
        })
        .collect())
}

fn clean_text(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
        })
}

/// Builds a `GET /sources/{source}/categories` taxonomy grouping. Kept here
/// alongside the fetcher since it enumerates what the fetcher can actually
/// query.
pub fn static_category_taxonomy() -> Vec<(&'static str, Vec<&'static str>)> {
    crate::query_classifier::QueryClassifier::<crate::llm::GenAiClient>::category_suggestions()
}

#[allow(dead_code)]
fn category_regex() -> Regex {
    Regex::new(r"^[a-z]+\.[A-Z]{2,}$").expect("static regex is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedFetch {
        responses: Vec<Result<String, FetchError>>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl HttpFetch for ScriptedFetch {
        async fn get_text(&self, _url: &str) -> Result<String, FetchError> {
            let i = self.calls.fetch_add(1, Ordering::SeqCst);
            self.responses
                .get(i)
                .cloned()
                .unwrap_or_else(|| Err(FetchError::NotFound("exhausted script".into())))
        }
    }

    const EMPTY_FEED: &str = r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#;

    fn two_entry_feed() -> String {
        r#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>http://arxiv.org/abs/1234.5678v1</id>
    <title>  A   Paper
    Title </title>
    <summary>An abstract.</summary>
    <published>2024-01-02T03:04:05Z</published>
    <author><name>Jane Doe</name></author>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2234.5678v2</id>
    <title>Second Paper</title>
    <summary>Another abstract.</summary>
    <published>2024-02-02T03:04:05Z</published>
    <author><name>John Roe</name></author>
  </entry>
</feed>"#
            .to_string()
    }

    #[tokio::test]
    async fn arxiv_fallback_reaches_third_tier() {
        let http = Arc::new(ScriptedFetch {
            responses: vec![
                Ok(EMPTY_FEED.to_string()),
                Ok(EMPTY_FEED.to_string()),
                Ok(two_entry_feed()),
            ],
            calls: AtomicUsize::new(0),
        });
        let fetcher = ArticleFetcher::new(http);
        let selection = SourceSelection::Arxiv {
            category: "cs.CV".to_string(),
            advanced_query: Some("all:\"xyz\"+AND+cat:cs.CV".to_string()),
        };

        let articles = fetcher.fetch(&selection, "xyz", 50).await.unwrap();
        assert_eq!(articles.len(), 2);
        assert!(articles.iter().all(|a| a.source == ArticleSource::Arxiv));
    }

    #[tokio::test]
    async fn empty_result_is_not_an_error() {
        let http = Arc::new(ScriptedFetch {
            responses: vec![
                Ok(EMPTY_FEED.to_string()),
                Ok(EMPTY_FEED.to_string()),
                Ok(EMPTY_FEED.to_string()),
            ],
            calls: AtomicUsize::new(0),
        });
        let fetcher = ArticleFetcher::new(http);
        let selection = SourceSelection::Arxiv {
            category: "cs.CV".to_string(),
            advanced_query: None,
        };
        let articles = fetcher.fetch(&selection, "cs.CV", 50).await.unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn reddit_authors_are_always_empty() {
        let http = Arc::new(ScriptedFetch {
            responses: vec![Ok(two_entry_feed())],
            calls: AtomicUsize::new(0),
        });
        let fetcher = ArticleFetcher::new(http);
        let selection = SourceSelection::Reddit {
            subreddit: "computervision".to_string(),
        };
        let articles = fetcher.fetch(&selection, "computervision", 50).await.unwrap();
        assert!(articles.iter().all(|a| a.authors.is_empty()));
        assert!(articles.iter().all(|a| a.source == ArticleSource::Reddit));
    }

    #[test]
    fn encoding_preserves_query_operators() {
        let encoded = encode_arxiv_expression("all:\"graph neural\"+AND+cat:cs.CV");
        assert_eq!(encoded, "all:%22graph%20neural%22+AND+cat:cs.CV");
    }

    #[test]
    fn title_whitespace_is_collapsed() {
        assert_eq!(clean_text("  A   Paper\n    Title "), "A Paper Title");
    }
}
