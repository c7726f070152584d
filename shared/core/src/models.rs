//! Value types shared by every stage of the discovery pipeline. Nothing here
//! owns I/O; these are the shapes the components pass between each other.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A trimmed, non-empty user query, capped at 1 KiB.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("query is empty")]
    Empty,
    #[error("query exceeds 1 KiB")]
    TooLong,
}

impl Query {
    pub const MAX_BYTES: usize = 1024;

    pub fn new(raw: &str) -> Result<Self, QueryError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(QueryError::Empty);
        }
        if trimmed.len() > Self::MAX_BYTES {
            return Err(QueryError::TooLong);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Matches `^[a-z]+\.[A-Z]{2,}$`, e.g. `cs.CV`.
pub fn is_simple_category(s: &str) -> bool {
    let Some((group, code)) = s.split_once('.') else {
        return false;
    };
    !group.is_empty()
        && group.chars().all(|c| c.is_ascii_lowercase())
        && code.len() >= 2
        && code.chars().all(|c| c.is_ascii_uppercase())
}

/// A tagged union: exactly one of an arXiv category/advanced-query pair or a
/// subreddit name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SourceSelection {
    Arxiv {
        category: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        advanced_query: Option<String>,
    },
    Reddit {
        subreddit: String,
    },
}

impl SourceSelection {
    pub fn source_name(&self) -> &'static str {
        match self {
            SourceSelection::Arxiv { .. } => "arxiv",
            SourceSelection::Reddit { .. } => "reddit",
        }
    }

    pub fn source_type(&self) -> &'static str {
        match self {
            SourceSelection::Arxiv { .. } => "research",
            SourceSelection::Reddit { .. } => "community",
        }
    }

    /// The search expression actually executed against the source: the
    /// advanced query if present, otherwise the bare category/subreddit.
    pub fn search_expression(&self) -> String {
        match self {
            SourceSelection::Arxiv {
                category,
                advanced_query,
            } => advanced_query
                .clone()
                .unwrap_or_else(|| format!("cat:{category}")),
            SourceSelection::Reddit { subreddit } => subreddit.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArticleSource {
    Arxiv,
    Reddit,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub authors: Vec<String>,
    pub published: Option<DateTime<Utc>>,
    pub source: ArticleSource,
}

impl Article {
    /// `trim(title + " " + summary)`, the text fed to the embedding provider
    /// and to per-cluster keyword extraction.
    pub fn document_text(&self) -> String {
        format!("{} {}", self.title, self.summary).trim().to_string()
    }
}

/// An `(term, weight)` pair produced by count-based keyword extraction.
pub type Keyword = (String, f64);

/// The special id reserved for unclustered ("noise") documents.
pub const NOISE_CLUSTER_ID: i64 = -1;

#[derive(Debug, Clone)]
pub struct Cluster {
    pub internal_id: i64,
    pub articles: Vec<Article>,
    pub keywords: Vec<Keyword>,
    pub representative_docs: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Topic {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub article_count: usize,
    pub relevance: u32,
    pub articles: Vec<Article>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiscoveryResult {
    pub query: String,
    pub topics: Vec<Topic>,
    pub total_articles_processed: usize,
}

/// Clustering/ranking parameters for `TopicEngine::cluster`.
#[derive(Debug, Clone)]
pub struct TopicParams {
    pub min_cluster_size: usize,
    pub nr_topics: Option<usize>,
    pub max_articles_per_topic: usize,
}

impl Default for TopicParams {
    fn default() -> Self {
        Self {
            min_cluster_size: 3,
            nr_topics: None,
            max_articles_per_topic: 40,
        }
    }
}
