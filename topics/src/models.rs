//! Wire DTOs for the topics service, matching
//! `original_source/services/py-topics/src/main.py`'s `/api/v1/topics/discover`.

use conhub_core::models::{Article, Topic};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct TopicDiscoveryRequest {
    pub query: String,
    #[serde(default)]
    pub article_ids: Vec<String>,
    pub articles: Vec<Article>,
    #[serde(default)]
    pub min_cluster_size: Option<usize>,
    #[serde(default)]
    pub nr_topics: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct TopicDiscoveryResponse {
    pub query: String,
    pub topics: Vec<Topic>,
    pub total_articles_processed: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
