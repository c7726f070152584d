//! Wire DTOs for the fetcher service, matching
//! `original_source/services/py-fetcher/src/main.py`'s `/api/v1/articles`.

use conhub_core::models::Article;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ArticleFetchRequest {
    pub source: String,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ArticleFetchResponse {
    pub articles: Vec<Article>,
    pub total_found: usize,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
