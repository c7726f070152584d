//! Wire DTOs for the classifier service, matching
//! `original_source/services/py-genai/src/routers/classification.py` and
//! `routers/arxiv.py` (`/query/build/{source}`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    pub source: &'static str,
    pub source_type: &'static str,
    pub suggested_category: String,
    pub confidence: f64,
}

#[derive(Debug, Deserialize, Default)]
pub struct QueryBuilderFilters {
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub subreddit: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QueryBuilderRequest {
    pub search_terms: String,
    #[serde(default)]
    pub filters: QueryBuilderFilters,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QueryBuilderResponse {
    pub query: String,
    pub description: String,
    pub source: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
