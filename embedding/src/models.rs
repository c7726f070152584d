//! Wire DTOs for the embedding service, matching
//! `original_source/services/py-genai/src/routers/embedding.py` and
//! `routers/generation.py`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct EmbedRequest {
    pub texts: Vec<String>,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct EmbedResponse {
    pub embeddings: Vec<Option<Vec<f32>>>,
    pub cached_count: usize,
}

#[derive(Debug, Serialize)]
pub struct GetEmbeddingsResponse {
    pub embeddings: Vec<Option<Vec<f32>>>,
    pub found_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct GenerateTextRequest {
    pub prompt: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
pub struct GenerateTextResponse {
    pub text: String,
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}
