//! `/embeddings` and `/generate/text` handlers. Thin wire glue: validate,
//! delegate to `conhub-core`, map the result back to JSON.

use actix_web::{web, HttpRequest, HttpResponse};
use conhub_core::embedding_cache::EmbeddingCache;
use conhub_core::llm::{GenAiClient, TextCompletionClient};
use conhub_core::qdrant_store::QdrantVectorStore;
use std::sync::Arc;
use url::form_urlencoded;

use crate::models::{
    EmbedRequest, EmbedResponse, ErrorResponse, GenerateTextRequest, GenerateTextResponse,
    GetEmbeddingsResponse,
};

pub type SharedCache = EmbeddingCache<QdrantVectorStore, GenAiClient>;

pub struct AppState {
    pub cache: SharedCache,
    pub llm: Arc<GenAiClient>,
    pub chat_model: String,
}

pub async fn embed_handler(
    body: web::Json<EmbedRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    if body.texts.len() != body.ids.len() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "the number of texts and ids must be the same".to_string(),
        });
    }

    let (embeddings, cached_count) = state.cache.get_or_compute(&body.ids, &body.texts).await;
    HttpResponse::Ok().json(EmbedResponse {
        embeddings,
        cached_count,
    })
}

pub async fn get_embeddings_handler(req: HttpRequest, state: web::Data<AppState>) -> HttpResponse {
    let ids: Vec<String> = form_urlencoded::parse(req.query_string().as_bytes())
        .filter(|(k, _)| k == "ids")
        .map(|(_, v)| v.into_owned())
        .collect();

    let (embeddings, found_count) = state.cache.get_by_ids(&ids).await;
    HttpResponse::Ok().json(GetEmbeddingsResponse {
        embeddings,
        found_count,
    })
}

pub async fn generate_text_handler(
    body: web::Json<GenerateTextRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let prompt = body.prompt.trim();
    if prompt.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "prompt cannot be empty".to_string(),
        });
    }

    if body.max_tokens.is_some() || body.temperature.is_some() {
        tracing::debug!(
            max_tokens = ?body.max_tokens,
            temperature = ?body.temperature,
            "generate/text sampling parameters accepted but not forwarded"
        );
    }

    match state.llm.complete(prompt).await {
        Ok(text) => HttpResponse::Ok().json(GenerateTextResponse {
            text,
            model: body.model.clone().unwrap_or_else(|| state.chat_model.clone()),
            prompt: body.prompt.clone(),
        }),
        Err(e) => {
            tracing::error!(error = %e, "text generation failed");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("failed to generate text: {e}"),
            })
        }
    }
}

pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}
