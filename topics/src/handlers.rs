//! `/topics/discover` handler. Resolves embeddings for the request's
//! articles read-through the shared cache, then hands off to
//! `conhub_core::topic_engine::TopicEngine`, mirroring
//! `original_source/services/py-topics/src/services/topic_service.py`'s
//! id-aligned embedding resolution.

use actix_web::{web, HttpResponse};
use conhub_core::embedding_cache::EmbeddingCache;
use conhub_core::llm::GenAiClient;
use conhub_core::models::TopicParams;
use conhub_core::qdrant_store::QdrantVectorStore;
use conhub_core::topic_engine::TopicEngine;

use crate::models::{ErrorResponse, TopicDiscoveryRequest, TopicDiscoveryResponse};

pub struct AppState {
    pub cache: EmbeddingCache<QdrantVectorStore, GenAiClient>,
    pub engine: TopicEngine<GenAiClient>,
}

pub async fn discover_handler(
    body: web::Json<TopicDiscoveryRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let request = body.into_inner();

    if request.articles.is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "articles cannot be empty".to_string(),
        });
    }

    let ids: Vec<String> = if request.article_ids.len() == request.articles.len() {
        request.article_ids
    } else {
        request.articles.iter().map(|a| a.id.clone()).collect()
    };
    let texts: Vec<String> = request.articles.iter().map(|a| a.document_text()).collect();

    let (embeddings, cached_count) = state.cache.get_or_compute(&ids, &texts).await;
    tracing::info!(cached = cached_count, total = ids.len(), "resolved embeddings");

    let params = TopicParams {
        min_cluster_size: request.min_cluster_size.unwrap_or_else(|| TopicParams::default().min_cluster_size),
        nr_topics: request.nr_topics,
        ..TopicParams::default()
    };

    let result = state
        .engine
        .cluster(&request.query, request.articles, embeddings, &params)
        .await;

    HttpResponse::Ok().json(TopicDiscoveryResponse {
        query: result.query,
        topics: result.topics,
        total_articles_processed: result.total_articles_processed,
    })
}

pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}
