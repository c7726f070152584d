//! Topic discovery service: `POST /api/v1/topics/discover`, backed by
//! `conhub_core::embedding_cache::EmbeddingCache` and
//! `conhub_core::topic_engine::TopicEngine` over the same Qdrant-backed
//! vector store the embedding service writes to.

mod handlers;
mod models;

use actix_web::{web, App, HttpServer};
use conhub_config::AppConfig;
use conhub_core::embedding_cache::EmbeddingCache;
use conhub_core::llm::{EmbeddingProvider, GenAiClient};
use conhub_core::qdrant_store::QdrantVectorStore;
use conhub_core::topic_engine::TopicEngine;
use conhub_observability::{init_tracing_for, metrics_handler, Metrics, RequestLogging};
use qdrant_client::prelude::*;
use std::sync::Arc;

use handlers::{discover_handler, health_handler, AppState};

const SERVICE_NAME: &str = "topics";
const COLLECTION_NAME: &str = "article";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing_for(SERVICE_NAME);

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "fatal configuration error at startup");
        std::process::exit(1);
    });

    let llm = Arc::new(GenAiClient::new(
        &config.genai_base_url,
        &config.llm_api_key,
        &config.chat_model,
        &config.embedding_model,
    ));

    let qdrant = QdrantClient::from_url(&config.qdrant_url)
        .build()
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "fatal: could not build qdrant client");
            std::process::exit(1);
        });
    let store = QdrantVectorStore::new(qdrant, COLLECTION_NAME);
    if let Err(e) = store.ensure_collection(llm.dimension()).await {
        tracing::warn!(error = %e, "could not ensure qdrant collection exists at startup");
    }

    let cache = EmbeddingCache::new(Arc::new(store), Arc::clone(&llm));
    let engine = TopicEngine::new(Arc::clone(&llm));
    let state = web::Data::new(AppState { cache, engine });
    let metrics = web::Data::new(Metrics::new(SERVICE_NAME));

    let port: u16 = std::env::var("TOPICS_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8084);
    let host = std::env::var("TOPICS_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    tracing::info!(host = %host, port, "starting topics service");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            .app_data(state.clone())
            .app_data(metrics.clone())
            .route("/health", web::get().to(health_handler))
            .route("/metrics", web::get().to(metrics_handler))
            .service(
                web::scope("/api/v1")
                    .route("/topics/discover", web::post().to(discover_handler)),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
