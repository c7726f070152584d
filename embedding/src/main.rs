//! Embedding service: `POST /embeddings`, `GET /embeddings`, and
//! `POST /generate/text`, backed by `conhub_core::embedding_cache` over a
//! Qdrant-backed vector store and a shared `GenAiClient`.

mod handlers;
mod models;

use actix_web::{web, App, HttpServer};
use conhub_config::AppConfig;
use conhub_core::embedding_cache::EmbeddingCache;
use conhub_core::llm::{EmbeddingProvider, GenAiClient};
use conhub_core::qdrant_store::QdrantVectorStore;
use conhub_observability::{init_tracing_for, metrics_handler, Metrics, RequestLogging};
use qdrant_client::prelude::*;
use std::sync::Arc;

use handlers::{embed_handler, generate_text_handler, get_embeddings_handler, health_handler, AppState};

const SERVICE_NAME: &str = "embedding";
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
    let state = web::Data::new(AppState {
        cache,
        llm,
        chat_model: config.chat_model.clone(),
    });
    let metrics = web::Data::new(Metrics::new(SERVICE_NAME));

    let port: u16 = std::env::var("EMBEDDING_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8082);
    let host = std::env::var("EMBEDDING_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    tracing::info!(host = %host, port, "starting embedding service");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            .app_data(state.clone())
            .app_data(metrics.clone())
            .route("/health", web::get().to(health_handler))
            .route("/metrics", web::get().to(metrics_handler))
            .service(
                web::scope("/api/v1")
                    .route("/embeddings", web::post().to(embed_handler))
                    .route("/embeddings", web::get().to(get_embeddings_handler))
                    .route("/generate/text", web::post().to(generate_text_handler)),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, App};

    // These tests only exercise the validation paths that return before any
    // Qdrant/LLM call is made: the gRPC channel is built lazily, so
    // constructing a client against an unreachable URL is safe as long as no
    // handler actually dials out.
    fn test_state() -> web::Data<AppState> {
        let llm = Arc::new(GenAiClient::new("http://localhost", "test-key", "chat", "embed"));
        let qdrant = QdrantClient::from_url("http://localhost:1").build().unwrap();
        let store = QdrantVectorStore::new(qdrant, "article");
        web::Data::new(AppState {
            cache: EmbeddingCache::new(Arc::new(store), Arc::clone(&llm)),
            llm,
            chat_model: "chat".to_string(),
        })
    }

    #[actix_web::test]
    async fn embed_rejects_length_mismatch() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .route("/api/v1/embeddings", web::post().to(embed_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/embeddings")
            .set_json(serde_json::json!({"texts": ["a", "b"], "ids": ["only-one"]}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn generate_text_rejects_empty_prompt() {
        let state = test_state();
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .route("/api/v1/generate/text", web::post().to(generate_text_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/generate/text")
            .set_json(serde_json::json!({"prompt": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
