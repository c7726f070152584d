//! Classifier service: `POST /classify`, `POST /query/build/{source}`, and
//! `GET /sources/{source}/categories`, backed by
//! `conhub_core::query_classifier::QueryClassifier`.

mod handlers;
mod models;

use actix_web::{web, App, HttpServer};
use conhub_config::AppConfig;
use conhub_core::llm::GenAiClient;
use conhub_core::query_classifier::QueryClassifier;
use conhub_observability::{init_tracing_for, metrics_handler, Metrics, RequestLogging};
use std::sync::Arc;

use handlers::{build_query_handler, categories_handler, classify_handler, health_handler, AppState};

const SERVICE_NAME: &str = "classifier";

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
    let state = web::Data::new(AppState {
        classifier: QueryClassifier::new(llm),
    });
    let metrics = web::Data::new(Metrics::new(SERVICE_NAME));

    let port: u16 = std::env::var("CLASSIFIER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8081);
    let host = std::env::var("CLASSIFIER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    tracing::info!(host = %host, port, "starting classifier service");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            .app_data(state.clone())
            .app_data(metrics.clone())
            .route("/health", web::get().to(health_handler))
            .route("/metrics", web::get().to(metrics_handler))
            .service(
                web::scope("/api/v1")
                    .route("/classify", web::post().to(classify_handler))
                    .route("/query/build/{source}", web::post().to(build_query_handler))
                    .route("/sources/{source}/categories", web::get().to(categories_handler)),
            )
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{test, web, App};

    fn test_state() -> web::Data<AppState> {
        let llm = Arc::new(GenAiClient::new("http://localhost", "test-key", "chat", "embed"));
        web::Data::new(AppState {
            classifier: QueryClassifier::new(llm),
        })
    }

    #[actix_web::test]
    async fn empty_query_is_rejected() {
        let state = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).route(
            "/api/v1/classify",
            web::post().to(classify_handler),
        ))
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/classify")
            .set_json(serde_json::json!({"query": "   "}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn build_query_rejects_unknown_source() {
        let app = test::init_service(
            App::new().route("/api/v1/query/build/{source}", web::post().to(build_query_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/query/build/hackernews")
            .set_json(serde_json::json!({"search_terms": "rust"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn build_query_arxiv_happy_path() {
        let app = test::init_service(
            App::new().route("/api/v1/query/build/{source}", web::post().to(build_query_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/query/build/arxiv")
            .set_json(serde_json::json!({
                "search_terms": "graph neural networks",
                "filters": {"category": "cs.LG"}
            }))
            .to_request();
        let resp: models::QueryBuilderResponse = test::call_and_read_body_json(&app, req).await;
        assert_eq!(resp.query, "all:\"graph neural networks\"+AND+cat:cs.LG");
        assert_eq!(resp.source, "arxiv");
    }

    #[actix_web::test]
    async fn categories_unknown_source_is_404() {
        let app = test::init_service(
            App::new().route("/api/v1/sources/{source}/categories", web::get().to(categories_handler)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/api/v1/sources/reddit/categories")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 404);
    }
}
