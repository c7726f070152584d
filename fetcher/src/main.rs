//! Fetcher service: `POST /api/v1/articles`, backed by
//! `conhub_core::article_fetcher::ArticleFetcher`.

mod handlers;
mod models;

use actix_web::{web, App, HttpServer};
use conhub_config::AppConfig;
use conhub_core::article_fetcher::{ArticleFetcher, ReqwestFetch};
use conhub_observability::{init_tracing_for, metrics_handler, Metrics, RequestLogging};
use std::sync::Arc;

use handlers::{fetch_articles_handler, health_handler, AppState};

const SERVICE_NAME: &str = "fetcher";

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_tracing_for(SERVICE_NAME);

    let config = AppConfig::from_env().unwrap_or_else(|e| {
        tracing::error!(error = %e, "fatal configuration error at startup");
        std::process::exit(1);
    });

    let http = Arc::new(ReqwestFetch::new(config.http_client.clone()));
    let state = web::Data::new(AppState {
        fetcher: ArticleFetcher::new(http),
    });
    let metrics = web::Data::new(Metrics::new(SERVICE_NAME));

    let port: u16 = std::env::var("FETCHER_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8083);
    let host = std::env::var("FETCHER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

    tracing::info!(host = %host, port, "starting fetcher service");

    HttpServer::new(move || {
        App::new()
            .wrap(RequestLogging)
            .app_data(state.clone())
            .app_data(metrics.clone())
            .route("/health", web::get().to(health_handler))
            .route("/metrics", web::get().to(metrics_handler))
            .service(
                web::scope("/api/v1").route("/articles", web::post().to(fetch_articles_handler)),
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
    use conhub_core::article_fetcher::HttpFetch;
    use async_trait::async_trait;

    struct FakeHttp(String);

    #[async_trait]
    impl HttpFetch for FakeHttp {
        async fn get_text(&self, _url: &str) -> Result<String, conhub_core::errors::FetchError> {
            Ok(self.0.clone())
        }
    }

    fn empty_feed() -> String {
        r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#.to_string()
    }

    #[actix_web::test]
    async fn unsupported_source_is_rejected() {
        let state = web::Data::new(handlers::AppState {
            fetcher: ArticleFetcher::new(Arc::new(ReqwestFetch::new(reqwest::Client::new()))),
        });
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .route("/api/v1/articles", web::post().to(fetch_articles_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/articles")
            .set_json(serde_json::json!({"source": "hackernews", "query": "rust"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn arxiv_without_query_or_category_is_rejected() {
        let state = web::Data::new(handlers::AppState {
            fetcher: ArticleFetcher::new(Arc::new(ReqwestFetch::new(reqwest::Client::new()))),
        });
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .route("/api/v1/articles", web::post().to(fetch_articles_handler)),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/v1/articles")
            .set_json(serde_json::json!({"source": "arxiv"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }
}
