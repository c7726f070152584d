//! `/articles` handler. Builds a `SourceSelection` from the request's
//! `source`/`query`/`category` fields, mirroring the routing logic in
//! `original_source/services/py-fetcher/src/main.py`, then delegates the
//! three-tier arXiv fallback and Reddit fetch to `conhub_core`.

use actix_web::{web, HttpResponse};
use conhub_core::article_fetcher::{ArticleFetcher, ReqwestFetch};
use conhub_core::models::SourceSelection;

use crate::models::{ArticleFetchRequest, ArticleFetchResponse, ErrorResponse};

pub struct AppState {
    pub fetcher: ArticleFetcher<ReqwestFetch>,
}

const DEFAULT_ARXIV_CATEGORY: &str = "cs.CV";

fn looks_advanced(expr: &str) -> bool {
    expr.contains("cat:") || expr.contains("all:")
}

pub async fn fetch_articles_handler(
    body: web::Json<ArticleFetchRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    let limit = body.limit.unwrap_or(50);
    let query = body.query.clone().unwrap_or_default();

    let selection = match body.source.as_str() {
        "arxiv" => match &body.category {
            Some(category) if looks_advanced(category) => SourceSelection::Arxiv {
                category: DEFAULT_ARXIV_CATEGORY.to_string(),
                advanced_query: Some(category.clone()),
            },
            Some(category) => SourceSelection::Arxiv {
                category: category.clone(),
                advanced_query: None,
            },
            None if !query.trim().is_empty() => SourceSelection::Arxiv {
                category: DEFAULT_ARXIV_CATEGORY.to_string(),
                advanced_query: Some(query.clone()),
            },
            None => {
                return HttpResponse::BadRequest().json(ErrorResponse {
                    error: "arxiv requests require a query or category".to_string(),
                })
            }
        },
        "reddit" => {
            let subreddit = body.category.clone().or_else(|| body.query.clone());
            match subreddit {
                Some(subreddit) if !subreddit.trim().is_empty() => {
                    SourceSelection::Reddit { subreddit }
                }
                _ => {
                    return HttpResponse::BadRequest().json(ErrorResponse {
                        error: "reddit requests require a query or category".to_string(),
                    })
                }
            }
        }
        other => {
            return HttpResponse::BadRequest().json(ErrorResponse {
                error: format!("unsupported source: {other}"),
            })
        }
    };

    match state.fetcher.fetch(&selection, &query, limit).await {
        Ok(articles) => {
            tracing::info!(count = articles.len(), source = %body.source, "fetched articles");
            HttpResponse::Ok().json(ArticleFetchResponse {
                total_found: articles.len(),
                articles,
                source: body.source.clone(),
            })
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch articles");
            HttpResponse::InternalServerError().json(ErrorResponse {
                error: format!("failed to fetch articles: {e}"),
            })
        }
    }
}

pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}
