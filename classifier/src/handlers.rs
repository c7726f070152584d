//! `/classify`, `/query/build/{source}`, and
//! `/sources/{source}/categories` handlers. Thin wire glue over
//! `conhub_core::query_classifier::QueryClassifier`.

use actix_web::{web, HttpResponse};
use conhub_core::llm::GenAiClient;
use conhub_core::query_classifier::QueryClassifier;
use std::collections::BTreeMap;

use crate::models::{
    ClassifyRequest, ClassifyResponse, ErrorResponse, QueryBuilderRequest, QueryBuilderResponse,
};

pub struct AppState {
    pub classifier: QueryClassifier<GenAiClient>,
}

pub async fn classify_handler(
    body: web::Json<ClassifyRequest>,
    state: web::Data<AppState>,
) -> HttpResponse {
    if body.query.trim().is_empty() {
        return HttpResponse::BadRequest().json(ErrorResponse {
            error: "query cannot be empty".to_string(),
        });
    }

    let outcome = state.classifier.classify(&body.query).await;
    HttpResponse::Ok().json(ClassifyResponse {
        source: outcome.selection.source_name(),
        source_type: outcome.selection.source_type(),
        suggested_category: outcome.selection.search_expression(),
        confidence: outcome.confidence,
    })
}

pub async fn build_query_handler(
    path: web::Path<String>,
    body: web::Json<QueryBuilderRequest>,
) -> HttpResponse {
    let source = path.into_inner().to_lowercase();

    match source.as_str() {
        "arxiv" => {
            let category = body.filters.category.clone().unwrap_or_else(|| "cs.CV".to_string());
            let query = QueryClassifier::<GenAiClient>::build_advanced_query(&body.search_terms, &category);
            let description =
                format!("Advanced arXiv search for '{}' in category {category}", body.search_terms);
            HttpResponse::Ok().json(QueryBuilderResponse {
                query,
                description,
                source,
            })
        }
        "reddit" => {
            let subreddit = body
                .filters
                .subreddit
                .clone()
                .unwrap_or_else(|| "MachineLearning".to_string());
            let description = format!("Reddit search in r/{subreddit} for '{}'", body.search_terms);
            HttpResponse::Ok().json(QueryBuilderResponse {
                query: subreddit,
                description,
                source,
            })
        }
        other => HttpResponse::BadRequest().json(ErrorResponse {
            error: format!("unsupported source: {other}"),
        }),
    }
}

pub async fn categories_handler(path: web::Path<String>) -> HttpResponse {
    let source = path.into_inner().to_lowercase();
    if source != "arxiv" {
        return HttpResponse::NotFound().json(ErrorResponse {
            error: format!("unknown source: {source}"),
        });
    }

    let groups: BTreeMap<&'static str, Vec<&'static str>> =
        QueryClassifier::<GenAiClient>::category_suggestions().into_iter().collect();
    HttpResponse::Ok().json(groups)
}

pub async fn health_handler() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({"status": "healthy"}))
}
