//! The composition root: `discover_topics` wires `QueryClassifier` ->
//! `ArticleFetcher` -> `EmbeddingCache` -> `TopicEngine` into the single
//! entry point every service binary calls.

use crate::article_fetcher::{ArticleFetcher, HttpFetch};
use crate::embedding_cache::{EmbeddingCache, VectorStore};
use crate::errors::CoreError;
use crate::llm::{EmbeddingProvider, TextCompletionClient};
use crate::models::{DiscoveryResult, Query, TopicParams};
use crate::query_classifier::QueryClassifier;
use crate::topic_engine::TopicEngine;
use std::sync::Arc;

pub struct Pipeline<C, H, S>
where
    C: TextCompletionClient + EmbeddingProvider + 'static,
    H: HttpFetch,
    S: VectorStore,
{
    classifier: QueryClassifier<C>,
    fetcher: ArticleFetcher<H>,
    cache: EmbeddingCache<S, C>,
    engine: TopicEngine<C>,
}

impl<C, H, S> Pipeline<C, H, S>
where
    C: TextCompletionClient + EmbeddingProvider + 'static,
    H: HttpFetch,
    S: VectorStore,
{
    pub fn new(llm: Arc<C>, http: Arc<H>, store: Arc<S>) -> Self {
        Self {
            classifier: QueryClassifier::new(Arc::clone(&llm)),
            fetcher: ArticleFetcher::new(http),
            cache: EmbeddingCache::new(store, Arc::clone(&llm)),
            engine: TopicEngine::new(llm),
        }
    }

    /// Classifies `query`, fetches the matching feed, embeds every article
    /// (cache-first), and clusters the result into topics. Validation
    /// failures and exhausted upstream retries surface as `CoreError`;
    /// everything else degrades internally per component.
    pub async fn discover_topics(
        &self,
        raw_query: &str,
        fetch_limit: usize,
        params: &TopicParams,
    ) -> Result<DiscoveryResult, CoreError> {
        let query = Query::new(raw_query).map_err(|e| CoreError::InvalidRequest(e.to_string()))?;

        let outcome = self.classifier.classify(query.as_str()).await;
        tracing::info!(
            source = outcome.selection.source_name(),
            confidence = outcome.confidence,
            "classified query"
        );

        let articles = self
            .fetcher
            .fetch(&outcome.selection, query.as_str(), fetch_limit)
            .await?;
        tracing::info!(count = articles.len(), "fetched articles");

        if articles.is_empty() {
            return Ok(DiscoveryResult {
                query: query.as_str().to_string(),
                topics: Vec::new(),
                total_articles_processed: 0,
            });
        }

        let ids: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();
        let texts: Vec<String> = articles.iter().map(|a| a.document_text()).collect();
        let (embeddings, cached_count) = self.cache.get_or_compute(&ids, &texts).await;
        tracing::info!(cached = cached_count, total = ids.len(), "resolved embeddings");

        Ok(self
            .engine
            .cluster(query.as_str(), articles, embeddings, params)
            .await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::article_fetcher::HttpFetch;
    use crate::embedding_cache::{CacheIoError, VectorStore};
    use crate::llm::LlmError;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Mutex as TokioMutex;

    struct FakeLlm;

    #[async_trait]
    impl TextCompletionClient for FakeLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            if prompt.contains("which single feed") {
                Ok("{\"source\":\"arxiv\",\"feed\":\"cs.CV\"}".to_string())
            } else {
                Ok("{\"label\":\"Topic\",\"description\":\"d\"}".to_string())
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for FakeLlm {
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, LlmError> {
            Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect())
        }
        fn dimension(&self) -> usize {
            2
        }
    }

    struct FakeHttp(String);

    #[async_trait]
    impl HttpFetch for FakeHttp {
        async fn get_text(&self, _url: &str) -> Result<String, crate::errors::FetchError> {
            Ok(self.0.clone())
        }
    }

    struct FakeStore {
        rows: TokioMutex<HashMap<String, Vec<f32>>>,
    }

    #[async_trait]
    impl VectorStore for FakeStore {
        async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Vec<f32>>, CacheIoError> {
            let rows = self.rows.lock().await;
            Ok(ids
                .iter()
                .filter_map(|id| rows.get(id).map(|v| (id.clone(), v.clone())))
                .collect())
        }

        async fn upsert_many(&self, items: &[(String, Vec<f32>)]) -> Result<(), CacheIoError> {
            let mut rows = self.rows.lock().await;
            for (id, v) in items {
                rows.insert(id.clone(), v.clone());
            }
            Ok(())
        }
    }

    fn feed_with(n: usize) -> String {
        let entries: String = (0..n)
            .map(|i| {
                format!(
                    "<entry><id>http://arxiv.org/abs/{i}</id><title>Paper {i}</title>\
                     <summary>About graph neural networks.</summary>\
                     <published>2024-01-0{}T00:00:00Z</published></entry>",
                    (i % 9) + 1
                )
            })
            .collect();
        format!(r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom">{entries}</feed>"#)
    }

    #[tokio::test]
    async fn empty_query_is_rejected_before_any_upstream_call() {
        let pipeline = Pipeline::new(
            Arc::new(FakeLlm),
            Arc::new(FakeHttp(feed_with(3))),
            Arc::new(FakeStore {
                rows: TokioMutex::new(HashMap::new()),
            }),
        );
        let err = pipeline
            .discover_topics("   ", 50, &TopicParams::default())
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::InvalidRequest("query is empty".to_string()));
    }

    #[tokio::test]
    async fn happy_path_produces_topics_from_fetched_articles() {
        let pipeline = Pipeline::new(
            Arc::new(FakeLlm),
            Arc::new(FakeHttp(feed_with(5))),
            Arc::new(FakeStore {
                rows: TokioMutex::new(HashMap::new()),
            }),
        );
        let params = TopicParams {
            min_cluster_size: 2,
            nr_topics: None,
            max_articles_per_topic: 40,
        };
        let result = pipeline
            .discover_topics("graph neural networks", 50, &params)
            .await
            .unwrap();
        assert_eq!(result.total_articles_processed, 5);
        assert!(!result.topics.is_empty());
    }

    #[tokio::test]
    async fn no_articles_yields_empty_topics_not_an_error() {
        let pipeline = Pipeline::new(
            Arc::new(FakeLlm),
            Arc::new(FakeHttp(
                r#"<?xml version="1.0"?><feed xmlns="http://www.w3.org/2005/Atom"></feed>"#.to_string(),
            )),
            Arc::new(FakeStore {
                rows: TokioMutex::new(HashMap::new()),
            }),
        );
        let result = pipeline
            .discover_topics("query", 50, &TopicParams::default())
            .await
            .unwrap();
        assert!(result.topics.is_empty());
        assert_eq!(result.total_articles_processed, 0);
    }
}
