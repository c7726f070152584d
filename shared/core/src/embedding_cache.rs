//! Read-through/write-back cache for document embeddings over a vector
//! store keyed by external id. Guarantees at-most-once embedding generation
//! per id per batch and preserves input ordering regardless of cache-hit
//! pattern.

use crate::llm::EmbeddingProvider;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheIoError {
    #[error("vector store io error: {0}")]
    Io(String),
}

/// The vector store's read/write contract. A real implementation wraps
/// `qdrant-client`; tests substitute an in-memory map.
#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Vec<f32>>, CacheIoError>;
    async fn upsert_many(&self, items: &[(String, Vec<f32>)]) -> Result<(), CacheIoError>;
}

pub struct EmbeddingCache<S: VectorStore, P: EmbeddingProvider> {
    store: Arc<S>,
    provider: Arc<P>,
}

impl<S: VectorStore, P: EmbeddingProvider> EmbeddingCache<S, P> {
    pub fn new(store: Arc<S>, provider: Arc<P>) -> Self {
        Self { store, provider }
    }

    /// `(vectors aligned with input, cachedCount)`. `vectors[i]` is absent
    /// iff generation failed for that index.
    pub async fn get_or_compute(
        &self,
        ids: &[String],
        texts: &[String],
    ) -> (Vec<Option<Vec<f32>>>, usize) {
        debug_assert_eq!(ids.len(), texts.len());

        let expected_dim = self.provider.dimension();
        let cached_map = match self.store.get_many(ids).await {
            Ok(map) => map
                .into_iter()
                .filter(|(_, v)| v.len() == expected_dim)
                .collect::<HashMap<_, _>>(),
            Err(e) => {
                tracing::warn!(error = %e, "vector store read failed, treating as all-miss");
                HashMap::new()
            }
        };

        let cached_count = ids.iter().filter(|id| cached_map.contains_key(*id)).count();

        // Positions needing generation, deduped by id so a repeated id in
        // the input is only ever sent to the provider once.
        let mut missing_ids_order: Vec<String> = Vec::new();
        let mut missing_texts: Vec<String> = Vec::new();
        let mut first_index_of: HashMap<&str, usize> = HashMap::new();

        for (i, id) in ids.iter().enumerate() {
            if cached_map.contains_key(id) {
                continue;
            }
            if !first_index_of.contains_key(id.as_str()) {
                first_index_of.insert(id.as_str(), missing_ids_order.len());
                missing_ids_order.push(id.clone());
                missing_texts.push(texts[i].clone());
            }
        }

        let mut generated: HashMap<String, Vec<f32>> = HashMap::new();
        if !missing_texts.is_empty() {
            match self.provider.embed_batch(&missing_texts).await {
                Ok(vectors) => {
                    for (id, vector) in missing_ids_order.iter().zip(vectors.into_iter()) {
                        generated.insert(id.clone(), vector);
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "embedding provider call failed for {} texts", missing_texts.len());
                }
            }
        }

        if !generated.is_empty() {
            let upserts: Vec<(String, Vec<f32>)> =
                generated.iter().map(|(id, v)| (id.clone(), v.clone())).collect();
            if let Err(e) = self.store.upsert_many(&upserts).await {
                tracing::warn!(error = %e, "vector store upsert failed, returning vectors without persisting");
            }
        }

        let vectors: Vec<Option<Vec<f32>>> = ids
            .iter()
            .map(|id| cached_map.get(id).or_else(|| generated.get(id)).cloned())
            .collect();

        (vectors, cached_count)
    }

    /// `(vectors, foundCount)`, absent for misses. No generation occurs.
    pub async fn get_by_ids(&self, ids: &[String]) -> (Vec<Option<Vec<f32>>>, usize) {
        let cached_map = match self.store.get_many(ids).await {
            Ok(map) => map,
            Err(e) => {
                tracing::warn!(error = %e, "vector store read failed, treating as all-miss");
                HashMap::new()
            }
        };
        let found_count = ids.iter().filter(|id| cached_map.contains_key(*id)).count();
        let vectors = ids.iter().map(|id| cached_map.get(id).cloned()).collect();
        (vectors, found_count)
    }
}
