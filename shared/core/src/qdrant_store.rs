//! Qdrant-backed `VectorStore`. The read/write shape mirrors the embedding
//! service's own collection access; `EmbeddingCache` only needs get/upsert
//! keyed by the document's external id, so this wraps just those two calls.

use crate::embedding_cache::{CacheIoError, VectorStore};
use async_trait::async_trait;
use qdrant_client::prelude::*;
use qdrant_client::qdrant::{
    vectors_config::Config, with_payload_selector::SelectorOptions, CreateCollection, Distance,
    PointStruct, VectorParams, VectorsConfig, WithPayloadSelector,
};
use std::collections::HashMap;

pub struct QdrantVectorStore {
    client: QdrantClient,
    collection: String,
}

impl QdrantVectorStore {
    pub fn new(client: QdrantClient, collection: &str) -> Self {
        Self {
            client,
            collection: collection.to_string(),
        }
    }

    /// Creates the collection if absent. Call once at startup, after the
    /// embedding provider's dimension is known.
    pub async fn ensure_collection(&self, dimension: usize) -> Result<(), CacheIoError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| CacheIoError::Io(e.to_string()))?
            .collections;

        if collections.iter().any(|c| c.name == self.collection) {
            return Ok(());
        }

        let request = CreateCollection {
            collection_name: self.collection.clone(),
            vectors_config: Some(VectorsConfig {
                config: Some(Config::Params(VectorParams {
                    size: dimension as u64,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                })),
            }),
            ..Default::default()
        };

        self.client
            .create_collection(&request)
            .await
            .map_err(|e| CacheIoError::Io(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn get_many(&self, ids: &[String]) -> Result<HashMap<String, Vec<f32>>, CacheIoError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let point_ids: Vec<PointId> = ids.iter().cloned().map(PointId::from).collect();
        let response = self
            .client
            .get_points(
                &self.collection,
                None,
                &point_ids,
                Some(WithPayloadSelector {
                    selector_options: Some(SelectorOptions::Enable(false)),
                }),
                Some(true.into()),
                None,
            )
            .await
            .map_err(|e| CacheIoError::Io(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(retrieved_point_to_pair)
            .collect())
    }

    async fn upsert_many(&self, items: &[(String, Vec<f32>)]) -> Result<(), CacheIoError> {
        if items.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = items
            .iter()
            .map(|(id, vector)| PointStruct::new(id.clone(), vector.clone(), Default::default()))
            .collect();

        self.client
            .upsert_points_blocking(&self.collection, None, points, None)
            .await
            .map_err(|e| CacheIoError::Io(e.to_string()))?;
        Ok(())
    }
}

fn retrieved_point_to_pair(point: qdrant_client::qdrant::RetrievedPoint) -> Option<(String, Vec<f32>)> {
    let id = match point.id?.point_id_options? {
        qdrant_client::qdrant::point_id::PointIdOptions::Uuid(u) => u,
        qdrant_client::qdrant::point_id::PointIdOptions::Num(n) => n.to_string(),
    };
    let vector = point.vectors?.vectors_options.and_then(|v| match v {
        qdrant_client::qdrant::vectors::VectorsOptions::Vector(v) => Some(v.data),
        qdrant_client::qdrant::vectors::VectorsOptions::Vectors(_) => None,
    })?;
    Some((id, vector))
}
