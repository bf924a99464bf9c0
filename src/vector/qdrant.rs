// file: src/vector/qdrant.rs
// description: qdrant-backed vector store
// reference: https://docs.rs/qdrant-client

use crate::config::{DistanceMetric, VectorStoreConfig};
use crate::error::{PipelineError, Result};
use crate::vector::store::{VectorPoint, VectorStore};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    self, CreateCollection, Distance, PointStruct, UpsertPoints, VectorParams,
};
use qdrant_client::{Payload, Qdrant};
use tracing::{debug, info};

pub struct QdrantStore {
    client: Qdrant,
}

impl QdrantStore {
    pub fn new(config: &VectorStoreConfig) -> Result<Self> {
        let mut builder = Qdrant::from_url(&config.url);
        if let Some(key) = &config.api_key {
            builder = builder.api_key(key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| PipelineError::VectorStore(format!("Failed to build client: {}", e)))?;

        Ok(Self { client })
    }
}

fn to_distance(metric: DistanceMetric) -> Distance {
    match metric {
        DistanceMetric::Cosine => Distance::Cosine,
        DistanceMetric::Euclid => Distance::Euclid,
        DistanceMetric::Dot => Distance::Dot,
        DistanceMetric::Manhattan => Distance::Manhattan,
    }
}

fn to_point_struct(point: VectorPoint) -> PointStruct {
    let mut payload = Payload::new();
    payload.insert("file_path", point.payload.file_path);
    payload.insert("language", point.payload.language);
    payload.insert("chunk", point.payload.chunk);
    payload.insert("chunk_index", point.payload.chunk_index as i64);
    payload.insert("line_count", point.payload.line_count as i64);
    payload.insert("word_count", point.payload.word_count as i64);

    PointStruct::new(point.id.to_string(), point.vector, payload)
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn collection_exists(&self, name: &str) -> Result<bool> {
        self.client
            .collection_exists(name)
            .await
            .map_err(|e| PipelineError::VectorStore(format!("collection_exists({}): {}", name, e)))
    }

    async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
        distance: DistanceMetric,
    ) -> Result<()> {
        info!("Creating collection {} ({} dims, {:?})", name, vector_size, distance);

        self.client
            .create_collection(CreateCollection {
                collection_name: name.to_string(),
                vectors_config: Some(qdrant::VectorsConfig {
                    config: Some(qdrant::vectors_config::Config::Params(VectorParams {
                        size: vector_size,
                        distance: to_distance(distance) as i32,
                        ..Default::default()
                    })),
                }),
                ..Default::default()
            })
            .await
            .map_err(|e| {
                PipelineError::VectorStore(format!("create_collection({}): {}", name, e))
            })?;

        Ok(())
    }

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>, wait: bool) -> Result<()> {
        let count = points.len();
        let points: Vec<PointStruct> = points.into_iter().map(to_point_struct).collect();

        self.client
            .upsert_points(UpsertPoints {
                collection_name: collection.to_string(),
                wait: Some(wait),
                points,
                ..Default::default()
            })
            .await
            .map_err(|e| PipelineError::VectorStore(format!("upsert({}): {}", collection, e)))?;

        debug!("Upserted {} points into {}", count, collection);
        Ok(())
    }

    async fn health_check(&self) -> Result<()> {
        self.client
            .health_check()
            .await
            .map_err(|e| PipelineError::VectorStore(format!("health_check: {}", e)))?;
        debug!("Qdrant is reachable");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::store::PointPayload;
    use uuid::Uuid;

    #[test]
    fn test_distance_mapping() {
        assert_eq!(to_distance(DistanceMetric::Cosine), Distance::Cosine);
        assert_eq!(to_distance(DistanceMetric::Dot), Distance::Dot);
    }

    #[test]
    fn test_point_struct_carries_payload() {
        let id = Uuid::new_v4();
        let point = to_point_struct(VectorPoint {
            id,
            vector: vec![0.5, 0.25],
            payload: PointPayload {
                file_path: "src/app.py".to_string(),
                language: "python".to_string(),
                chunk: "print('hi')".to_string(),
                chunk_index: 0,
                line_count: 1,
                word_count: 1,
            },
        });

        assert_eq!(point.payload.len(), 6);
        assert!(point.payload.contains_key("language"));
        assert!(point.id.is_some());
    }
}
