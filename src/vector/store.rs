// file: src/vector/store.rs
// description: vector store capability and the point shape written per chunk
// reference: https://qdrant.tech/documentation/concepts/points/

use crate::config::DistanceMetric;
use crate::error::Result;
use crate::pipeline::FileMetadata;
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointPayload {
    pub file_path: String,
    pub language: String,
    pub chunk: String,
    pub chunk_index: usize,
    pub line_count: usize,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VectorPoint {
    /// Fresh per point, unrelated to the File record id.
    pub id: Uuid,
    pub vector: Vec<f32>,
    pub payload: PointPayload,
}

impl VectorPoint {
    /// One point per embedded chunk of the file.
    pub fn from_metadata(metadata: &FileMetadata, file_path: &str) -> Vec<VectorPoint> {
        metadata
            .chunks
            .iter()
            .map(|chunk| VectorPoint {
                id: Uuid::new_v4(),
                vector: chunk.embedding.clone(),
                payload: PointPayload {
                    file_path: file_path.to_string(),
                    language: metadata.language.clone(),
                    chunk: chunk.text.clone(),
                    chunk_index: chunk.index,
                    line_count: metadata.line_count(),
                    word_count: metadata.word_count(),
                },
            })
            .collect()
    }
}

#[async_trait]
pub trait VectorStore: Send + Sync {
    async fn collection_exists(&self, name: &str) -> Result<bool>;

    async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
        distance: DistanceMetric,
    ) -> Result<()>;

    async fn upsert(&self, collection: &str, points: Vec<VectorPoint>, wait: bool) -> Result<()>;

    /// Succeeds when the store answers at all.
    async fn health_check(&self) -> Result<()>;
}
