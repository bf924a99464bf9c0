// file: src/vector/gateway.rs
// description: collection provisioning and batched upsert for one repository run
// reference: https://qdrant.tech/documentation/concepts/collections/

use crate::config::{DistanceMetric, VectorStoreConfig};
use crate::error::Result;
use crate::vector::collection;
use crate::vector::store::{VectorPoint, VectorStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct VectorStoreGateway {
    store: Arc<dyn VectorStore>,
    vector_size: u64,
    distance: DistanceMetric,
}

impl VectorStoreGateway {
    pub fn new(store: Arc<dyn VectorStore>, vector_size: u64, distance: DistanceMetric) -> Self {
        Self {
            store,
            vector_size,
            distance,
        }
    }

    pub fn from_config(store: Arc<dyn VectorStore>, config: &VectorStoreConfig) -> Self {
        Self::new(store, config.vector_size, config.distance)
    }

    pub fn collection_name(&self, repo_path: &Path) -> Result<String> {
        collection::collection_name(repo_path)
    }

    /// Creates the collection unless it already exists. Two runs racing on
    /// the same repository may both see it missing; the second create is
    /// reported as an error by the store.
    pub async fn ensure_collection(&self, name: &str) -> Result<()> {
        if self.store.collection_exists(name).await? {
            debug!("Collection {} already exists", name);
            return Ok(());
        }

        self.store
            .create_collection(name, self.vector_size, self.distance)
            .await?;
        info!("Created collection {}", name);
        Ok(())
    }

    /// Writes all points in a single durable call. Returns how many points
    /// were sent; an empty batch makes no call.
    pub async fn health_check(&self) -> Result<()> {
        self.store.health_check().await
    }

    pub async fn upsert(&self, name: &str, points: Vec<VectorPoint>) -> Result<usize> {
        if points.is_empty() {
            debug!("No points to upsert into {}", name);
            return Ok(0);
        }

        let count = points.len();
        self.store.upsert(name, points, true).await?;
        info!("Upserted {} points into {}", count, name);
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use crate::vector::store::PointPayload;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingStore {
        collections: Mutex<HashSet<String>>,
        creates: Mutex<Vec<(String, u64, DistanceMetric)>>,
        upserts: Mutex<Vec<(String, usize, bool)>>,
    }

    #[async_trait]
    impl VectorStore for RecordingStore {
        async fn collection_exists(&self, name: &str) -> Result<bool> {
            Ok(self.collections.lock().unwrap().contains(name))
        }

        async fn create_collection(
            &self,
            name: &str,
            vector_size: u64,
            distance: DistanceMetric,
        ) -> Result<()> {
            if !self.collections.lock().unwrap().insert(name.to_string()) {
                return Err(PipelineError::VectorStore("already exists".to_string()));
            }
            self.creates
                .lock()
                .unwrap()
                .push((name.to_string(), vector_size, distance));
            Ok(())
        }

        async fn upsert(&self, collection: &str, points: Vec<VectorPoint>, wait: bool) -> Result<()> {
            self.upserts
                .lock()
                .unwrap()
                .push((collection.to_string(), points.len(), wait));
            Ok(())
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    fn point() -> VectorPoint {
        VectorPoint {
            id: Uuid::new_v4(),
            vector: vec![1.0, 0.0],
            payload: PointPayload {
                file_path: "a.py".to_string(),
                language: "python".to_string(),
                chunk: "x = 1".to_string(),
                chunk_index: 0,
                line_count: 1,
                word_count: 3,
            },
        }
    }

    #[tokio::test]
    async fn test_collection_is_created_once() {
        let store = Arc::new(RecordingStore::default());
        let gateway = VectorStoreGateway::new(store.clone(), 1536, DistanceMetric::Cosine);

        gateway.ensure_collection("octo_app").await.unwrap();
        gateway.ensure_collection("octo_app").await.unwrap();

        let creates = store.creates.lock().unwrap();
        assert_eq!(creates.len(), 1);
        assert_eq!(creates[0], ("octo_app".to_string(), 1536, DistanceMetric::Cosine));
    }

    #[tokio::test]
    async fn test_upsert_is_one_durable_batch() {
        let store = Arc::new(RecordingStore::default());
        let gateway = VectorStoreGateway::new(store.clone(), 2, DistanceMetric::Cosine);

        let sent = gateway
            .upsert("octo_app", vec![point(), point(), point()])
            .await
            .unwrap();

        assert_eq!(sent, 3);
        assert_eq!(
            *store.upserts.lock().unwrap(),
            vec![("octo_app".to_string(), 3, true)]
        );
    }

    #[tokio::test]
    async fn test_empty_upsert_makes_no_call() {
        let store = Arc::new(RecordingStore::default());
        let gateway = VectorStoreGateway::new(store.clone(), 2, DistanceMetric::Cosine);

        assert_eq!(gateway.upsert("octo_app", Vec::new()).await.unwrap(), 0);
        assert!(store.upserts.lock().unwrap().is_empty());
    }

    #[test]
    fn test_collection_name_comes_from_storage_path() {
        let gateway = VectorStoreGateway::new(
            Arc::new(RecordingStore::default()),
            2,
            DistanceMetric::Cosine,
        );
        let name = gateway
            .collection_name(Path::new("./storage/repo_files/Octo_Hello-World"))
            .unwrap();
        assert_eq!(name, "octo_hello_world");
    }
}
