// file: src/api/state.rs
// description: shared state handed to every route handler
// reference: https://docs.rs/axum/latest/axum/extract/struct.State.html

use crate::database::DatabaseClient;
use crate::service::RepositoryService;
use crate::vector::VectorStoreGateway;
use std::sync::Arc;
use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<RepositoryService>,
    pub database: DatabaseClient,
    pub vectors: VectorStoreGateway,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        service: RepositoryService,
        database: DatabaseClient,
        vectors: VectorStoreGateway,
    ) -> Self {
        Self {
            service: Arc::new(service),
            database,
            vectors,
            started_at: Instant::now(),
        }
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
