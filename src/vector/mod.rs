// file: src/vector/mod.rs
// description: vector store module exports
// reference: internal module structure

pub mod collection;
pub mod gateway;
pub mod qdrant;
pub mod store;

pub use collection::{MAX_COLLECTION_NAME_LENGTH, collection_name};
pub use gateway::VectorStoreGateway;
pub use qdrant::QdrantStore;
pub use store::{PointPayload, VectorPoint, VectorStore};
