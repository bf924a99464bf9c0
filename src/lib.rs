// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns

//! Per-file code analysis for GitHub repositories.
//!
//! A setup request clones a repository branch, classifies every file by
//! extension and runs the known-language files through an ordered list of
//! stages: line/word statistics, chunked embeddings and an LLM quality report.
//! Embeddings land in a Qdrant collection named after the checkout; files,
//! scores and improvement tasks land in SQLite.

pub mod api;
pub mod config;
pub mod database;
pub mod error;
pub mod llm;
pub mod models;
pub mod pipeline;
pub mod repository;
pub mod service;
pub mod utils;
pub mod vector;

pub use config::{Config, DatabaseConfig, DistanceMetric, PipelineConfig, VectorStoreConfig};
pub use database::{DatabaseClient, RecordCounts, RecordStore, SchemaManager};
pub use error::{ErrorKind, PipelineError, Result};
pub use llm::{ChatModel, EmbeddingProvider, OpenAiChatClient, OpenAiEmbeddingClient};
pub use models::{SetupRepository, TaskCategory, TaskPriority};
pub use pipeline::{
    FileMetadata, FileProcessingPipeline, PipelineStage, PipelineStats, ProcessingReport,
    RepositoryProcessor,
};
pub use repository::{FileClassifier, FileScanner, GitRepositoryExtractor};
pub use service::{RepositoryService, SetupResponse};
pub use utils::{RunTimer, Validator};
pub use vector::{QdrantStore, VectorStore, VectorStoreGateway};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(FileClassifier::builtin().classify(std::path::Path::new("x.py")), "python");
    }
}
