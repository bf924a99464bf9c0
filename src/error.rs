// file: src/error.rs
// description: Custom error types, failure taxonomy and result type aliases
// reference: https://docs.rs/thiserror

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Repository extraction failed: {0}")]
    Extraction(String),

    #[error("Repository path does not exist: {}", .0.display())]
    RepositoryNotFound(PathBuf),

    #[error("Collection name '{0}' is invalid. Must be between 1 and 256 characters.")]
    InvalidCollectionName(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Embedding API error: {0}")]
    Embedding(String),

    #[error("Chat completion API error: {0}")]
    Llm(String),

    #[error("Malformed code report: {0}")]
    ReportParse(String),

    #[error("File operation failed for {path}: {source}")]
    FileOperation {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Where a failure sits in the processing hierarchy, which decides whether it
/// is isolated to one file or aborts the whole request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Extraction,
    Collection,
    PerFile,
    Persistence,
    Internal,
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Validation(_) => ErrorKind::Validation,
            PipelineError::Extraction(_) | PipelineError::RepositoryNotFound(_) => {
                ErrorKind::Extraction
            }
            PipelineError::InvalidCollectionName(_) | PipelineError::VectorStore(_) => {
                ErrorKind::Collection
            }
            PipelineError::Embedding(_)
            | PipelineError::Llm(_)
            | PipelineError::ReportParse(_)
            | PipelineError::FileOperation { .. } => ErrorKind::PerFile,
            PipelineError::Database(_) => ErrorKind::Persistence,
            PipelineError::Config(_) | PipelineError::Io(_) | PipelineError::Serialization(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// HTTP-style status reported to the caller of a setup request.
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::Validation | ErrorKind::Extraction | ErrorKind::Collection => 400,
            _ => 500,
        }
    }
}
