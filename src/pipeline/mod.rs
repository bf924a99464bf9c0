// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: pipeline orchestration

pub mod chunker;
pub mod embedding;
pub mod metadata;
mod orchestrator;
mod processor;
mod progress;
pub mod report;
pub mod stage;

pub use chunker::RecursiveTextSplitter;
pub use embedding::EmbeddingStage;
pub use metadata::{CodeReport, EmbeddedChunk, FileMetadata, FileStatistics};
pub use orchestrator::{FileOutcome, ProcessingReport, RepositoryProcessor};
pub use processor::FileProcessingPipeline;
pub use progress::{PipelineStats, ProgressTracker};
pub use report::ReportStage;
pub use stage::{PipelineStage, StatisticsStage};
