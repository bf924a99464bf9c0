// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod repository;
pub mod request;
pub mod score;
pub mod task;

pub use repository::{FileRecord, Repository};
pub use request::SetupRepository;
pub use score::{CodeScores, FileScoreRecord, Score, ScoreKind};
pub use task::{ReportTask, TaskCategory, TaskPriority, TaskRecord};
