// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod classifier;
pub mod extractor;
pub mod scanner;

pub use classifier::{FileClassifier, LanguageTable, UNKNOWN_LANGUAGE};
pub use extractor::GitRepositoryExtractor;
pub use scanner::{FileScanner, ScanResult, ScannedFile};
