// file: src/pipeline/metadata.rs
// description: typed per-file record accumulated by pipeline stages
// reference: per-file pipeline data model

use crate::models::{CodeScores, ReportTask};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileStatistics {
    pub line_count: usize,
    pub word_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddedChunk {
    pub index: usize,
    pub text: String,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeReport {
    pub scores: CodeScores,
    pub tasks: Vec<ReportTask>,
    /// False when the model answered with the no-code marker.
    pub contains_code: bool,
}

impl CodeReport {
    pub fn no_code() -> Self {
        Self {
            scores: CodeScores::zero(),
            tasks: Vec::new(),
            contains_code: false,
        }
    }
}

/// Shared record for one file. Stages add or overwrite fields and never
/// clear what an earlier stage wrote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileMetadata {
    pub file_path: PathBuf,
    pub language: String,
    pub statistics: Option<FileStatistics>,
    pub chunks: Vec<EmbeddedChunk>,
    pub report: Option<CodeReport>,
}

impl FileMetadata {
    pub fn new(file_path: &Path, language: impl Into<String>) -> Self {
        Self {
            file_path: file_path.to_path_buf(),
            language: language.into(),
            statistics: None,
            chunks: Vec::new(),
            report: None,
        }
    }

    pub fn record_statistics(&mut self, statistics: FileStatistics) {
        self.statistics = Some(statistics);
    }

    pub fn push_chunk(&mut self, text: String, embedding: Vec<f32>) {
        let index = self.chunks.len();
        self.chunks.push(EmbeddedChunk {
            index,
            text,
            embedding,
        });
    }

    pub fn record_report(&mut self, report: CodeReport) {
        self.report = Some(report);
    }

    /// The most recently embedded chunk.
    pub fn last_chunk(&self) -> Option<&EmbeddedChunk> {
        self.chunks.last()
    }

    pub fn line_count(&self) -> usize {
        self.statistics.map(|s| s.line_count).unwrap_or(0)
    }

    pub fn word_count(&self) -> usize {
        self.statistics.map(|s| s.word_count).unwrap_or(0)
    }

    /// Tasks worth persisting: only reports that judged the file to be code.
    pub fn tasks(&self) -> &[ReportTask] {
        match &self.report {
            Some(report) if report.contains_code => &report.tasks,
            _ => &[],
        }
    }
}
