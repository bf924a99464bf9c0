// file: src/pipeline/stage.rs
// description: the per-file processing capability and the statistics stage
// reference: https://docs.rs/async-trait

use crate::error::Result;
use crate::pipeline::metadata::{FileMetadata, FileStatistics};
use async_trait::async_trait;
use std::path::Path;

/// One unit of per-file work. Implementations read what earlier stages wrote
/// and add their own fields; an `Err` stops the remaining stages for that
/// file only.
#[async_trait]
pub trait PipelineStage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn process(&self, file_path: &Path, content: &str, metadata: &mut FileMetadata)
    -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StatisticsStage;

impl StatisticsStage {
    pub fn new() -> Self {
        Self
    }

    pub fn compute(content: &str) -> FileStatistics {
        let line_count = if content.is_empty() {
            0
        } else {
            content.split('\n').count()
        };

        FileStatistics {
            line_count,
            word_count: content.split_whitespace().count(),
        }
    }
}

#[async_trait]
impl PipelineStage for StatisticsStage {
    fn name(&self) -> &'static str {
        "statistics"
    }

    async fn process(
        &self,
        _file_path: &Path,
        content: &str,
        metadata: &mut FileMetadata,
    ) -> Result<()> {
        metadata.record_statistics(Self::compute(content));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_lines_and_words() {
        let stats = StatisticsStage::compute("def main():\n    print('hi')\n");
        assert_eq!(stats.line_count, 3);
        assert_eq!(stats.word_count, 3);
    }

    #[test]
    fn test_empty_content_is_zero() {
        let stats = StatisticsStage::compute("");
        assert_eq!(stats.line_count, 0);
        assert_eq!(stats.word_count, 0);
    }

    #[test]
    fn test_whitespace_runs_are_one_separator() {
        let stats = StatisticsStage::compute("a  \t b\n\nc");
        assert_eq!(stats.word_count, 3);
        assert_eq!(stats.line_count, 3);
    }

    #[tokio::test]
    async fn test_stage_writes_statistics() {
        let mut metadata = FileMetadata::new(Path::new("x.rs"), "rust");
        StatisticsStage::new()
            .process(Path::new("x.rs"), "fn main() {}", &mut metadata)
            .await
            .unwrap();

        assert_eq!(metadata.line_count(), 1);
        assert_eq!(metadata.word_count(), 3);
    }
}
