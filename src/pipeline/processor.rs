// file: src/pipeline/processor.rs
// description: classifies one file and runs the configured stages over it
// reference: per-file stage execution

use crate::error::{PipelineError, Result};
use crate::pipeline::metadata::FileMetadata;
use crate::pipeline::stage::PipelineStage;
use crate::repository::FileClassifier;
use std::path::Path;
use tracing::{debug, warn};

pub struct FileProcessingPipeline {
    classifier: FileClassifier,
    stages: Vec<Box<dyn PipelineStage>>,
}

impl FileProcessingPipeline {
    pub fn new(classifier: FileClassifier, stages: Vec<Box<dyn PipelineStage>>) -> Self {
        Self { classifier, stages }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Returns `Ok(None)` for files whose language is unknown, `Err` when the
    /// file cannot be read or a stage fails.
    pub async fn process_file(&self, file_path: &Path) -> Result<Option<FileMetadata>> {
        if !self.classifier.is_known(file_path) {
            debug!(file = %file_path.display(), "Skipping file with unknown language");
            return Ok(None);
        }

        let language = self.classifier.classify(file_path).to_string();
        let content = read_lossy(file_path).await?;
        let mut metadata = FileMetadata::new(file_path, language);

        for stage in &self.stages {
            if let Err(e) = stage.process(file_path, &content, &mut metadata).await {
                warn!(
                    file = %file_path.display(),
                    stage = stage.name(),
                    "Stage failed: {}",
                    e
                );
                return Err(e);
            }
        }

        Ok(Some(metadata))
    }
}

async fn read_lossy(path: &Path) -> Result<String> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
