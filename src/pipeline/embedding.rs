// file: src/pipeline/embedding.rs
// description: chunks file content and embeds every chunk
// reference: https://platform.openai.com/docs/guides/embeddings

use crate::error::Result;
use crate::llm::EmbeddingProvider;
use crate::pipeline::chunker::RecursiveTextSplitter;
use crate::pipeline::metadata::FileMetadata;
use crate::pipeline::stage::PipelineStage;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

pub struct EmbeddingStage {
    provider: Arc<dyn EmbeddingProvider>,
    splitter: RecursiveTextSplitter,
}

impl EmbeddingStage {
    pub fn new(provider: Arc<dyn EmbeddingProvider>, splitter: RecursiveTextSplitter) -> Self {
        Self { provider, splitter }
    }
}

#[async_trait]
impl PipelineStage for EmbeddingStage {
    fn name(&self) -> &'static str {
        "embedding"
    }

    async fn process(
        &self,
        file_path: &Path,
        content: &str,
        metadata: &mut FileMetadata,
    ) -> Result<()> {
        let chunks = self.splitter.split(content);
        debug!(
            file = %file_path.display(),
            chunks = chunks.len(),
            model = self.provider.model_name(),
            "Embedding file"
        );

        for chunk in chunks {
            let embedding = self.provider.embed(&chunk).await?;
            metadata.push_chunk(chunk, embedding);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingProvider {
        calls: AtomicUsize,
        fail_on: Option<usize>,
    }

    #[async_trait]
    impl EmbeddingProvider for CountingProvider {
        fn model_name(&self) -> &str {
            "counting"
        }

        fn dims(&self) -> usize {
            2
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_on == Some(n) {
                return Err(PipelineError::Embedding("rate limited".to_string()));
            }
            Ok(vec![text.len() as f32, n as f32])
        }
    }

    fn stage(fail_on: Option<usize>, chunk_size: usize) -> (EmbeddingStage, Arc<CountingProvider>) {
        let provider = Arc::new(CountingProvider {
            calls: AtomicUsize::new(0),
            fail_on,
        });
        let stage = EmbeddingStage::new(provider.clone(), RecursiveTextSplitter::new(chunk_size, 0));
        (stage, provider)
    }

    #[tokio::test]
    async fn test_every_chunk_is_kept() {
        let (stage, provider) = stage(None, 12);
        let mut metadata = FileMetadata::new(Path::new("a.py"), "python");

        stage
            .process(Path::new("a.py"), "first line\nsecond line\nthird line", &mut metadata)
            .await
            .unwrap();

        assert_eq!(metadata.chunks.len(), 3);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 3);
        assert_eq!(metadata.last_chunk().unwrap().text, "third line");
    }

    #[tokio::test]
    async fn test_empty_file_makes_no_calls() {
        let (stage, provider) = stage(None, 100);
        let mut metadata = FileMetadata::new(Path::new("a.py"), "python");

        stage.process(Path::new("a.py"), "", &mut metadata).await.unwrap();

        assert!(metadata.chunks.is_empty());
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_failed_chunk_fails_stage() {
        let (stage, _) = stage(Some(1), 12);
        let mut metadata = FileMetadata::new(Path::new("a.py"), "python");

        let result = stage
            .process(Path::new("a.py"), "first line\nsecond line\nthird line", &mut metadata)
            .await;

        assert!(matches!(result, Err(PipelineError::Embedding(_))));
        assert_eq!(metadata.chunks.len(), 1);
    }
}
