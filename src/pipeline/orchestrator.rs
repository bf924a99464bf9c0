// file: src/pipeline/orchestrator.rs
// description: repository-level fan-out over files, then vector upsert and record persistence
// reference: https://docs.rs/futures/latest/futures/stream/trait.StreamExt.html#method.buffered

use crate::config::{Config, PipelineConfig};
use crate::database::RecordStore;
use crate::error::{PipelineError, Result};
use crate::llm::{ChatModel, EmbeddingProvider};
use crate::models::{FileRecord, FileScoreRecord, Repository, TaskRecord};
use crate::pipeline::chunker::RecursiveTextSplitter;
use crate::pipeline::embedding::EmbeddingStage;
use crate::pipeline::metadata::FileMetadata;
use crate::pipeline::processor::FileProcessingPipeline;
use crate::pipeline::progress::{PipelineStats, ProgressTracker};
use crate::pipeline::report::ReportStage;
use crate::pipeline::stage::{PipelineStage, StatisticsStage};
use crate::repository::{FileClassifier, FileScanner, ScanResult, ScannedFile};
use crate::utils::RunTimer;
use crate::vector::{VectorPoint, VectorStoreGateway};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ProcessingReport {
    pub repository: Repository,
    pub collection: String,
    pub stats: PipelineStats,
}

/// A file that made it through every stage.
#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub relative_path: String,
    pub metadata: FileMetadata,
}

pub struct RepositoryProcessor {
    pipeline: Arc<FileProcessingPipeline>,
    scanner: FileScanner,
    gateway: VectorStoreGateway,
    records: RecordStore,
    max_concurrent_files: usize,
    show_progress: bool,
    color: bool,
}

impl RepositoryProcessor {
    pub fn new(
        pipeline: FileProcessingPipeline,
        gateway: VectorStoreGateway,
        records: RecordStore,
        config: &PipelineConfig,
    ) -> Self {
        debug!("File pipeline stages: {}", pipeline.stage_names().join(" -> "));
        Self {
            pipeline: Arc::new(pipeline),
            scanner: FileScanner::new(config),
            gateway,
            records,
            max_concurrent_files: config.max_concurrent_files.max(1),
            show_progress: config.show_progress,
            color: true,
        }
    }

    /// Whether the progress bar is drawn with ANSI colors.
    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    /// Builds the standard statistics, embedding, report pipeline.
    pub fn standard_pipeline(
        config: &Config,
        embedder: Arc<dyn EmbeddingProvider>,
        chat: Arc<dyn ChatModel>,
    ) -> Result<FileProcessingPipeline> {
        let classifier = FileClassifier::from_optional_path(config.pipeline.language_map.as_deref())?;
        let splitter =
            RecursiveTextSplitter::new(config.pipeline.chunk_size, config.pipeline.chunk_overlap);

        let stages: Vec<Box<dyn PipelineStage>> = vec![
            Box::new(StatisticsStage::new()),
            Box::new(EmbeddingStage::new(embedder, splitter)),
            Box::new(ReportStage::new(chat)),
        ];

        Ok(FileProcessingPipeline::new(classifier, stages))
    }

    pub async fn process(&self, repo_root: &Path) -> Result<ProcessingReport> {
        if !repo_root.is_dir() {
            return Err(PipelineError::RepositoryNotFound(repo_root.to_path_buf()));
        }

        let collection = self.gateway.collection_name(repo_root)?;
        let mut timer = RunTimer::start(&collection);

        self.gateway.ensure_collection(&collection).await?;

        let repository = Repository::from_storage_path(repo_root);
        self.records.insert_repository(&repository).await?;
        info!(
            "Processing repository {} ({}) into collection {}",
            repository.name, repository.id, collection
        );
        timer.phase_done("setup");

        let scan = self.scan(repo_root).await?;
        let discovered = scan.files.len() + scan.skipped;
        timer.phase_done("scan");
        let progress = Arc::new(if self.show_progress {
            ProgressTracker::with_color(scan.files.len(), self.color)
        } else {
            ProgressTracker::hidden(scan.files.len())
        });

        let outcomes = self.process_files(scan.files, progress.clone()).await;
        timer.phase_done("files");

        let mut stats = progress.get_stats();
        progress.finish();
        stats.files_discovered = discovered;
        stats.files_skipped += scan.skipped;

        self.upsert_points(&collection, &outcomes, &mut stats).await;
        timer.phase_done("upsert");
        self.persist_outcomes(&repository, &outcomes, &mut stats).await;
        timer.phase_done("persist");

        timer.finish(stats.files_processed);
        log_final_stats(&stats);

        Ok(ProcessingReport {
            repository,
            collection,
            stats,
        })
    }

    async fn scan(&self, repo_root: &Path) -> Result<ScanResult> {
        let scanner = self.scanner.clone();
        let root = repo_root.to_path_buf();

        tokio::task::spawn_blocking(move || scanner.scan_directory(&root))
            .await
            .map_err(|e| PipelineError::Io(std::io::Error::other(format!("File scanning task failed: {}", e))))?
    }

    /// Runs the pipeline over every file with at most `max_concurrent_files`
    /// in flight. Each file gets its own task so a panic stays with that file.
    pub async fn process_files(
        &self,
        files: Vec<ScannedFile>,
        progress: Arc<ProgressTracker>,
    ) -> Vec<FileOutcome> {
        let tasks = files.into_iter().map(|file| {
            let pipeline = self.pipeline.clone();
            let progress = progress.clone();

            async move {
                let path = file.path.clone();
                let handle = tokio::spawn(async move { pipeline.process_file(&path).await });

                match handle.await {
                    Ok(Ok(Some(metadata))) => {
                        progress.inc_files_processed();
                        progress.add_bytes_processed(file.size);
                        Some(FileOutcome {
                            relative_path: file.relative_path,
                            metadata,
                        })
                    }
                    Ok(Ok(None)) => {
                        progress.inc_files_skipped();
                        None
                    }
                    Ok(Err(e)) => {
                        progress.inc_files_failed();
                        warn!("Failed to process file {}: {}", file.relative_path, e);
                        None
                    }
                    Err(e) => {
                        progress.inc_files_failed();
                        error!("Processing task for {} panicked: {}", file.relative_path, e);
                        None
                    }
                }
            }
        });

        stream::iter(tasks)
            .buffered(self.max_concurrent_files)
            .filter_map(|outcome| async move { outcome })
            .collect()
            .await
    }

    async fn upsert_points(
        &self,
        collection: &str,
        outcomes: &[FileOutcome],
        stats: &mut PipelineStats,
    ) {
        let points: Vec<VectorPoint> = outcomes
            .iter()
            .flat_map(|o| VectorPoint::from_metadata(&o.metadata, &o.relative_path))
            .collect();

        match self.gateway.upsert(collection, points).await {
            Ok(count) => stats.points_upserted = count,
            Err(e) => {
                error!("Failed to upsert points into {}: {}", collection, e);
                stats.upsert_failed = true;
            }
        }
    }

    /// Each row is its own statement; a failed row is logged and counted
    /// without touching rows already written.
    async fn persist_outcomes(
        &self,
        repository: &Repository,
        outcomes: &[FileOutcome],
        stats: &mut PipelineStats,
    ) {
        for outcome in outcomes {
            let file = FileRecord::new(outcome.relative_path.clone(), repository.id);
            if let Err(e) = self.records.insert_file(&file).await {
                error!("Failed to persist file {}: {}", outcome.relative_path, e);
                stats.persistence_failures += 1;
                continue;
            }
            stats.files_persisted += 1;

            if let Some(report) = &outcome.metadata.report {
                for (kind, score) in report.scores.iter() {
                    let record = FileScoreRecord::new(file.id, kind, score);
                    match self.records.insert_score(&record).await {
                        Ok(()) => stats.scores_persisted += 1,
                        Err(e) => {
                            error!(
                                "Failed to persist {} score for {}: {}",
                                kind, outcome.relative_path, e
                            );
                            stats.persistence_failures += 1;
                        }
                    }
                }
            }

            for task in outcome.metadata.tasks() {
                let record = TaskRecord::from_report(task, file.id);
                match self.records.insert_task(&record).await {
                    Ok(()) => stats.tasks_persisted += 1,
                    Err(e) => {
                        error!(
                            "Failed to persist task '{}' for {}: {}",
                            task.title, outcome.relative_path, e
                        );
                        stats.persistence_failures += 1;
                    }
                }
            }
        }
    }
}

fn log_final_stats(stats: &PipelineStats) {
    info!("=== Repository Processing Summary ===");
    info!("Duration: {} seconds", stats.duration_secs);
    info!("Files discovered: {}", stats.files_discovered);
    info!("Files processed: {}", stats.files_processed);
    info!("Files skipped: {}", stats.files_skipped);
    info!("Files failed: {}", stats.files_failed);
    info!("Success rate: {:.2}%", stats.success_rate());
    info!("Points upserted: {}", stats.points_upserted);
    info!(
        "Rows persisted: {} files, {} scores, {} tasks ({} failures)",
        stats.files_persisted, stats.scores_persisted, stats.tasks_persisted, stats.persistence_failures
    );
    info!(
        "Throughput: {:.2} files/sec, {:.2} MB/sec",
        stats.files_per_second(),
        stats.bytes_per_second() / 1_048_576.0
    );
    info!("=====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DistanceMetric;
    use crate::vector::VectorStore;
    use async_trait::async_trait;
    use sqlx::SqlitePool;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingStore {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl VectorStore for CountingStore {
        async fn collection_exists(&self, _name: &str) -> Result<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(true)
        }

        async fn create_collection(
            &self,
            _name: &str,
            _vector_size: u64,
            _distance: DistanceMetric,
        ) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn upsert(&self, _collection: &str, _points: Vec<VectorPoint>, _wait: bool) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn health_check(&self) -> Result<()> {
            Ok(())
        }
    }

    /// Panics on any file named `boom.py`.
    struct PanickingStage;

    #[async_trait]
    impl PipelineStage for PanickingStage {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn process(
            &self,
            file_path: &Path,
            _content: &str,
            _metadata: &mut FileMetadata,
        ) -> Result<()> {
            if file_path.ends_with("boom.py") {
                panic!("stage blew up on {}", file_path.display());
            }
            Ok(())
        }
    }

    fn processor(store: Arc<CountingStore>) -> RepositoryProcessor {
        processor_with_stages(store, vec![Box::new(StatisticsStage::new())])
    }

    fn processor_with_stages(
        store: Arc<CountingStore>,
        stages: Vec<Box<dyn PipelineStage>>,
    ) -> RepositoryProcessor {
        let mut config = Config::default_config();
        config.pipeline.show_progress = false;
        config.pipeline.max_concurrent_files = 3;

        let pipeline = FileProcessingPipeline::new(FileClassifier::builtin(), stages);
        let gateway = VectorStoreGateway::from_config(store, &config.vector_store);
        let pool = SqlitePool::connect_lazy("sqlite::memory:").unwrap();

        RepositoryProcessor::new(pipeline, gateway, RecordStore::new(pool), &config.pipeline)
    }

    #[tokio::test]
    async fn test_concurrency_bound_comes_from_config() {
        let processor = processor(Arc::new(CountingStore::default()));
        assert_eq!(processor.max_concurrent_files, 3);
        assert!(!processor.show_progress);
    }

    #[tokio::test]
    async fn test_color_flag_is_carried() {
        let store = Arc::new(CountingStore::default());
        assert!(processor(store.clone()).color);
        assert!(!processor(store).with_color(false).color);
    }

    #[tokio::test]
    async fn test_panicking_stage_fails_only_its_file() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("boom.py"), "x = 1\n").unwrap();
        std::fs::write(temp.path().join("calm.py"), "y = 2\n").unwrap();

        let processor = processor_with_stages(
            Arc::new(CountingStore::default()),
            vec![Box::new(StatisticsStage::new()), Box::new(PanickingStage)],
        );
        let scan = processor.scan(temp.path()).await.unwrap();
        let progress = Arc::new(ProgressTracker::hidden(scan.files.len()));

        let outcomes = processor.process_files(scan.files, progress.clone()).await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].relative_path, "calm.py");
        let stats = progress.get_stats();
        assert_eq!(stats.files_failed, 1);
        assert_eq!(stats.files_processed, 1);
    }

    #[tokio::test]
    async fn test_missing_root_touches_nothing() {
        let store = Arc::new(CountingStore::default());
        let processor = processor(store.clone());

        let result = processor.process(Path::new("/definitely/not/here")).await;

        assert!(matches!(result, Err(PipelineError::RepositoryNotFound(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_process_files_keeps_only_known_languages() {
        let temp = tempfile::TempDir::new().unwrap();
        std::fs::write(temp.path().join("a.py"), "x = 1\n").unwrap();
        std::fs::write(temp.path().join("b.rs"), "fn main() {}\n").unwrap();
        std::fs::write(temp.path().join("notes.zzz"), "plain").unwrap();

        let processor = processor(Arc::new(CountingStore::default()));
        let scan = processor.scan(temp.path()).await.unwrap();
        let progress = Arc::new(ProgressTracker::hidden(scan.files.len()));

        let outcomes = processor.process_files(scan.files, progress.clone()).await;

        let mut languages: Vec<_> = outcomes.iter().map(|o| o.metadata.language.as_str()).collect();
        languages.sort();
        assert_eq!(languages, vec!["python", "rust"]);
        assert_eq!(progress.get_stats().files_skipped, 1);
    }
}
