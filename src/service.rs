// file: src/service.rs
// description: setup request handling, validate then clone then process
// reference: repository setup workflow

use crate::error::{ErrorKind, PipelineError};
use crate::models::SetupRepository;
use crate::pipeline::{PipelineStats, RepositoryProcessor};
use crate::repository::GitRepositoryExtractor;
use crate::utils::Validator;
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const SETUP_SUCCESS: &str = "Repository downloaded and extracted successfully!";
pub const EXTRACTION_FAILED: &str = "Failed to download and extract repository";
pub const PROCESSING_FAILED: &str = "Failed to process repository";
pub const SETUP_FAILED: &str = "Failed to setup repository";

/// Outcome of a setup request. Only plain strings are serialized; error
/// details stay in the logs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetupResponse {
    #[serde(skip)]
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<PipelineStats>,
}

impl SetupResponse {
    fn success(stats: PipelineStats) -> Self {
        Self {
            status: 200,
            message: SETUP_SUCCESS.to_string(),
            stats: Some(stats),
        }
    }

    fn failure(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            stats: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == 200
    }
}

pub struct RepositoryService {
    extractor: GitRepositoryExtractor,
    processor: Arc<RepositoryProcessor>,
}

impl RepositoryService {
    pub fn new(extractor: GitRepositoryExtractor, processor: Arc<RepositoryProcessor>) -> Self {
        Self {
            extractor,
            processor,
        }
    }

    pub async fn setup(&self, request: &SetupRepository) -> SetupResponse {
        if let Err(e) = Validator::validate_setup_request(request) {
            warn!("Rejected setup request {:?}: {}", request, e);
            return SetupResponse::failure(400, e.to_string());
        }

        let repo_path = match self.extractor.extract(request).await {
            Ok(path) => path,
            Err(e) => {
                error!(
                    "Extraction failed for {}/{}@{}: {}",
                    request.owner, request.repo, request.branch, e
                );
                return SetupResponse::failure(400, EXTRACTION_FAILED);
            }
        };

        match self.processor.process(&repo_path).await {
            Ok(report) => {
                info!(
                    "Repository {} ready at {} ({})",
                    report.repository.name,
                    repo_path.display(),
                    report.stats.summary_line()
                );
                SetupResponse::success(report.stats)
            }
            Err(e) => {
                error!("Processing failed for {}: {}", repo_path.display(), e);
                processing_failure(&e)
            }
        }
    }
}

fn processing_failure(err: &PipelineError) -> SetupResponse {
    match err.kind() {
        ErrorKind::Validation | ErrorKind::Extraction | ErrorKind::Collection => {
            SetupResponse::failure(400, PROCESSING_FAILED)
        }
        _ => SetupResponse::failure(500, SETUP_FAILED),
    }
}
