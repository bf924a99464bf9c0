// file: src/repository/extractor.rs
// description: Shallow clone of a GitHub branch into deterministic local storage
// reference: https://git-scm.com/docs/git-clone

use crate::error::{PipelineError, Result};
use crate::models::SetupRepository;
use crate::utils::Validator;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};
use uuid::Uuid;

const GITHUB_HOST: &str = "github.com";

pub struct GitRepositoryExtractor {
    base_path: PathBuf,
}

impl GitRepositoryExtractor {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn target_path(&self, request: &SetupRepository) -> PathBuf {
        self.base_path.join(request.storage_dir_name())
    }

    /// Clones the requested branch and returns the checkout location. An
    /// existing checkout is reused as-is, without a freshness check.
    pub async fn extract(&self, request: &SetupRepository) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| {
                PipelineError::Extraction(format!(
                    "Failed to create storage directory {}: {}",
                    self.base_path.display(),
                    e
                ))
            })?;

        let target = self.target_path(request);

        if tokio::fs::try_exists(&target).await.unwrap_or(false) {
            info!(
                "Repository already exists at {}, skipping clone",
                target.display()
            );
            self.ensure_within_base(&target)?;
            return Ok(target);
        }

        let staging = self.staging_path(request);
        let url = clone_url(request);
        info!(
            "Cloning {} (branch {}) into {}",
            redact(&url, &request.github_token),
            request.branch,
            target.display()
        );

        let output = Command::new("git")
            .arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--single-branch")
            .arg("--branch")
            .arg(&request.branch)
            .arg("--")
            .arg(&url)
            .arg(&staging)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .output()
            .await;

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                discard_staging(&staging).await;
                return Err(PipelineError::Extraction(format!("Failed to run git: {}", e)));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            discard_staging(&staging).await;
            return Err(PipelineError::Extraction(format!(
                "git clone exited with {}: {}",
                output.status,
                redact(stderr.trim(), &request.github_token)
            )));
        }

        let target = install_checkout(&staging, target).await?;
        debug!("Clone complete: {}", target.display());
        self.ensure_within_base(&target)?;
        Ok(target)
    }

    /// Per-call clone destination next to the final checkout. Only this call
    /// ever writes to or removes it.
    fn staging_path(&self, request: &SetupRepository) -> PathBuf {
        self.base_path.join(format!(
            ".{}.{}.partial",
            request.storage_dir_name(),
            Uuid::new_v4().simple()
        ))
    }

    fn ensure_within_base(&self, target: &Path) -> Result<()> {
        Validator::validate_within_base_dir(target, &self.base_path)
            .map_err(|e| PipelineError::Extraction(e.to_string()))
    }
}

/// Moves a finished clone into place. When another setup installed the same
/// checkout first, theirs is kept and ours is dropped.
async fn install_checkout(staging: &Path, target: PathBuf) -> Result<PathBuf> {
    match tokio::fs::rename(staging, &target).await {
        Ok(()) => Ok(target),
        Err(_) if tokio::fs::try_exists(&target).await.unwrap_or(false) => {
            info!(
                "Repository appeared at {} during clone, reusing it",
                target.display()
            );
            discard_staging(staging).await;
            Ok(target)
        }
        Err(e) => {
            discard_staging(staging).await;
            Err(PipelineError::Extraction(format!(
                "Failed to move clone into {}: {}",
                target.display(),
                e
            )))
        }
    }
}

async fn discard_staging(staging: &Path) {
    if !tokio::fs::try_exists(staging).await.unwrap_or(false) {
        return;
    }
    if let Err(e) = tokio::fs::remove_dir_all(staging).await {
        warn!(
            "Failed to remove partial clone at {}: {}",
            staging.display(),
            e
        );
    }
}

fn clone_url(request: &SetupRepository) -> String {
    format!(
        "https://{}:{}@{}/{}/{}.git",
        request.owner, request.github_token, GITHUB_HOST, request.owner, request.repo
    )
}

fn redact(text: &str, token: &str) -> String {
    if token.is_empty() {
        text.to_string()
    } else {
        text.replace(token, "***")
    }
}
