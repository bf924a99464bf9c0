// file: src/repository/scanner.rs
// description: Directory walking and file discovery with filtering
// reference: https://docs.rs/walkdir

use crate::config::PipelineConfig;
use crate::error::Result;
use crate::utils::Validator;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Debug, Clone)]
pub struct FileScanner {
    skip_patterns: Vec<String>,
    max_file_size: u64,
}

#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub relative_path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    pub files: Vec<ScannedFile>,
    pub skipped: usize,
}

impl FileScanner {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            skip_patterns: config.skip_patterns.clone(),
            max_file_size: (config.max_file_size_mb as u64) * 1024 * 1024,
        }
    }

    /// Walks `root` recursively and returns every regular file that is not
    /// excluded by a skip pattern or the size limit.
    pub fn scan_directory(&self, root: &Path) -> Result<ScanResult> {
        Validator::validate_directory(root)?;
        info!("Scanning directory: {}", root.display());

        let mut result = ScanResult::default();

        for entry in WalkDir::new(root).follow_links(false).into_iter() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable directory entry: {}", e);
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative_path = path
                .strip_prefix(root)
                .unwrap_or(path)
                .to_string_lossy()
                .replace('\\', "/");

            if self.should_skip(&relative_path) {
                debug!("Skipping file: {}", relative_path);
                result.skipped += 1;
                continue;
            }

            let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
            if self.max_file_size > 0 && size > self.max_file_size {
                debug!(
                    "Skipping large file ({} MB): {}",
                    size / 1024 / 1024,
                    relative_path
                );
                result.skipped += 1;
                continue;
            }

            result.files.push(ScannedFile {
                path: path.to_path_buf(),
                relative_path,
                size,
            });
        }

        info!(
            "Found {} files ({} skipped by filters)",
            result.files.len(),
            result.skipped
        );
        Ok(result)
    }

    /// `*.ext` matches a suffix, `dir/` matches a directory component, any
    /// other pattern matches as a substring of the relative path.
    fn should_skip(&self, relative_path: &str) -> bool {
        self.skip_patterns.iter().any(|pattern| {
            if let Some(suffix) = pattern.strip_prefix('*') {
                relative_path.ends_with(suffix)
            } else if pattern.ends_with('/') {
                relative_path.starts_with(pattern.as_str())
                    || relative_path.contains(&format!("/{}", pattern))
            } else {
                relative_path.contains(pattern.as_str())
            }
        })
    }
}
