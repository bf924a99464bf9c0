// file: src/utils/validation.rs
// description: input validation for setup requests, paths and endpoints
// reference: https://git-scm.com/docs/git-check-ref-format

use crate::error::{PipelineError, Result};
use crate::models::SetupRepository;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs;
use std::path::Path;

lazy_static! {
    static ref GITHUB_NAME: Regex =
        Regex::new(r"^[A-Za-z0-9_.-]+$").expect("GITHUB_NAME regex is valid");
    static ref GIT_BRANCH: Regex =
        Regex::new(r"^[A-Za-z0-9_./-]+$").expect("GIT_BRANCH regex is valid");
}

const MAX_NAME_LENGTH: usize = 100;
const MAX_BRANCH_LENGTH: usize = 255;

pub struct Validator;

impl Validator {
    pub fn validate_directory(path: &Path) -> Result<()> {
        if !path.exists() {
            return Err(PipelineError::Validation(format!(
                "Directory does not exist: {}",
                path.display()
            )));
        }

        if !path.is_dir() {
            return Err(PipelineError::Validation(format!(
                "Path is not a directory: {}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Rejects blank fields and names that could escape the storage
    /// directory or be read as git options.
    pub fn validate_setup_request(request: &SetupRepository) -> Result<()> {
        let mut errors = Vec::new();

        if request.github_token.trim().is_empty() {
            errors.push("github_token must not be empty".to_string());
        }

        for (field, value) in [("owner", &request.owner), ("repo", &request.repo)] {
            if let Err(e) = Self::validate_github_name(field, value) {
                errors.push(e);
            }
        }

        if let Err(e) = Self::validate_branch(&request.branch) {
            errors.push(e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(PipelineError::Validation(errors.join("; ")))
        }
    }

    fn validate_github_name(field: &str, value: &str) -> std::result::Result<(), String> {
        if value.trim().is_empty() {
            return Err(format!("{} must not be empty", field));
        }
        if value.len() > MAX_NAME_LENGTH {
            return Err(format!("{} is longer than {} characters", field, MAX_NAME_LENGTH));
        }
        if value == "." || value == ".." || !GITHUB_NAME.is_match(value) {
            return Err(format!("{} contains invalid characters", field));
        }
        Ok(())
    }

    fn validate_branch(branch: &str) -> std::result::Result<(), String> {
        if branch.trim().is_empty() {
            return Err("branch must not be empty".to_string());
        }
        if branch.len() > MAX_BRANCH_LENGTH {
            return Err(format!("branch is longer than {} characters", MAX_BRANCH_LENGTH));
        }
        if branch.starts_with('-') || branch.contains("..") || !GIT_BRANCH.is_match(branch) {
            return Err("branch contains invalid characters".to_string());
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(PipelineError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }

    /// Shortens `text` to at most `max_chars` characters for log output.
    pub fn truncate_text(text: &str, max_chars: usize) -> String {
        match text.char_indices().nth(max_chars) {
            Some((idx, _)) => format!("{}...", &text[..idx]),
            None => text.to_string(),
        }
    }

    pub fn validate_within_base_dir(path: &Path, base_dir: &Path) -> Result<()> {
        let canonical_path = fs::canonicalize(path).map_err(|e| {
            PipelineError::Validation(format!(
                "Cannot canonicalize path {}: {}",
                path.display(),
                e
            ))
        })?;

        let canonical_base = fs::canonicalize(base_dir).map_err(|e| {
            PipelineError::Validation(format!(
                "Cannot canonicalize base dir {}: {}",
                base_dir.display(),
                e
            ))
        })?;

        if !canonical_path.starts_with(&canonical_base) {
            return Err(PipelineError::Validation(format!(
                "Path traversal detected ({} outside {})",
                canonical_path.display(),
                canonical_base.display()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn request(owner: &str, repo: &str, branch: &str) -> SetupRepository {
        SetupRepository::new("ghp_token", owner, repo, branch)
    }

    #[test]
    fn test_validate_directory() {
        let temp = TempDir::new().unwrap();
        assert!(Validator::validate_directory(temp.path()).is_ok());
        assert!(Validator::validate_directory(Path::new("/nonexistent")).is_err());
    }

    #[test]
    fn test_valid_setup_request() {
        assert!(Validator::validate_setup_request(&request("octo-org", "hello.world", "feature/x")).is_ok());
    }

    #[test]
    fn test_blank_fields_are_rejected() {
        let err = Validator::validate_setup_request(&SetupRepository::new(" ", "", "repo", ""))
            .unwrap_err()
            .to_string();
        assert!(err.contains("github_token"));
        assert!(err.contains("owner"));
        assert!(err.contains("branch"));
        assert!(!err.contains("repo must"));
    }

    #[test]
    fn test_path_traversal_names_are_rejected() {
        assert!(Validator::validate_setup_request(&request("..", "repo", "main")).is_err());
        assert!(Validator::validate_setup_request(&request("octo", "../etc", "main")).is_err());
        assert!(Validator::validate_setup_request(&request("octo", "repo", "../../main")).is_err());
    }

    #[test]
    fn test_option_like_branch_is_rejected() {
        assert!(Validator::validate_setup_request(&request("octo", "repo", "--upload-pack=x")).is_err());
        assert!(Validator::validate_setup_request(&request("octo", "repo", "main; rm -rf /")).is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(Validator::validate_url("https://api.openai.com/v1").is_ok());
        assert!(Validator::validate_url("http://localhost:6334").is_ok());
        assert!(Validator::validate_url("localhost:6334").is_err());
    }

    #[test]
    fn test_truncate_text_is_char_safe() {
        assert_eq!(Validator::truncate_text("short", 10), "short");
        assert_eq!(Validator::truncate_text("héllo wörld", 5), "héllo...");
    }

    #[test]
    fn test_validate_within_base_dir() {
        let base = TempDir::new().unwrap();
        let nested = base.path().join("octo_repo");
        std::fs::create_dir_all(&nested).unwrap();
        assert!(Validator::validate_within_base_dir(&nested, base.path()).is_ok());

        let outside = TempDir::new().unwrap();
        assert!(Validator::validate_within_base_dir(outside.path(), base.path()).is_err());
    }
}
