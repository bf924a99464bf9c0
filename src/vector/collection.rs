// file: src/vector/collection.rs
// description: deterministic collection naming for a repository checkout
// reference: qdrant collection naming

use crate::error::{PipelineError, Result};
use std::path::Path;

pub const MAX_COLLECTION_NAME_LENGTH: usize = 256;

/// Final path segment with spaces and hyphens turned into underscores,
/// lower-cased.
pub fn collection_name(repo_path: &Path) -> Result<String> {
    let segment = repo_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    let name = segment.replace([' ', '-'], "_").to_lowercase();
    let length = name.chars().count();

    if length == 0 || length > MAX_COLLECTION_NAME_LENGTH {
        return Err(PipelineError::InvalidCollectionName(name));
    }

    Ok(name)
}
