// file: src/models/repository.rs
// description: repository and file records owned by a processing run
// reference: relational data model

use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    pub id: Uuid,
    pub name: String,
}

impl Repository {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }

    /// Display name is the final segment of the storage path.
    pub fn from_storage_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.to_string_lossy().to_string());
        Self::new(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub path: String,
    pub repository_id: Uuid,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, repository_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            path: path.into(),
            repository_id,
        }
    }
}
