// file: src/repository/classifier.rs
// description: extension to language classification backed by a static table
// reference: file extension to language mapping

use crate::error::{PipelineError, Result};
use lazy_static::lazy_static;
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info};

/// Tag returned for files whose extension no table entry claims.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const BUILTIN_LANGUAGE_MAP: &str = include_str!("../../language_map.json");

lazy_static! {
    static ref BUILTIN_TABLE: Arc<LanguageTable> = match LanguageTable::from_json(BUILTIN_LANGUAGE_MAP) {
        Ok(table) => Arc::new(table),
        Err(e) => {
            error!("Built-in language map is invalid: {}", e);
            Arc::new(LanguageTable::default())
        }
    };
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    pub language: String,
    pub extensions: Vec<String>,
}

/// Ordered extension table. Entries keep their declaration order so that an
/// extension claimed twice resolves to the first entry.
#[derive(Debug, Clone, Default)]
pub struct LanguageTable {
    entries: Vec<LanguageEntry>,
}

impl LanguageTable {
    /// Parses `{ "<language>": { "extensions": [".ext", ...] }, ... }`.
    pub fn from_json(raw: &str) -> Result<Self> {
        let root: Map<String, Value> = serde_json::from_str(raw)?;

        let mut entries = Vec::with_capacity(root.len());
        for (language, spec) in root {
            let extensions = match spec.get("extensions") {
                Some(Value::Array(items)) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                Some(_) => {
                    return Err(PipelineError::Config(format!(
                        "extensions for language '{}' must be an array of strings",
                        language
                    )));
                }
                None => Vec::new(),
            };
            entries.push(LanguageEntry {
                language,
                extensions,
            });
        }

        Ok(Self { entries })
    }

    pub fn load(path: &Path) -> Result<Self> {
        info!("Loading language map from {}", path.display());
        let raw = fs::read_to_string(path).map_err(|source| PipelineError::FileOperation {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&raw)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup(&self, extension: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|entry| entry.extensions.iter().any(|ext| ext == extension))
            .map(|entry| entry.language.as_str())
    }
}

#[derive(Clone)]
pub struct FileClassifier {
    table: Arc<LanguageTable>,
}

impl FileClassifier {
    pub fn new(table: LanguageTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }

    /// Classifier over the table compiled into the binary. The table is parsed
    /// once per process and shared by every classifier built this way.
    pub fn builtin() -> Self {
        Self {
            table: Arc::clone(&BUILTIN_TABLE),
        }
    }

    pub fn from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Ok(Self::new(LanguageTable::load(path)?)),
            None => Ok(Self::builtin()),
        }
    }

    /// Returns the language tag for `path`, or [`UNKNOWN_LANGUAGE`].
    pub fn classify(&self, path: &Path) -> &str {
        let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
            return UNKNOWN_LANGUAGE;
        };

        let dotted = format!(".{}", extension);
        match self.table.lookup(&dotted) {
            Some(language) => language,
            None => {
                debug!("No language entry for extension {}", dotted);
                UNKNOWN_LANGUAGE
            }
        }
    }

    pub fn is_known(&self, path: &Path) -> bool {
        self.classify(path) != UNKNOWN_LANGUAGE
    }
}

impl Default for FileClassifier {
    fn default() -> Self {
        Self::builtin()
    }
}
