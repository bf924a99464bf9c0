// file: src/config.rs
// description: application configuration management with toml and environment support
// reference: https://docs.rs/config

use crate::error::{PipelineError, Result};
use crate::utils::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub vector_store: VectorStoreConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub pipeline: PipelineConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    pub base_path: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    Cosine,
    Euclid,
    Dot,
    Manhattan,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VectorStoreConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub vector_size: u64,
    pub distance: DistanceMetric,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EmbeddingConfig {
    pub base_url: String,
    pub model: String,
    pub dims: usize,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    pub base_url: String,
    pub chat_model: String,
    pub api_key: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PipelineConfig {
    pub max_concurrent_files: usize,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_file_size_mb: usize,
    pub skip_patterns: Vec<String>,
    #[serde(default = "default_show_progress")]
    pub show_progress: bool,
    #[serde(default)]
    pub language_map: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub bind: String,
}

fn default_show_progress() -> bool {
    true
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        load_dotenv();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("REPO_INSIGHT")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        let mut config: Config = settings
            .try_deserialize()
            .map_err(|e| PipelineError::Config(e.to_string()))?;

        config.apply_api_key_fallback();
        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        load_dotenv();

        let mut config = Self {
            storage: StorageConfig {
                base_path: PathBuf::from("./storage/repo_files"),
            },
            database: DatabaseConfig {
                path: PathBuf::from("./storage/repo_insight.db"),
                max_connections: 5,
            },
            vector_store: VectorStoreConfig {
                url: "http://localhost:6334".to_string(),
                api_key: None,
                vector_size: 1536,
                distance: DistanceMetric::Cosine,
            },
            embedding: EmbeddingConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                model: "text-embedding-3-small".to_string(),
                dims: 1536,
                api_key: None,
                timeout_secs: 30,
                max_retries: 5,
            },
            llm: LlmConfig {
                base_url: "https://api.openai.com/v1".to_string(),
                chat_model: "gpt-4".to_string(),
                api_key: None,
                temperature: 0.0,
                timeout_secs: 120,
                max_retries: 3,
            },
            pipeline: PipelineConfig {
                max_concurrent_files: 16,
                chunk_size: 8191,
                chunk_overlap: 200,
                max_file_size_mb: 10,
                skip_patterns: vec![".git/".to_string()],
                show_progress: true,
                language_map: None,
            },
            server: ServerConfig {
                bind: "0.0.0.0:8888".to_string(),
            },
        };
        config.apply_api_key_fallback();
        config
    }

    /// Both API clients talk to OpenAI by default, so an unset key falls back
    /// to the conventional `OPENAI_API_KEY` variable.
    fn apply_api_key_fallback(&mut self) {
        let env_key = std::env::var("OPENAI_API_KEY").ok();
        if self.embedding.api_key.is_none() {
            self.embedding.api_key = env_key.clone();
        }
        if self.llm.api_key.is_none() {
            self.llm.api_key = env_key;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_concurrent_files == 0 {
            return Err(PipelineError::Config(
                "max_concurrent_files must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.chunk_size == 0 {
            return Err(PipelineError::Config(
                "chunk_size must be greater than 0".to_string(),
            ));
        }

        if self.pipeline.chunk_overlap >= self.pipeline.chunk_size {
            return Err(PipelineError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.pipeline.chunk_overlap, self.pipeline.chunk_size
            )));
        }

        if self.vector_store.vector_size == 0 {
            return Err(PipelineError::Config(
                "vector_size must be greater than 0".to_string(),
            ));
        }

        if self.embedding.dims as u64 != self.vector_store.vector_size {
            return Err(PipelineError::Config(format!(
                "embedding dims ({}) must match vector_store.vector_size ({})",
                self.embedding.dims, self.vector_store.vector_size
            )));
        }

        if self.embedding.model.trim().is_empty() || self.llm.chat_model.trim().is_empty() {
            return Err(PipelineError::Config("model names must not be empty".to_string()));
        }

        if self.database.max_connections == 0 {
            return Err(PipelineError::Config(
                "max_connections must be greater than 0".to_string(),
            ));
        }

        for url in [
            &self.vector_store.url,
            &self.embedding.base_url,
            &self.llm.base_url,
        ] {
            Validator::validate_url(url).map_err(|e| PipelineError::Config(e.to_string()))?;
        }

        Ok(())
    }
}

/// Variables already set in the process win over `.env` entries.
fn load_dotenv() {
    if let Err(e) = dotenv() {
        if !e.not_found() {
            warn!("Ignoring unreadable .env file: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.chunk_size, 8191);
        assert_eq!(config.pipeline.chunk_overlap, 200);
        assert_eq!(config.vector_store.vector_size, 1536);
        assert_eq!(config.vector_store.distance, DistanceMetric::Cosine);
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = Config::default_config();
        config.pipeline.max_concurrent_files = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let mut config = Config::default_config();
        config.pipeline.chunk_overlap = config.pipeline.chunk_size;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let mut config = Config::default_config();
        config.embedding.dims = 768;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[storage]
base_path = "/tmp/repos"

[database]
path = "/tmp/insight.db"
max_connections = 2

[vector_store]
url = "http://qdrant:6334"
vector_size = 8
distance = "dot"

[embedding]
base_url = "http://localhost:9999/v1"
model = "tiny-embed"
dims = 8
api_key = "embed-key"
timeout_secs = 5
max_retries = 1

[llm]
base_url = "http://localhost:9999/v1"
chat_model = "tiny-chat"
api_key = "chat-key"
temperature = 0.2
timeout_secs = 5
max_retries = 1

[pipeline]
max_concurrent_files = 4
chunk_size = 100
chunk_overlap = 10
max_file_size_mb = 1
skip_patterns = [".git/"]
show_progress = false

[server]
bind = "127.0.0.1:8080"
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.vector_store.distance, DistanceMetric::Dot);
        assert_eq!(config.pipeline.max_concurrent_files, 4);
        assert_eq!(config.embedding.api_key.as_deref(), Some("embed-key"));
        assert!(!config.pipeline.show_progress);
        assert!(config.pipeline.language_map.is_none());
    }

    #[test]
    fn test_default_config_falls_back_to_openai_key() {
        // SAFETY: no other test in this crate reads or writes this variable
        // while expecting it unset.
        unsafe { std::env::set_var("OPENAI_API_KEY", "sk-from-environment") };

        let config = Config::default_config();

        assert_eq!(config.embedding.api_key.as_deref(), Some("sk-from-environment"));
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-from-environment"));
    }
}
