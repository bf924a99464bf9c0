// file: src/llm/embeddings.rs
// description: text embedding provider trait and OpenAI-compatible client
// reference: https://platform.openai.com/docs/api-reference/embeddings

use crate::config::EmbeddingConfig;
use crate::error::{PipelineError, Result};
use crate::llm::retry::{RetryPolicy, build_client, post_json_with_retry};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Turns a text chunk into a fixed-length vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn model_name(&self) -> &str;

    fn dims(&self) -> usize;

    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: Vec<&'a str>,
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

pub struct OpenAiEmbeddingClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    dims: usize,
    retry: RetryPolicy,
}

impl OpenAiEmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            dims: config.dims,
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    fn parse_response(&self, body: serde_json::Value) -> Result<Vec<f32>> {
        let response: EmbeddingResponse = serde_json::from_value(body).map_err(|e| {
            PipelineError::Embedding(format!("Failed to parse embedding response: {}", e))
        })?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| PipelineError::Embedding("No embedding data returned".to_string()))?;

        if embedding.len() != self.dims {
            return Err(PipelineError::Embedding(format!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dims,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbeddingClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let request = EmbeddingRequest {
            input: vec![text],
            model: &self.model,
        };
        let body = serde_json::to_value(&request)?;

        debug!("Requesting embedding from {} for {} chars", self.model, text.len());

        let response = post_json_with_retry(
            &self.client,
            &self.endpoint,
            self.api_key.as_deref(),
            &body,
            &self.retry,
            PipelineError::Embedding,
        )
        .await?;

        let embedding = self.parse_response(response)?;
        debug!("Received embedding of dimension {}", embedding.len());
        Ok(embedding)
    }
}
