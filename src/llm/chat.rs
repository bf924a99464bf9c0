// file: src/llm/chat.rs
// description: chat completion trait and OpenAI-compatible client used for code reports
// reference: https://platform.openai.com/docs/api-reference/chat

use crate::config::LlmConfig;
use crate::error::{PipelineError, Result};
use crate::llm::retry::{RetryPolicy, build_client, post_json_with_retry};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[async_trait]
pub trait ChatModel: Send + Sync {
    fn model_name(&self) -> &str;

    /// Sends a single user message and returns the assistant's text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

pub struct OpenAiChatClient {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    temperature: f32,
    retry: RetryPolicy,
}

impl OpenAiChatClient {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(config.timeout_secs)?,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim_end_matches('/')
            ),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
            temperature: config.temperature,
            retry: RetryPolicy::new(config.max_retries),
        })
    }

    fn extract_content(body: serde_json::Value) -> Result<String> {
        let response: ChatResponse = serde_json::from_value(body)
            .map_err(|e| PipelineError::Llm(format!("Failed to parse chat response: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PipelineError::Llm("Chat response contained no content".to_string()))
    }
}

#[async_trait]
impl ChatModel for OpenAiChatClient {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.temperature,
        };
        let body = serde_json::to_value(&request)?;

        debug!("Requesting completion from {}", self.model);

        let response = post_json_with_retry(
            &self.client,
            &self.endpoint,
            self.api_key.as_deref(),
            &body,
            &self.retry,
            PipelineError::Llm,
        )
        .await?;

        Self::extract_content(response)
    }
}
