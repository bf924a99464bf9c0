// file: src/llm/mod.rs
// description: model API clients for embeddings and chat completions
// reference: internal module structure

pub mod chat;
pub mod embeddings;
pub mod retry;

pub use chat::{ChatModel, OpenAiChatClient};
pub use embeddings::{EmbeddingProvider, OpenAiEmbeddingClient};
pub use retry::RetryPolicy;
