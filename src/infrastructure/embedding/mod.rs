//! Embedding provider implementations and the caching client

mod client;
mod openai;

pub use client::EmbeddingClient;
pub use openai::OpenAiEmbeddingProvider;

// Re-export HTTP client for use by embedding providers
pub use super::llm::{HttpClient, HttpClientTrait};
