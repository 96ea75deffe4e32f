use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Wire-level chat completion client (OpenAI-compatible, Anthropic, ...)
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a chat completion request
    async fn chat(&self, model: &str, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Check that the backend answers an authenticated request
    async fn ping(&self) -> Result<(), DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}
