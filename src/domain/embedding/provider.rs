//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::{EmbeddingRequest, EmbeddingResponse};
use crate::domain::DomainError;

/// Trait for embedding backends (OpenAI and compatible APIs)
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    /// Generate embeddings for the given input
    async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;

    /// Get the default model for this provider
    fn default_model(&self) -> &'static str;

    /// Get the embedding dimensions for a model
    fn dimensions(&self, model: &str) -> Option<usize>;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use crate::domain::embedding::{Embedding, EmbeddingUsage};

    /// Deterministic embedding provider; texts can be pinned to fixed vectors
    #[derive(Debug)]
    pub struct MockEmbeddingProvider {
        name: &'static str,
        dimensions: usize,
        error: Option<String>,
        fail_on: Option<String>,
        repeat_index: bool,
        fixed: Mutex<HashMap<String, Vec<f32>>>,
        calls: AtomicUsize,
    }

    impl MockEmbeddingProvider {
        pub fn new(name: &'static str, dimensions: usize) -> Self {
            Self {
                name,
                dimensions,
                error: None,
                fail_on: None,
                repeat_index: false,
                fixed: Mutex::new(HashMap::new()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Fail any request containing a text with this substring
        pub fn with_failure_on(mut self, needle: impl Into<String>) -> Self {
            self.fail_on = Some(needle.into());
            self
        }

        /// Tag every returned vector with index 0
        pub fn with_repeated_index(mut self) -> Self {
            self.repeat_index = true;
            self
        }

        pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.fixed.lock().unwrap().insert(text.into(), vector);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            if let Some(vector) = self.fixed.lock().unwrap().get(text) {
                return vector.clone();
            }

            let hash = text.bytes().fold(0u64, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u64));
            (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u64 * 7919) % 1000) as f32 / 1000.0) - 0.5)
                .collect()
        }
    }

    #[async_trait]
    impl EmbeddingProvider for MockEmbeddingProvider {
        async fn embed(&self, request: EmbeddingRequest) -> Result<EmbeddingResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            if let Some(ref error) = self.error {
                return Err(DomainError::embedding(format!("{}: {}", self.name, error)));
            }

            if let Some(ref needle) = self.fail_on {
                if request.inputs().iter().any(|t| t.contains(needle.as_str())) {
                    return Err(DomainError::embedding(format!("{}: rejected input", self.name)));
                }
            }

            let embeddings: Vec<Embedding> = request
                .inputs()
                .iter()
                .enumerate()
                .map(|(idx, text)| {
                    let idx = if self.repeat_index { 0 } else { idx };
                    Embedding::new(idx, self.vector_for(text))
                })
                .collect();

            let tokens = request.inputs().iter().map(|t| t.len() / 4).sum::<usize>() as u32;

            Ok(EmbeddingResponse::new(
                request.model().to_string(),
                embeddings,
                EmbeddingUsage {
                    prompt_tokens: tokens,
                    total_tokens: tokens,
                },
            ))
        }

        fn provider_name(&self) -> &'static str {
            self.name
        }

        fn default_model(&self) -> &'static str {
            "mock-embedding"
        }

        fn dimensions(&self, _model: &str) -> Option<usize> {
            Some(self.dimensions)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[tokio::test]
        async fn test_mock_provider_batch_input() {
            let provider = MockEmbeddingProvider::new("test", 16);
            let request =
                EmbeddingRequest::batch("mock-embedding", vec!["Hello".into(), "World".into()]);

            let response = provider.embed(request).await.unwrap();

            assert_eq!(response.embeddings().len(), 2);
            assert_eq!(response.embeddings()[1].dimensions(), 16);
            assert_eq!(provider.calls(), 1);
        }

        #[tokio::test]
        async fn test_deterministic_embeddings() {
            let provider = MockEmbeddingProvider::new("test", 32);

            let first = provider
                .embed(EmbeddingRequest::single("mock-embedding", "Hello"))
                .await
                .unwrap();
            let second = provider
                .embed(EmbeddingRequest::single("mock-embedding", "Hello"))
                .await
                .unwrap();

            assert_eq!(first.embeddings()[0].vector(), second.embeddings()[0].vector());
        }

        #[tokio::test]
        async fn test_failure_on_substring() {
            let provider = MockEmbeddingProvider::new("test", 4).with_failure_on("poison");
            let request =
                EmbeddingRequest::batch("mock-embedding", vec!["ok".into(), "poison pill".into()]);

            assert!(provider.embed(request).await.is_err());
        }
    }
}
