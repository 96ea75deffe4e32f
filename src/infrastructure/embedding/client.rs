//! Embedding client used by both ingestion and queries

use moka::future::Cache;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::debug;

use crate::domain::embedding::{normalize_input, EmbeddingProvider, EmbeddingRequest};
use crate::domain::DomainError;

/// Normalizes input, validates dimensionality and optionally caches vectors.
///
/// The cache is keyed by SHA-256 of model and normalized text, so a cache
/// hit returns the exact vector produced the first time.
#[derive(Clone)]
pub struct EmbeddingClient {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    dimensions: usize,
    cache: Option<Cache<String, Arc<Vec<f32>>>>,
}

impl std::fmt::Debug for EmbeddingClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmbeddingClient")
            .field("provider", &self.provider.provider_name())
            .field("model", &self.model)
            .field("dimensions", &self.dimensions)
            .field("cached", &self.cache.is_some())
            .finish()
    }
}

impl EmbeddingClient {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions,
            cache: None,
        }
    }

    /// Enable the in-process cache; a capacity of 0 disables it
    pub fn with_cache(mut self, capacity: u64) -> Self {
        self.cache = (capacity > 0).then(|| Cache::builder().max_capacity(capacity).build());
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| DomainError::embedding("Embedding response contained no vectors"))
    }

    /// Embed several texts; output order matches input order
    pub async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let normalized: Vec<String> = texts.iter().map(|t| normalize_input(t)).collect();

        if let Some(position) = normalized.iter().position(String::is_empty) {
            return Err(DomainError::embedding(format!(
                "Input {} is empty after normalization",
                position
            )));
        }

        let mut results: Vec<Option<Vec<f32>>> = vec![None; normalized.len()];
        let mut misses: Vec<usize> = Vec::new();

        for (i, text) in normalized.iter().enumerate() {
            match self.cached(text).await {
                Some(vector) => results[i] = Some(vector),
                None => misses.push(i),
            }
        }

        if !misses.is_empty() {
            debug!(
                model = %self.model,
                requested = normalized.len(),
                uncached = misses.len(),
                "Requesting embeddings"
            );

            let inputs: Vec<String> = misses.iter().map(|&i| normalized[i].clone()).collect();
            let vectors = self.request(inputs).await?;

            for (&i, vector) in misses.iter().zip(vectors) {
                self.remember(&normalized[i], &vector).await;
                results[i] = Some(vector);
            }
        }

        results
            .into_iter()
            .map(|v| v.ok_or_else(|| DomainError::embedding("Missing embedding vector")))
            .collect()
    }

    async fn request(&self, inputs: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError> {
        let expected = inputs.len();
        let mut request = EmbeddingRequest::batch(&self.model, inputs);

        if self.provider.dimensions(&self.model) != Some(self.dimensions) {
            request = request.with_dimensions(self.dimensions);
        }

        let vectors = self.provider.embed(request).await?.into_ordered_vectors()?;

        if vectors.len() != expected {
            return Err(DomainError::embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                vectors.len()
            )));
        }

        if let Some(bad) = vectors.iter().find(|v| v.len() != self.dimensions) {
            return Err(DomainError::embedding(format!(
                "Expected {}-dimensional embedding, got {}",
                self.dimensions,
                bad.len()
            )));
        }

        Ok(vectors)
    }

    async fn cached(&self, text: &str) -> Option<Vec<f32>> {
        let cache = self.cache.as_ref()?;
        cache
            .get(&cache_key(&self.model, text))
            .await
            .map(|v| v.as_ref().clone())
    }

    async fn remember(&self, text: &str, vector: &[f32]) {
        if let Some(cache) = &self.cache {
            cache
                .insert(cache_key(&self.model, text), Arc::new(vector.to_vec()))
                .await;
        }
    }
}

fn cache_key(model: &str, text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(model.as_bytes());
    hasher.update([0u8]);
    hasher.update(text.as_bytes());
    hex::encode(hasher.finalize())
}
