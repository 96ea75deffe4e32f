//! Chunking strategy trait and types

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Configuration for chunking.
///
/// Token counts are approximated from character length
/// (`chars / chars_per_token`); no tokenizer is consulted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Ceiling on the approximate token count of a chunk
    pub max_tokens: usize,
    /// Characters assumed per token
    #[serde(default = "default_chars_per_token")]
    pub chars_per_token: usize,
    /// Chunks shorter than this many characters are dropped
    #[serde(default = "default_min_chunk_chars")]
    pub min_chunk_chars: usize,
}

fn default_chars_per_token() -> usize {
    4
}

fn default_min_chunk_chars() -> usize {
    50
}

impl ChunkingConfig {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            chars_per_token: default_chars_per_token(),
            min_chunk_chars: default_min_chunk_chars(),
        }
    }

    pub fn with_chars_per_token(mut self, chars_per_token: usize) -> Self {
        self.chars_per_token = chars_per_token;
        self
    }

    pub fn with_min_chunk_chars(mut self, min_chars: usize) -> Self {
        self.min_chunk_chars = min_chars;
        self
    }

    /// Character budget for one chunk
    pub fn char_budget(&self) -> usize {
        self.max_tokens.saturating_mul(self.chars_per_token)
    }

    /// Approximate token count of a text
    pub fn estimate_tokens(&self, text: &str) -> usize {
        text.chars().count().div_ceil(self.chars_per_token.max(1))
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.max_tokens == 0 {
            return Err(DomainError::chunking("max_tokens must be greater than 0"));
        }

        if self.chars_per_token == 0 {
            return Err(DomainError::chunking("chars_per_token must be greater than 0"));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self::new(500)
    }
}

/// A chunk of text extracted from a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Zero-based position within the document
    pub index: usize,
    pub content: String,
    pub token_estimate: usize,
}

impl Chunk {
    pub fn new(index: usize, content: impl Into<String>, token_estimate: usize) -> Self {
        Self {
            index,
            content: content.into(),
            token_estimate,
        }
    }

    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Trait for chunking strategies
pub trait ChunkingStrategy: Send + Sync + Debug {
    /// Split content into chunks. Empty input yields an empty vector.
    fn chunk(&self, content: &str, config: &ChunkingConfig) -> Result<Vec<Chunk>, DomainError>;

    /// Get the strategy name
    fn name(&self) -> &'static str;
}
