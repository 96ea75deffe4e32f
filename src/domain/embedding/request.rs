//! Embedding request types

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

static NEWLINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\r\n]+").expect("valid newline regex"));

/// Collapse newline runs to single spaces and trim the ends.
///
/// Applied to both document chunks and queries so they land in the same
/// embedding space.
pub fn normalize_input(text: &str) -> String {
    NEWLINES.replace_all(text, " ").trim().to_string()
}

/// Request to generate embeddings for one or more texts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingRequest {
    /// Model to use for embedding
    model: String,
    /// Input texts to embed, already normalized
    input: Vec<String>,
    /// Optional dimensions (for models that support shortening)
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

impl EmbeddingRequest {
    /// Create a request for a single text
    pub fn single(model: impl Into<String>, text: impl Into<String>) -> Self {
        Self::batch(model, vec![text.into()])
    }

    /// Create a request for multiple texts
    pub fn batch(model: impl Into<String>, texts: Vec<String>) -> Self {
        Self {
            model: model.into(),
            input: texts,
            dimensions: None,
        }
    }

    /// Set the output dimensions
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn inputs(&self) -> &[String] {
        &self.input
    }

    pub fn dimensions(&self) -> Option<usize> {
        self.dimensions
    }

    pub fn len(&self) -> usize {
        self.input.len()
    }

    pub fn is_empty(&self) -> bool {
        self.input.is_empty()
    }
}
