//! Similarity search parameters and results

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Search parameters for knowledge queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Maximum number of hits
    pub limit: usize,
    /// Minimum cosine similarity (inclusive)
    pub threshold: f32,
}

impl SearchParams {
    pub fn new(limit: usize, threshold: f32) -> Self {
        Self { limit, threshold }
    }

    pub fn accepts(&self, similarity: f32) -> bool {
        similarity >= self.threshold
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        Self::new(5, 0.7)
    }
}

/// A chunk matched by similarity search, joined with its parent document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    pub similarity: f32,
    pub title: String,
    pub source_url: Option<String>,
    pub tags: Vec<String>,
}

/// Sort hits by similarity descending and apply the limit
pub fn rank_hits(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| {
        b.similarity
            .partial_cmp(&a.similarity)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    hits.truncate(limit);
    hits
}
