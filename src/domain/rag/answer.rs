//! Answer produced by the retrieval-augmented pipeline

use serde::Serialize;
use std::fmt;

use crate::domain::knowledge::SearchHit;
use crate::domain::llm::Usage;
use crate::domain::provider::ProviderKind;

/// Pipeline stage of a single ask request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RagStage {
    Embedding,
    Searching,
    ContextAssembly,
    Generating,
    Done,
    Failed,
}

impl RagStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Embedding => "embedding",
            Self::Searching => "searching",
            Self::ContextAssembly => "context_assembly",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for RagStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RagAnswer {
    pub answer: String,
    /// The ranked hits the answer was grounded on
    pub sources: Vec<SearchHit>,
    /// Mean similarity of the retrieved hits; 0.0 when nothing matched
    pub confidence: f32,
    pub provider: ProviderKind,
    pub model: String,
    pub usage: Option<Usage>,
}

/// Mean similarity of the hits, 0.0 for none
pub fn confidence(hits: &[SearchHit]) -> f32 {
    if hits.is_empty() {
        return 0.0;
    }

    hits.iter().map(|h| h.similarity).sum::<f32>() / hits.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn hit(similarity: f32) -> SearchHit {
        SearchHit {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            chunk_index: 0,
            content: String::new(),
            similarity,
            title: String::new(),
            source_url: None,
            tags: vec![],
        }
    }

    #[test]
    fn test_confidence_is_mean_similarity() {
        let value = confidence(&[hit(0.9), hit(0.7), hit(0.8)]);
        assert!((value - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_confidence_without_hits() {
        assert_eq!(confidence(&[]), 0.0);
    }

    #[test]
    fn test_terminal_stages() {
        assert!(RagStage::Done.is_terminal());
        assert!(RagStage::Failed.is_terminal());
        assert!(!RagStage::Generating.is_terminal());
    }
}
