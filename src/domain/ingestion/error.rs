//! Ingestion failures, tagged with the stage that failed

use std::fmt;

use thiserror::Error;

use crate::domain::DomainError;

/// Stage of the ingestion pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestionStage {
    Validation,
    Chunking,
    Embedding,
    Store,
}

impl IngestionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Store => "store",
        }
    }
}

impl fmt::Display for IngestionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document could not be ingested; nothing was persisted
#[derive(Debug, Error)]
#[error("Ingestion failed at {stage} stage: {source}")]
pub struct IngestionError {
    pub stage: IngestionStage,
    #[source]
    pub source: DomainError,
}

impl IngestionError {
    pub fn new(stage: IngestionStage, source: DomainError) -> Self {
        Self { stage, source }
    }

    pub fn validation(source: DomainError) -> Self {
        Self::new(IngestionStage::Validation, source)
    }

    pub fn chunking(source: DomainError) -> Self {
        Self::new(IngestionStage::Chunking, source)
    }

    pub fn embedding(source: DomainError) -> Self {
        Self::new(IngestionStage::Embedding, source)
    }

    pub fn store(source: DomainError) -> Self {
        Self::new(IngestionStage::Store, source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_names_stage() {
        let error = IngestionError::embedding(DomainError::embedding("upstream 503"));

        assert_eq!(error.stage, IngestionStage::Embedding);
        assert_eq!(
            error.to_string(),
            "Ingestion failed at embedding stage: Embedding error: upstream 503"
        );
    }

    #[test]
    fn test_source_is_exposed() {
        use std::error::Error;

        let error = IngestionError::store(DomainError::store("connection reset"));
        let source = error.source().unwrap();

        assert_eq!(source.to_string(), "Store error: connection reset");
    }
}
