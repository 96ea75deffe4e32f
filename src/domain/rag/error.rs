use thiserror::Error;

use crate::domain::DomainError;

/// Failures of a single ask request. No variant carries a fabricated answer.
#[derive(Debug, Error)]
pub enum AskError {
    #[error("Failed to embed question: {0}")]
    Retrieval(#[source] DomainError),

    #[error("Knowledge search failed: {0}")]
    Search(#[source] DomainError),

    #[error("Answer generation failed: {0}")]
    Generation(#[source] DomainError),

    #[error("AI temporarily unavailable: {0}")]
    NoProviderAvailable(#[source] DomainError),

    #[error("Request cancelled")]
    Cancelled,
}

impl AskError {
    /// Maps a provider-layer error, keeping "no provider" distinct
    pub fn from_generation(error: DomainError) -> Self {
        if error.is_no_provider_available() {
            Self::NoProviderAvailable(error)
        } else {
            Self::Generation(error)
        }
    }

    /// True when callers should report the AI as temporarily unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::NoProviderAvailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_generation_keeps_unavailable_distinct() {
        let unavailable = AskError::from_generation(DomainError::no_provider_available(
            "answering",
            vec!["deepseek".into()],
        ));
        assert!(unavailable.is_unavailable());

        let failed = AskError::from_generation(DomainError::provider("deepseek", "HTTP 500"));
        assert!(matches!(failed, AskError::Generation(_)));
        assert!(!failed.is_unavailable());
    }

    #[test]
    fn test_messages() {
        assert_eq!(AskError::Cancelled.to_string(), "Request cancelled");
        assert!(
            AskError::Retrieval(DomainError::embedding("timeout"))
                .to_string()
                .contains("timeout")
        );
    }
}
