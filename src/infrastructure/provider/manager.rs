//! Task-based provider selection with fallback

use std::fmt;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::registry::ProviderRegistry;
use crate::domain::provider::{AiProvider, ProviderKind, ToolProviderMapping};
use crate::domain::DomainError;

/// Health snapshot of one provider
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProviderStatus {
    pub kind: ProviderKind,
    pub model: String,
    pub configured: bool,
    /// `None` when the provider is unconfigured and was not probed
    pub reachable: Option<bool>,
}

/// Picks the provider that serves a task type.
///
/// The chain for a task is its mapped provider followed by the global
/// fallback order, without duplicates. Candidates are probed one at a
/// time; the first configured and reachable one wins.
#[derive(Clone)]
pub struct ProviderManager {
    registry: Arc<ProviderRegistry>,
    mapping: Arc<ToolProviderMapping>,
}

impl fmt::Debug for ProviderManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderManager")
            .field("registry", &self.registry)
            .field("tasks", &self.mapping.len())
            .field("default_provider", &self.mapping.default_provider())
            .finish()
    }
}

impl ProviderManager {
    pub fn new(registry: Arc<ProviderRegistry>, mapping: Arc<ToolProviderMapping>) -> Self {
        Self { registry, mapping }
    }

    pub fn registry(&self) -> &ProviderRegistry {
        &self.registry
    }

    pub fn mapping(&self) -> &ToolProviderMapping {
        &self.mapping
    }

    /// Candidate order for a task, restricted to registered kinds
    pub fn fallback_chain(&self, task_type: &str) -> Vec<ProviderKind> {
        let preferred = self.mapping.preferred(task_type);
        let mut chain = Vec::with_capacity(1 + ProviderKind::FALLBACK_ORDER.len());

        for kind in std::iter::once(preferred).chain(ProviderKind::FALLBACK_ORDER) {
            if !chain.contains(&kind) && self.registry.contains(kind) {
                chain.push(kind);
            }
        }

        chain
    }

    /// First configured and reachable provider in the task's chain
    pub async fn resolve_provider(
        &self,
        task_type: &str,
    ) -> Result<Arc<dyn AiProvider>, DomainError> {
        let chain = self.fallback_chain(task_type);
        let mut tried = Vec::with_capacity(chain.len());

        for (position, kind) in chain.into_iter().enumerate() {
            let Some(provider) = self.registry.get(kind) else {
                continue;
            };
            tried.push(kind.as_str().to_string());

            if !provider.is_configured() {
                debug!(task_type = %task_type, provider = %kind, "Skipping unconfigured provider");
                continue;
            }

            if !provider.check_reachable().await {
                warn!(task_type = %task_type, provider = %kind, "Provider unreachable, trying next");
                continue;
            }

            if position > 0 {
                info!(task_type = %task_type, provider = %kind, "Using fallback provider");
            } else {
                debug!(task_type = %task_type, provider = %kind, "Using mapped provider");
            }

            return Ok(provider);
        }

        warn!(task_type = %task_type, tried = ?tried, "No provider available");
        Err(DomainError::no_provider_available(task_type, tried))
    }

    /// Offline cost of a call on the task's mapped provider.
    ///
    /// Fallback is not considered: the estimate always uses the mapping.
    pub fn estimate_cost(&self, task_type: &str, input_tokens: u64, output_tokens: u64) -> f64 {
        let kind = self.mapping.preferred(task_type);

        self.registry.estimate_cost(kind, input_tokens, output_tokens)
    }

    /// Configured flag and probe result for every registered provider
    pub async fn provider_statuses(&self) -> Vec<ProviderStatus> {
        let probes = self.registry.providers().into_iter().map(|provider| async move {
            let configured = provider.is_configured();
            let reachable = if configured {
                Some(provider.check_reachable().await)
            } else {
                None
            };

            ProviderStatus {
                kind: provider.kind(),
                model: provider.descriptor().model.clone(),
                configured,
                reachable,
            }
        });

        join_all(probes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::provider::MockAiProvider;

    struct Fixture {
        manager: ProviderManager,
        deepseek: Arc<MockAiProvider>,
        openai: Arc<MockAiProvider>,
        groq: Arc<MockAiProvider>,
        anthropic: Arc<MockAiProvider>,
    }

    fn fixture(
        deepseek: MockAiProvider,
        openai: MockAiProvider,
        groq: MockAiProvider,
        anthropic: MockAiProvider,
    ) -> Fixture {
        let deepseek = Arc::new(deepseek);
        let openai = Arc::new(openai);
        let groq = Arc::new(groq);
        let anthropic = Arc::new(anthropic);

        let registry = ProviderRegistry::builder()
            .register(deepseek.clone())
            .register(openai.clone())
            .register(groq.clone())
            .register(anthropic.clone())
            .build();

        let mapping = ToolProviderMapping::defaults();

        Fixture {
            manager: ProviderManager::new(Arc::new(registry), Arc::new(mapping)),
            deepseek,
            openai,
            groq,
            anthropic,
        }
    }

    fn all_healthy() -> Fixture {
        fixture(
            MockAiProvider::new(ProviderKind::DeepSeek),
            MockAiProvider::new(ProviderKind::OpenAi),
            MockAiProvider::new(ProviderKind::Groq),
            MockAiProvider::new(ProviderKind::Anthropic),
        )
    }

    #[test]
    fn test_fallback_chain_deduplicates() {
        let f = all_healthy();

        assert_eq!(
            f.manager.fallback_chain("social_posts"),
            vec![ProviderKind::Groq, ProviderKind::DeepSeek, ProviderKind::Anthropic]
        );
        assert_eq!(
            f.manager.fallback_chain("icp"),
            vec![ProviderKind::DeepSeek, ProviderKind::Anthropic]
        );
        assert_eq!(
            f.manager.fallback_chain("strategy"),
            vec![ProviderKind::Anthropic, ProviderKind::DeepSeek]
        );
    }

    #[test]
    fn test_unknown_task_uses_default_provider() {
        let f = all_healthy();

        assert_eq!(
            f.manager.fallback_chain("not_a_task"),
            vec![ProviderKind::DeepSeek, ProviderKind::Anthropic]
        );
    }

    #[test]
    fn test_fallback_chain_skips_unregistered() {
        let registry = ProviderRegistry::builder()
            .register(Arc::new(MockAiProvider::new(ProviderKind::Anthropic)))
            .build();
        let manager = ProviderManager::new(
            Arc::new(registry),
            Arc::new(ToolProviderMapping::defaults()),
        );

        assert_eq!(
            manager.fallback_chain("social_posts"),
            vec![ProviderKind::Anthropic]
        );
    }

    #[tokio::test]
    async fn test_resolve_prefers_mapped_provider() {
        let f = all_healthy();

        let provider = f.manager.resolve_provider("landing_page").await.unwrap();

        assert_eq!(provider.kind(), ProviderKind::OpenAi);
        assert_eq!(f.openai.probes(), 1);
        assert_eq!(f.deepseek.probes(), 0);
    }

    #[tokio::test]
    async fn test_resolve_falls_back_when_unreachable() {
        let f = fixture(
            MockAiProvider::new(ProviderKind::DeepSeek),
            MockAiProvider::new(ProviderKind::OpenAi),
            MockAiProvider::unreachable(ProviderKind::Groq),
            MockAiProvider::new(ProviderKind::Anthropic),
        );

        let provider = f.manager.resolve_provider("social_posts").await.unwrap();

        assert_eq!(provider.kind(), ProviderKind::DeepSeek);
        assert_eq!(f.groq.probes(), 1);
        assert_eq!(f.anthropic.probes(), 0);
    }

    #[tokio::test]
    async fn test_resolve_skips_unconfigured_without_probing() {
        let f = fixture(
            MockAiProvider::unconfigured(ProviderKind::DeepSeek),
            MockAiProvider::new(ProviderKind::OpenAi),
            MockAiProvider::new(ProviderKind::Groq),
            MockAiProvider::new(ProviderKind::Anthropic),
        );

        let provider = f.manager.resolve_provider("icp").await.unwrap();

        assert_eq!(provider.kind(), ProviderKind::Anthropic);
        assert_eq!(f.deepseek.probes(), 0);
    }

    #[tokio::test]
    async fn test_resolve_never_leaves_the_chain() {
        let f = fixture(
            MockAiProvider::unconfigured(ProviderKind::DeepSeek),
            MockAiProvider::new(ProviderKind::OpenAi),
            MockAiProvider::new(ProviderKind::Groq),
            MockAiProvider::unreachable(ProviderKind::Anthropic),
        );

        let err = f.manager.resolve_provider("icp").await.unwrap_err();

        assert!(err.is_no_provider_available());
        assert!(err.to_string().contains("deepseek, anthropic"));
        assert_eq!(f.openai.probes(), 0);
        assert_eq!(f.groq.probes(), 0);
    }

    #[tokio::test]
    async fn test_resolve_with_empty_registry() {
        let manager = ProviderManager::new(
            Arc::new(ProviderRegistry::builder().build()),
            Arc::new(ToolProviderMapping::defaults()),
        );

        let err = manager.resolve_provider("answering").await.unwrap_err();

        assert!(err.is_no_provider_available());
    }

    #[test]
    fn test_estimate_cost_uses_mapping_only() {
        let f = fixture(
            MockAiProvider::new(ProviderKind::DeepSeek),
            MockAiProvider::new(ProviderKind::OpenAi),
            MockAiProvider::unconfigured(ProviderKind::Groq),
            MockAiProvider::new(ProviderKind::Anthropic),
        );

        let groq_cost = f.manager.estimate_cost("social_posts", 1_000_000, 1_000_000);
        assert!((groq_cost - (0.59 + 0.79)).abs() < 1e-9);

        let anthropic_cost = f.manager.estimate_cost("strategy", 1_000_000, 0);
        assert!((anthropic_cost - 3.0).abs() < 1e-9);
        assert_eq!(f.groq.probes(), 0);
    }

    #[test]
    fn test_estimate_cost_uses_provider_estimate() {
        let f = fixture(
            MockAiProvider::new(ProviderKind::DeepSeek).with_flat_cost(42.0),
            MockAiProvider::new(ProviderKind::OpenAi),
            MockAiProvider::new(ProviderKind::Groq),
            MockAiProvider::new(ProviderKind::Anthropic),
        );

        assert_eq!(f.manager.estimate_cost("icp", 1, 1), 42.0);
        assert_eq!(f.deepseek.probes(), 0);
    }

    #[tokio::test]
    async fn test_provider_statuses() {
        let f = fixture(
            MockAiProvider::new(ProviderKind::DeepSeek),
            MockAiProvider::unconfigured(ProviderKind::OpenAi),
            MockAiProvider::unreachable(ProviderKind::Groq),
            MockAiProvider::new(ProviderKind::Anthropic),
        );

        let statuses = f.manager.provider_statuses().await;

        assert_eq!(statuses.len(), 4);
        assert_eq!(statuses[0].kind, ProviderKind::DeepSeek);
        assert_eq!(statuses[0].reachable, Some(true));
        assert_eq!(statuses[1].reachable, None);
        assert!(!statuses[1].configured);
        assert_eq!(statuses[2].reachable, Some(false));
        assert_eq!(f.openai.probes(), 0);
    }
}
