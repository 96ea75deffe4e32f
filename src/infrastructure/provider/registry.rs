//! Provider registry
//!
//! Holds one provider per kind. Built once at startup and read-only
//! afterwards, so lookups need no locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::provider::{AiProvider, ProviderDescriptor, ProviderKind};

/// Frozen map from provider kind to provider
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn AiProvider>>,
}

impl ProviderRegistry {
    pub fn builder() -> ProviderRegistryBuilder {
        ProviderRegistryBuilder::default()
    }

    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn AiProvider>> {
        self.providers.get(&kind).cloned()
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.providers.contains_key(&kind)
    }

    /// Registered kinds in declaration order
    pub fn kinds(&self) -> Vec<ProviderKind> {
        let mut kinds: Vec<_> = self.providers.keys().copied().collect();
        kinds.sort();
        kinds
    }

    /// Registered providers in declaration order
    pub fn providers(&self) -> Vec<Arc<dyn AiProvider>> {
        self.kinds()
            .into_iter()
            .filter_map(|kind| self.get(kind))
            .collect()
    }

    /// Cost of a call on `kind`: the registered provider's own estimate,
    /// or the built-in pricing when the kind is not registered
    pub fn estimate_cost(&self, kind: ProviderKind, input_tokens: u64, output_tokens: u64) -> f64 {
        match self.providers.get(&kind) {
            Some(provider) => provider.estimate_cost(input_tokens, output_tokens),
            None => ProviderDescriptor::builtin(kind)
                .pricing
                .calculate_cost_usd(input_tokens, output_tokens),
        }
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.kinds())
            .finish()
    }
}

#[derive(Default)]
pub struct ProviderRegistryBuilder {
    providers: HashMap<ProviderKind, Arc<dyn AiProvider>>,
}

impl ProviderRegistryBuilder {
    /// Register a provider; a second registration for the same kind replaces the first
    pub fn register(mut self, provider: Arc<dyn AiProvider>) -> Self {
        let kind = provider.kind();

        if self.providers.insert(kind, provider).is_some() {
            warn!(provider = %kind, "Replacing previously registered provider");
        } else {
            debug!(provider = %kind, "Registered provider");
        }

        self
    }

    pub fn register_all(self, providers: impl IntoIterator<Item = Arc<dyn AiProvider>>) -> Self {
        providers.into_iter().fold(self, |builder, p| builder.register(p))
    }

    pub fn build(self) -> ProviderRegistry {
        ProviderRegistry {
            providers: self.providers,
        }
    }
}
