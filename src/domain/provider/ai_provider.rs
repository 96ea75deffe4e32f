//! The text-generation provider contract

use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;

use super::{ProviderDescriptor, ProviderKind};
use crate::domain::llm::Usage;
use crate::domain::DomainError;

/// A prompt split into an optional system instruction and the user turn
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: Option<String>,
    pub user: String,
}

impl Prompt {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            system: None,
            user: text.into(),
        }
    }

    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}

/// Per-call overrides; unset values fall back to the descriptor defaults
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GenerationOptions {
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl GenerationOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Effective temperature and max tokens for a provider
    pub fn resolve(&self, descriptor: &ProviderDescriptor) -> (f32, u32) {
        (
            self.temperature.unwrap_or(descriptor.default_temperature),
            self.max_tokens.unwrap_or(descriptor.default_max_tokens),
        )
    }
}

/// Generated text with the provider that produced it
#[derive(Debug, Clone, Serialize)]
pub struct Generation {
    pub text: String,
    pub provider: ProviderKind,
    pub model: String,
    pub usage: Option<Usage>,
}

/// An interchangeable text-generation backend
#[async_trait]
pub trait AiProvider: Send + Sync + Debug {
    fn kind(&self) -> ProviderKind {
        self.descriptor().kind
    }

    fn descriptor(&self) -> &ProviderDescriptor;

    /// Whether a credential is present. Local check, no network.
    fn is_configured(&self) -> bool;

    /// Probe the backend with a short timeout; any failure yields `false`
    async fn check_reachable(&self) -> bool;

    async fn generate(
        &self,
        prompt: &Prompt,
        options: GenerationOptions,
    ) -> Result<Generation, DomainError>;

    /// Cost in USD for a call of the given size
    fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
        self.descriptor()
            .pricing
            .calculate_cost_usd(input_tokens, output_tokens)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scriptable provider: configured/reachable flags, canned text or error
    #[derive(Debug)]
    pub struct MockAiProvider {
        descriptor: ProviderDescriptor,
        configured: bool,
        reachable: bool,
        text: String,
        error: Option<String>,
        flat_cost: Option<f64>,
        probes: AtomicUsize,
        generations: AtomicUsize,
        last_prompt: Mutex<Option<Prompt>>,
    }

    impl MockAiProvider {
        pub fn new(kind: ProviderKind) -> Self {
            Self {
                descriptor: ProviderDescriptor::builtin(kind),
                configured: true,
                reachable: true,
                text: format!("answer from {}", kind),
                error: None,
                flat_cost: None,
                probes: AtomicUsize::new(0),
                generations: AtomicUsize::new(0),
                last_prompt: Mutex::new(None),
            }
        }

        pub fn unconfigured(kind: ProviderKind) -> Self {
            Self::new(kind).with_configured(false)
        }

        pub fn unreachable(kind: ProviderKind) -> Self {
            Self::new(kind).with_reachable(false)
        }

        pub fn with_configured(mut self, configured: bool) -> Self {
            self.configured = configured;
            self
        }

        pub fn with_reachable(mut self, reachable: bool) -> Self {
            self.reachable = reachable;
            self
        }

        pub fn with_text(mut self, text: impl Into<String>) -> Self {
            self.text = text.into();
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        /// Every call costs `cost`, whatever its size
        pub fn with_flat_cost(mut self, cost: f64) -> Self {
            self.flat_cost = Some(cost);
            self
        }

        pub fn probes(&self) -> usize {
            self.probes.load(Ordering::SeqCst)
        }

        pub fn generations(&self) -> usize {
            self.generations.load(Ordering::SeqCst)
        }

        pub fn last_prompt(&self) -> Option<Prompt> {
            self.last_prompt.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AiProvider for MockAiProvider {
        fn descriptor(&self) -> &ProviderDescriptor {
            &self.descriptor
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn check_reachable(&self) -> bool {
            self.probes.fetch_add(1, Ordering::SeqCst);
            self.reachable
        }

        async fn generate(
            &self,
            prompt: &Prompt,
            _options: GenerationOptions,
        ) -> Result<Generation, DomainError> {
            self.generations.fetch_add(1, Ordering::SeqCst);
            *self.last_prompt.lock().unwrap() = Some(prompt.clone());

            if let Some(ref error) = self.error {
                return Err(DomainError::provider(self.descriptor.kind.as_str(), error));
            }

            Ok(Generation {
                text: self.text.clone(),
                provider: self.descriptor.kind,
                model: self.descriptor.model.clone(),
                usage: Some(Usage::new(100, 20)),
            })
        }

        fn estimate_cost(&self, input_tokens: u64, output_tokens: u64) -> f64 {
            match self.flat_cost {
                Some(cost) => cost,
                None => self
                    .descriptor
                    .pricing
                    .calculate_cost_usd(input_tokens, output_tokens),
            }
        }
    }
}
