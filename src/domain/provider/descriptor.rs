//! Static description of a provider: model, pricing, capabilities and defaults

use serde::Serialize;

use super::{Capability, ProviderKind};
use crate::domain::usage::TokenPricing;

#[derive(Debug, Clone, Serialize)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub model: String,
    pub pricing: TokenPricing,
    pub capabilities: Vec<Capability>,
    pub default_temperature: f32,
    pub default_max_tokens: u32,
}

impl ProviderDescriptor {
    pub fn new(kind: ProviderKind, model: impl Into<String>, pricing: TokenPricing) -> Self {
        Self {
            kind,
            model: model.into(),
            pricing,
            capabilities: vec![Capability::Chat],
            default_temperature: 0.7,
            default_max_tokens: 2048,
        }
    }

    pub fn with_capabilities(mut self, capabilities: impl Into<Vec<Capability>>) -> Self {
        self.capabilities = capabilities.into();
        self
    }

    pub fn with_defaults(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.default_temperature = temperature;
        self.default_max_tokens = max_tokens;
        self
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    /// Descriptor for a built-in provider
    pub fn builtin(kind: ProviderKind) -> Self {
        use Capability::*;

        match kind {
            ProviderKind::DeepSeek => Self::new(
                kind,
                "deepseek-chat",
                TokenPricing::per_million(0.14, 0.28),
            )
            .with_capabilities([Chat, Code, Json]),
            ProviderKind::OpenAi => {
                Self::new(kind, "gpt-4o-mini", TokenPricing::per_million(0.15, 0.60))
                    .with_capabilities([Chat, Json, Code])
            }
            ProviderKind::Groq => Self::new(
                kind,
                "llama-3.1-70b-versatile",
                TokenPricing::per_million(0.59, 0.79),
            )
            .with_capabilities([Chat, Fast]),
            ProviderKind::Anthropic => Self::new(
                kind,
                "claude-3-5-sonnet-20241022",
                TokenPricing::per_million(3.00, 15.00),
            )
            .with_capabilities([Chat, Reasoning, LongContext])
            .with_defaults(0.7, 4096),
        }
    }
}
