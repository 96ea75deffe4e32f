//! Construction of the four built-in providers from credentials

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::backend::HttpAiProvider;
use crate::domain::llm::LlmProvider;
use crate::domain::provider::{AiProvider, ProviderDescriptor, ProviderKind};
use crate::domain::DomainError;
use crate::infrastructure::llm::{AnthropicProvider, HttpClient, OpenAiProvider};

/// API keys per provider. Values never appear in `Debug` output or logs.
#[derive(Clone, Default)]
pub struct ApiKeys {
    keys: HashMap<ProviderKind, String>,
}

impl ApiKeys {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read `DEEPSEEK_API_KEY`, `OPENAI_API_KEY`, `GROQ_API_KEY` and
    /// `ANTHROPIC_API_KEY`; empty values count as absent
    pub fn from_env() -> Self {
        ProviderKind::ALL
            .into_iter()
            .fold(Self::new(), |keys, kind| match env::var(kind.api_key_env()) {
                Ok(value) => keys.with_key(kind, value),
                Err(_) => keys,
            })
    }

    pub fn with_key(mut self, kind: ProviderKind, key: impl Into<String>) -> Self {
        let key = key.into();
        if key.trim().is_empty() {
            self.keys.remove(&kind);
        } else {
            self.keys.insert(kind, key.trim().to_string());
        }
        self
    }

    pub fn get(&self, kind: ProviderKind) -> Option<&str> {
        self.keys.get(&kind).map(String::as_str)
    }

    pub fn contains(&self, kind: ProviderKind) -> bool {
        self.keys.contains_key(&kind)
    }
}

impl fmt::Debug for ApiKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut present: Vec<&str> = self.keys.keys().map(|k| k.as_str()).collect();
        present.sort_unstable();
        f.debug_struct("ApiKeys").field("present", &present).finish()
    }
}

/// Transport settings shared by the built-in providers
#[derive(Debug, Clone)]
pub struct BuiltinProviderSettings {
    pub request_timeout: Duration,
    pub probe_timeout: Duration,
    /// Per-provider base URL overrides
    pub base_urls: HashMap<ProviderKind, String>,
    /// Per-provider model overrides
    pub models: HashMap<ProviderKind, String>,
}

impl Default for BuiltinProviderSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(60),
            probe_timeout: Duration::from_secs(5),
            base_urls: HashMap::new(),
            models: HashMap::new(),
        }
    }
}

impl BuiltinProviderSettings {
    pub fn base_url(&self, kind: ProviderKind) -> &str {
        self.base_urls
            .get(&kind)
            .map(String::as_str)
            .unwrap_or_else(|| kind.default_base_url())
    }

    pub fn descriptor(&self, kind: ProviderKind) -> ProviderDescriptor {
        let mut descriptor = ProviderDescriptor::builtin(kind);
        if let Some(model) = self.models.get(&kind) {
            descriptor.model = model.clone();
        }
        descriptor
    }
}

/// Build every built-in provider. Providers without a key are still
/// returned, in an unconfigured state.
pub fn build_builtin_providers(
    settings: &BuiltinProviderSettings,
    keys: &ApiKeys,
) -> Result<Vec<Arc<dyn AiProvider>>, DomainError> {
    let http = HttpClient::with_timeout(settings.request_timeout)?;

    let providers: Vec<Arc<dyn AiProvider>> = ProviderKind::ALL
        .into_iter()
        .map(|kind| {
            let descriptor = settings.descriptor(kind);

            let provider = match keys.get(kind) {
                Some(key) => {
                    let client = chat_client(kind, http.clone(), key, settings);
                    HttpAiProvider::new(descriptor, client)
                }
                None => {
                    debug!(provider = %kind, env = kind.api_key_env(), "No API key; provider unconfigured");
                    HttpAiProvider::unconfigured(descriptor)
                }
            };

            Arc::new(provider) as Arc<dyn AiProvider>
        })
        .collect();

    let configured: Vec<&str> = providers
        .iter()
        .filter(|p| p.is_configured())
        .map(|p| p.kind().as_str())
        .collect();
    info!(configured = ?configured, "Built-in providers initialized");

    Ok(providers)
}

fn chat_client(
    kind: ProviderKind,
    http: HttpClient,
    key: &str,
    settings: &BuiltinProviderSettings,
) -> Box<dyn LlmProvider> {
    let base_url = settings.base_url(kind);

    if kind.is_openai_compatible() {
        Box::new(
            OpenAiProvider::with_base_url(http, key, base_url)
                .with_name(kind.as_str())
                .with_probe_timeout(settings.probe_timeout),
        )
    } else {
        Box::new(
            AnthropicProvider::with_base_url(http, key, base_url)
                .with_probe_timeout(settings.probe_timeout),
        )
    }
}
