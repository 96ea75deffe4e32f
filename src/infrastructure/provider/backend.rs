//! `AiProvider` backed by a wire-level chat client

use async_trait::async_trait;
use tracing::debug;

use crate::domain::llm::{LlmProvider, LlmRequest};
use crate::domain::provider::{
    AiProvider, Generation, GenerationOptions, Prompt, ProviderDescriptor,
};
use crate::domain::DomainError;

/// Combines a descriptor with the chat client for its protocol.
///
/// A provider without credentials has no client; it reports itself as
/// unconfigured and never touches the network.
#[derive(Debug)]
pub struct HttpAiProvider {
    descriptor: ProviderDescriptor,
    client: Option<Box<dyn LlmProvider>>,
}

impl HttpAiProvider {
    pub fn new(descriptor: ProviderDescriptor, client: Box<dyn LlmProvider>) -> Self {
        Self {
            descriptor,
            client: Some(client),
        }
    }

    pub fn unconfigured(descriptor: ProviderDescriptor) -> Self {
        Self {
            descriptor,
            client: None,
        }
    }

    fn client(&self) -> Result<&dyn LlmProvider, DomainError> {
        self.client.as_deref().ok_or_else(|| {
            DomainError::provider(
                self.descriptor.kind.as_str(),
                format!("{} is not set", self.descriptor.kind.api_key_env()),
            )
        })
    }
}

#[async_trait]
impl AiProvider for HttpAiProvider {
    fn descriptor(&self) -> &ProviderDescriptor {
        &self.descriptor
    }

    fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    async fn check_reachable(&self) -> bool {
        let Ok(client) = self.client() else {
            return false;
        };

        match client.ping().await {
            Ok(()) => true,
            Err(e) => {
                debug!(provider = %self.descriptor.kind, error = %e, "Reachability probe failed");
                false
            }
        }
    }

    async fn generate(
        &self,
        prompt: &Prompt,
        options: GenerationOptions,
    ) -> Result<Generation, DomainError> {
        let client = self.client()?;
        let (temperature, max_tokens) = options.resolve(&self.descriptor);

        let mut builder = LlmRequest::builder();
        if let Some(system) = &prompt.system {
            builder = builder.system(system.clone());
        }
        let request = builder
            .user(prompt.user.clone())
            .temperature(temperature)
            .max_tokens(max_tokens)
            .build();

        let response = client.chat(&self.descriptor.model, request).await?;

        if response.content().trim().is_empty() {
            return Err(DomainError::provider(
                self.descriptor.kind.as_str(),
                "Empty completion",
            ));
        }

        Ok(Generation {
            text: response.content().to_string(),
            provider: self.descriptor.kind,
            model: self.descriptor.model.clone(),
            usage: response.usage,
        })
    }
}
