//! Text-generation providers: identities, descriptors and task mapping

mod ai_provider;
mod descriptor;
mod kind;
mod mapping;

pub use ai_provider::{AiProvider, Generation, GenerationOptions, Prompt};
pub use descriptor::ProviderDescriptor;
pub use kind::{Capability, ProviderKind};
pub use mapping::{ToolProviderMapping, ANSWERING_TASK};

#[cfg(test)]
pub use ai_provider::mock::MockAiProvider;
