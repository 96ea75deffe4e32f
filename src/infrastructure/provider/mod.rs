//! Text-generation providers: HTTP-backed implementations, registry and manager

mod backend;
mod builtin;
mod manager;
mod registry;

pub use backend::HttpAiProvider;
pub use builtin::{build_builtin_providers, ApiKeys, BuiltinProviderSettings};
pub use manager::{ProviderManager, ProviderStatus};
pub use registry::{ProviderRegistry, ProviderRegistryBuilder};
