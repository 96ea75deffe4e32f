//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, ChunkingSettings, EmbeddingSettings, LogFormat, LoggingConfig, PlannerSettings,
    ProviderSettings, RetrievalSettings, StoreSettings,
};
