use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::ingestion::ChunkingConfig;
use crate::domain::knowledge::SearchParams;
use crate::domain::provider::ProviderKind;
use crate::domain::usage::{CostAssumptions, TokenPricing};
use crate::domain::DomainError;
use crate::infrastructure::knowledge::{KnowledgeStoreConfig, PgvectorConfig, StoreType};
use crate::infrastructure::provider::BuiltinProviderSettings;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub embedding: EmbeddingSettings,
    pub store: StoreSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub providers: ProviderSettings,
    pub planner: PlannerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

/// Embedding endpoint; the key is read from `OPENAI_API_KEY`
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub base_url: String,
    pub model: String,
    pub dimensions: usize,
    pub timeout_secs: u64,
    /// Cached vectors; 0 disables the cache
    pub cache_capacity: u64,
    /// Chunk embeddings in flight per document
    pub concurrency: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout_secs: 30,
            cache_capacity: 10_000,
            concurrency: 4,
        }
    }
}

impl EmbeddingSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `in_memory` or `pgvector`
    pub backend: String,
    /// Falls back to the `DATABASE_URL` environment variable
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout_secs: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            backend: "in_memory".to_string(),
            database_url: None,
            max_connections: 5,
            connect_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_tokens: usize,
    pub chars_per_token: usize,
    pub min_chunk_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        let defaults = ChunkingConfig::default();
        Self {
            max_tokens: defaults.max_tokens,
            chars_per_token: defaults.chars_per_token,
            min_chunk_chars: defaults.min_chunk_chars,
        }
    }
}

impl ChunkingSettings {
    pub fn to_config(&self) -> ChunkingConfig {
        ChunkingConfig::new(self.max_tokens)
            .with_chars_per_token(self.chars_per_token)
            .with_min_chunk_chars(self.min_chunk_chars)
    }
}

/// Search and ask use different limits and thresholds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub search_limit: usize,
    pub search_threshold: f32,
    pub ask_limit: usize,
    pub ask_threshold: f32,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            search_limit: 5,
            search_threshold: 0.7,
            ask_limit: 3,
            ask_threshold: 0.6,
        }
    }
}

impl RetrievalSettings {
    pub fn search_params(&self) -> SearchParams {
        SearchParams::new(self.search_limit, self.search_threshold)
    }

    pub fn ask_params(&self) -> SearchParams {
        SearchParams::new(self.ask_limit, self.ask_threshold)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    pub timeout_secs: u64,
    pub probe_timeout_secs: u64,
    /// JSON task-to-provider mapping merged over the defaults
    pub mapping_file: Option<PathBuf>,
    /// Base URL overrides keyed by provider name
    pub base_urls: HashMap<String, String>,
    /// Model overrides keyed by provider name
    pub models: HashMap<String, String>,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            probe_timeout_secs: 5,
            mapping_file: None,
            base_urls: HashMap::new(),
            models: HashMap::new(),
        }
    }
}

impl ProviderSettings {
    /// Resolve provider names; an unknown name is a configuration error
    pub fn to_builtin(&self) -> Result<BuiltinProviderSettings, DomainError> {
        Ok(BuiltinProviderSettings {
            request_timeout: Duration::from_secs(self.timeout_secs),
            probe_timeout: Duration::from_secs(self.probe_timeout_secs),
            base_urls: by_kind(&self.base_urls)?,
            models: by_kind(&self.models)?,
        })
    }
}

fn by_kind(values: &HashMap<String, String>) -> Result<HashMap<ProviderKind, String>, DomainError> {
    values
        .iter()
        .map(|(name, value)| Ok((ProviderKind::from_str(name)?, value.clone())))
        .collect()
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlannerSettings {
    pub legacy_price_per_million: f64,
    pub avg_tokens_per_call: u64,
    pub input_ratio: f64,
}

impl Default for PlannerSettings {
    fn default() -> Self {
        let defaults = CostAssumptions::default();
        Self {
            legacy_price_per_million: defaults.legacy_pricing.input_per_million(),
            avg_tokens_per_call: defaults.avg_tokens_per_call,
            input_ratio: defaults.input_ratio,
        }
    }
}

impl PlannerSettings {
    pub fn to_assumptions(&self) -> CostAssumptions {
        CostAssumptions {
            avg_tokens_per_call: self.avg_tokens_per_call,
            input_ratio: self.input_ratio,
            legacy_pricing: TokenPricing::flat(self.legacy_price_per_million),
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject values that would only fail later, at first use
    pub fn validate(&self) -> Result<(), DomainError> {
        self.chunking.to_config().validate()?;

        if self.embedding.dimensions == 0 {
            return Err(DomainError::configuration("embedding.dimensions must be positive"));
        }

        if StoreType::parse(&self.store.backend).is_none() {
            return Err(DomainError::configuration(format!(
                "Unknown store backend '{}'",
                self.store.backend
            )));
        }

        if !(0.0..=1.0).contains(&self.planner.input_ratio) {
            return Err(DomainError::configuration("planner.input_ratio must be within 0..=1"));
        }

        self.providers.to_builtin()?;

        Ok(())
    }

    /// Store configuration; pgvector needs a database URL from config or `DATABASE_URL`
    pub fn store_config(&self) -> Result<KnowledgeStoreConfig, DomainError> {
        let dimensions = self.embedding.dimensions;

        match StoreType::parse(&self.store.backend) {
            Some(StoreType::InMemory) => Ok(KnowledgeStoreConfig::InMemory { dimensions }),
            Some(StoreType::Pgvector) => {
                let url = self
                    .store
                    .database_url
                    .clone()
                    .or_else(|| std::env::var("DATABASE_URL").ok())
                    .ok_or_else(|| {
                        DomainError::configuration(
                            "store.database_url or DATABASE_URL is required for pgvector",
                        )
                    })?;

                Ok(KnowledgeStoreConfig::Pgvector(PgvectorConfig {
                    url,
                    max_connections: self.store.max_connections,
                    connect_timeout_secs: self.store.connect_timeout_secs,
                    dimensions,
                }))
            }
            None => Err(DomainError::configuration(format!(
                "Unknown store backend '{}'",
                self.store.backend
            ))),
        }
    }
}
