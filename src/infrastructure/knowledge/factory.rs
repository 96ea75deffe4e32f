//! Knowledge store factory for runtime backend selection

use std::sync::Arc;

use tracing::info;

use crate::domain::knowledge::KnowledgeStore;
use crate::domain::DomainError;

use super::in_memory::InMemoryKnowledgeStore;
use super::pgvector::{PgvectorConfig, PgvectorKnowledgeStore};

/// Supported store backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreType {
    InMemory,
    Pgvector,
}

impl StoreType {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "pgvector" | "postgres" | "postgresql" | "pg" => Some(Self::Pgvector),
            _ => None,
        }
    }

    /// Whether stored documents outlive the process
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::Pgvector)
    }
}

/// Store configuration
#[derive(Debug, Clone)]
pub enum KnowledgeStoreConfig {
    InMemory { dimensions: usize },
    Pgvector(PgvectorConfig),
}

impl KnowledgeStoreConfig {
    pub fn store_type(&self) -> StoreType {
        match self {
            Self::InMemory { .. } => StoreType::InMemory,
            Self::Pgvector(_) => StoreType::Pgvector,
        }
    }
}

#[derive(Debug)]
pub struct KnowledgeStoreFactory;

impl KnowledgeStoreFactory {
    /// Create a store and make sure its schema exists
    pub async fn create(
        config: &KnowledgeStoreConfig,
    ) -> Result<Arc<dyn KnowledgeStore>, DomainError> {
        let store: Arc<dyn KnowledgeStore> = match config {
            KnowledgeStoreConfig::InMemory { dimensions } => {
                Arc::new(InMemoryKnowledgeStore::new(*dimensions))
            }
            KnowledgeStoreConfig::Pgvector(pg_config) => {
                Arc::new(PgvectorKnowledgeStore::connect(pg_config).await?)
            }
        };

        store.ensure_schema().await?;
        info!(store = store.store_name(), "Knowledge store ready");

        Ok(store)
    }
}
