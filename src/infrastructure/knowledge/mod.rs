//! Knowledge store implementations

mod factory;
mod in_memory;
mod pgvector;

pub use factory::{KnowledgeStoreConfig, KnowledgeStoreFactory, StoreType};
pub use in_memory::InMemoryKnowledgeStore;
pub use pgvector::{PgvectorConfig, PgvectorKnowledgeStore};
