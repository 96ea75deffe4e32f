//! Knowledge base domain: documents, chunks and similarity search

mod document;
mod search;
mod store;

pub use document::{KnowledgeChunk, KnowledgeDocument, NewChunk, NewDocument};
pub use search::{rank_hits, SearchHit, SearchParams};
pub use store::KnowledgeStore;

#[cfg(test)]
pub use store::MockKnowledgeStore;
