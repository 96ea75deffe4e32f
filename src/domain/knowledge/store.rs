//! Knowledge store trait

use async_trait::async_trait;
use uuid::Uuid;

use super::{KnowledgeChunk, KnowledgeDocument, NewChunk, NewDocument, SearchHit, SearchParams};
use crate::domain::error::DomainError;

#[cfg(test)]
use mockall::automock;

/// Persistence and similarity search for documents and their chunks
#[cfg_attr(test, automock)]
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Store identifier for logging
    fn store_name(&self) -> &'static str;

    /// Inserts a document and all of its chunks atomically
    async fn insert_document(
        &self,
        document: NewDocument,
        chunks: Vec<NewChunk>,
    ) -> Result<KnowledgeDocument, DomainError>;

    /// Finds the chunks most similar to the query vector, best first
    async fn search(
        &self,
        query: &[f32],
        params: SearchParams,
    ) -> Result<Vec<SearchHit>, DomainError>;

    /// Deletes a document and its chunks; returns whether it existed
    async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError>;

    /// Lists all documents, newest first
    async fn list_documents(&self) -> Result<Vec<KnowledgeDocument>, DomainError>;

    /// Finds a document by ID
    async fn get_document(&self, id: Uuid) -> Result<Option<KnowledgeDocument>, DomainError>;

    /// Chunks of a document in `chunk_index` order
    async fn document_chunks(&self, id: Uuid) -> Result<Vec<KnowledgeChunk>, DomainError>;

    /// Checks that the backing store is reachable
    async fn health_check(&self) -> Result<bool, DomainError>;

    /// Creates tables and indexes when missing
    async fn ensure_schema(&self) -> Result<(), DomainError>;
}
