//! Document ingestion and knowledge search

use std::sync::Arc;
use std::time::Instant;

use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::ingestion::{ChunkingConfig, ChunkingStrategy, IngestionError};
use crate::domain::knowledge::{
    KnowledgeChunk, KnowledgeDocument, KnowledgeStore, NewChunk, NewDocument, SearchHit,
    SearchParams,
};
use crate::domain::DomainError;
use crate::infrastructure::embedding::EmbeddingClient;

const DEFAULT_EMBEDDING_CONCURRENCY: usize = 4;

/// Chunks, embeds and stores documents; embeds queries for search.
///
/// Ingestion is all-or-nothing: the document and its chunks are written in
/// a single store call only after every chunk has been embedded.
#[derive(Clone)]
pub struct KnowledgeService {
    store: Arc<dyn KnowledgeStore>,
    embeddings: Arc<EmbeddingClient>,
    chunker: Arc<dyn ChunkingStrategy>,
    chunking: ChunkingConfig,
    concurrency: usize,
    search_params: SearchParams,
}

impl std::fmt::Debug for KnowledgeService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KnowledgeService")
            .field("store", &self.store.store_name())
            .field("embeddings", &self.embeddings)
            .field("chunker", &self.chunker.name())
            .field("chunking", &self.chunking)
            .field("concurrency", &self.concurrency)
            .field("search_params", &self.search_params)
            .finish()
    }
}

impl KnowledgeService {
    pub fn new(
        store: Arc<dyn KnowledgeStore>,
        embeddings: Arc<EmbeddingClient>,
        chunker: Arc<dyn ChunkingStrategy>,
        chunking: ChunkingConfig,
    ) -> Self {
        Self {
            store,
            embeddings,
            chunker,
            chunking,
            concurrency: DEFAULT_EMBEDDING_CONCURRENCY,
            search_params: SearchParams::default(),
        }
    }

    /// Maximum chunk embeddings in flight per document (at least 1)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_search_params(mut self, params: SearchParams) -> Self {
        self.search_params = params;
        self
    }

    pub fn store(&self) -> &Arc<dyn KnowledgeStore> {
        &self.store
    }

    pub fn embeddings(&self) -> &Arc<EmbeddingClient> {
        &self.embeddings
    }

    /// Ingest a document and return its ID
    pub async fn add_document(&self, document: NewDocument) -> Result<Uuid, IngestionError> {
        self.ingest(document).await.map(|doc| doc.id())
    }

    /// Ingest a document and return the stored record
    pub async fn ingest(&self, document: NewDocument) -> Result<KnowledgeDocument, IngestionError> {
        let started = Instant::now();

        document.validate().map_err(IngestionError::validation)?;
        self.chunking.validate().map_err(IngestionError::chunking)?;

        let chunks = self
            .chunker
            .chunk(&document.content, &self.chunking)
            .map_err(IngestionError::chunking)?;

        if chunks.is_empty() {
            return Err(IngestionError::chunking(DomainError::chunking(format!(
                "Document '{}' produced no chunks of at least {} characters",
                document.title, self.chunking.min_chunk_chars
            ))));
        }

        debug!(
            title = %document.title,
            chunker = self.chunker.name(),
            chunks = chunks.len(),
            "Document chunked"
        );

        let embeddings = self.embeddings.clone();
        let vectors: Vec<Vec<f32>> = stream::iter(chunks.iter().map(|chunk| {
            let embeddings = embeddings.clone();
            let content = chunk.content.clone();
            async move { embeddings.embed(&content).await }
        }))
        .buffered(self.concurrency)
        .try_collect()
        .await
        .map_err(|e| {
            warn!(title = %document.title, error = %e, "Chunk embedding failed; nothing stored");
            IngestionError::embedding(e)
        })?;

        let new_chunks: Vec<NewChunk> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, embedding)| {
                NewChunk::new(chunk.index, chunk.content, chunk.token_estimate, embedding)
            })
            .collect();
        let chunk_count = new_chunks.len();

        let stored = self
            .store
            .insert_document(document, new_chunks)
            .await
            .map_err(IngestionError::store)?;

        info!(
            document_id = %stored.id(),
            title = %stored.title(),
            chunks = chunk_count,
            duration_ms = started.elapsed().as_millis() as u64,
            "Document ingested"
        );

        Ok(stored)
    }

    /// Search with the configured limit and threshold
    pub async fn search(&self, query: &str) -> Result<Vec<SearchHit>, DomainError> {
        self.search_with(query, self.search_params).await
    }

    pub async fn search_with(
        &self,
        query: &str,
        params: SearchParams,
    ) -> Result<Vec<SearchHit>, DomainError> {
        let vector = self.embeddings.embed(query).await?;
        self.store.search(&vector, params).await
    }

    pub async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError> {
        let deleted = self.store.delete_document(id).await?;

        if deleted {
            info!(document_id = %id, "Document deleted");
        }

        Ok(deleted)
    }

    pub async fn list_documents(&self) -> Result<Vec<KnowledgeDocument>, DomainError> {
        self.store.list_documents().await
    }

    pub async fn get_document(&self, id: Uuid) -> Result<Option<KnowledgeDocument>, DomainError> {
        self.store.get_document(id).await
    }

    pub async fn document_chunks(&self, id: Uuid) -> Result<Vec<KnowledgeChunk>, DomainError> {
        self.store.document_chunks(id).await
    }
}
