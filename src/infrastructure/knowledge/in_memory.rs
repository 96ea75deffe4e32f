//! In-memory knowledge store for development and testing

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::embedding::cosine_similarity;
use crate::domain::knowledge::{
    rank_hits, KnowledgeChunk, KnowledgeDocument, KnowledgeStore, NewChunk, NewDocument,
    SearchHit, SearchParams,
};
use crate::domain::DomainError;

/// Exact cosine scan over every stored chunk
#[derive(Debug)]
pub struct InMemoryKnowledgeStore {
    dimensions: usize,
    entries: RwLock<Vec<Entry>>,
}

#[derive(Debug, Clone)]
struct Entry {
    document: KnowledgeDocument,
    chunks: Vec<KnowledgeChunk>,
}

impl InMemoryKnowledgeStore {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            entries: RwLock::new(Vec::new()),
        }
    }

    fn check_dimensions(&self, vector: &[f32]) -> Result<(), DomainError> {
        if vector.len() != self.dimensions {
            return Err(DomainError::store(format!(
                "Expected {}-dimensional vector, got {}",
                self.dimensions,
                vector.len()
            )));
        }

        Ok(())
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    fn store_name(&self) -> &'static str {
        "in_memory"
    }

    async fn insert_document(
        &self,
        document: NewDocument,
        chunks: Vec<NewChunk>,
    ) -> Result<KnowledgeDocument, DomainError> {
        for chunk in &chunks {
            self.check_dimensions(&chunk.embedding)?;
        }

        let id = Uuid::new_v4();
        let stored = KnowledgeDocument::from_new(id, document, chunks.len());
        let mut chunks: Vec<KnowledgeChunk> =
            chunks.into_iter().map(|c| c.into_stored(id)).collect();
        chunks.sort_by_key(|c| c.chunk_index);

        self.entries.write().await.push(Entry {
            document: stored.clone(),
            chunks,
        });

        Ok(stored)
    }

    async fn search(
        &self,
        query: &[f32],
        params: SearchParams,
    ) -> Result<Vec<SearchHit>, DomainError> {
        self.check_dimensions(query)?;

        if params.limit == 0 {
            return Ok(Vec::new());
        }

        let hits: Vec<SearchHit> = {
            let entries = self.entries.read().await;

            entries
                .iter()
                .flat_map(|entry| entry.chunks.iter().map(move |c| (&entry.document, c)))
                .filter_map(|(doc, chunk)| {
                    let similarity = cosine_similarity(query, &chunk.embedding);
                    params.accepts(similarity).then(|| SearchHit {
                        chunk_id: chunk.id,
                        document_id: doc.id(),
                        chunk_index: chunk.chunk_index,
                        content: chunk.content.clone(),
                        similarity,
                        title: doc.title().to_string(),
                        source_url: doc.source_url().map(str::to_string),
                        tags: doc.tags().to_vec(),
                    })
                })
                .collect()
        };

        Ok(rank_hits(hits, params.limit))
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|entry| entry.document.id() != id);

        Ok(entries.len() < before)
    }

    async fn list_documents(&self) -> Result<Vec<KnowledgeDocument>, DomainError> {
        let entries = self.entries.read().await;

        Ok(entries.iter().rev().map(|e| e.document.clone()).collect())
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<KnowledgeDocument>, DomainError> {
        let entries = self.entries.read().await;

        Ok(entries
            .iter()
            .find(|e| e.document.id() == id)
            .map(|e| e.document.clone()))
    }

    async fn document_chunks(&self, id: Uuid) -> Result<Vec<KnowledgeChunk>, DomainError> {
        let entries = self.entries.read().await;

        Ok(entries
            .iter()
            .find(|e| e.document.id() == id)
            .map(|e| e.chunks.clone())
            .unwrap_or_default())
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        Ok(true)
    }

    async fn ensure_schema(&self) -> Result<(), DomainError> {
        Ok(())
    }
}
