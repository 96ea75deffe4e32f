//! PostgreSQL + pgvector knowledge store

use std::collections::HashMap;
use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::knowledge::{
    KnowledgeChunk, KnowledgeDocument, KnowledgeStore, NewChunk, NewDocument, SearchHit,
    SearchParams,
};
use crate::domain::DomainError;

/// pgvector store configuration
#[derive(Debug, Clone)]
pub struct PgvectorConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Embedding dimensions of the vector column
    pub dimensions: usize,
}

impl PgvectorConfig {
    pub fn new(url: impl Into<String>, dimensions: usize) -> Self {
        Self {
            url: url.into(),
            max_connections: 10,
            connect_timeout_secs: 30,
            dimensions,
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Documents and chunks in two tables; chunks cascade on document delete.
/// Similarity search uses the `<=>` cosine distance operator.
pub struct PgvectorKnowledgeStore {
    pool: PgPool,
    dimensions: usize,
}

impl Debug for PgvectorKnowledgeStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgvectorKnowledgeStore")
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl PgvectorKnowledgeStore {
    pub fn new(pool: PgPool, dimensions: usize) -> Self {
        Self { pool, dimensions }
    }

    pub async fn connect(config: &PgvectorConfig) -> Result<Self, DomainError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| DomainError::store(format!("Failed to connect to PostgreSQL: {}", e)))?;

        Ok(Self::new(pool, config.dimensions))
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
impl KnowledgeStore for PgvectorKnowledgeStore {
    fn store_name(&self) -> &'static str {
        "pgvector"
    }

    async fn insert_document(
        &self,
        document: NewDocument,
        chunks: Vec<NewChunk>,
    ) -> Result<KnowledgeDocument, DomainError> {
        for chunk in &chunks {
            self.check_dimensions(&chunk.embedding)?;
        }

        let doc_id = Uuid::new_v4();
        let metadata_json = serde_json::to_value(&document.metadata)
            .map_err(|e| DomainError::store(format!("Failed to encode metadata: {}", e)))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::store(format!("Failed to begin transaction: {}", e)))?;

        let row = sqlx::query(
            r#"
            INSERT INTO knowledge_documents
            (id, title, content, source_url, source_type, tags, metadata, chunk_count)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING created_at
            "#,
        )
        .bind(doc_id)
        .bind(&document.title)
        .bind(&document.content)
        .bind(&document.source_url)
        .bind(&document.source_type)
        .bind(&document.tags)
        .bind(&metadata_json)
        .bind(chunks.len() as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| DomainError::store(format!("Failed to insert document: {}", e)))?;

        let created_at = row
            .try_get("created_at")
            .map_err(|e| DomainError::store(format!("Failed to read document row: {}", e)))?;

        for chunk in &chunks {
            sqlx::query(
                r#"
                INSERT INTO knowledge_chunks
                (id, document_id, chunk_index, content, token_count, embedding)
                VALUES ($1, $2, $3, $4, $5, $6::vector)
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(doc_id)
            .bind(chunk.chunk_index as i32)
            .bind(&chunk.content)
            .bind(chunk.token_count as i32)
            .bind(to_pgvector(&chunk.embedding))
            .execute(&mut *tx)
            .await
            .map_err(|e| DomainError::store(format!("Failed to insert chunk: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| DomainError::store(format!("Failed to commit document: {}", e)))?;

        debug!(document_id = %doc_id, chunks = chunks.len(), "Inserted document");

        Ok(KnowledgeDocument::from_new(doc_id, document, chunks.len()).with_created_at(created_at))
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

        let rows = sqlx::query(
            r#"
            SELECT c.id AS chunk_id, c.document_id, c.chunk_index, c.content,
                   d.title, d.source_url, d.tags,
                   1 - (c.embedding <=> $1::vector) AS similarity
            FROM knowledge_chunks c
            JOIN knowledge_documents d ON d.id = c.document_id
            WHERE (1 - (c.embedding <=> $1::vector))::real >= $2::real
            ORDER BY c.embedding <=> $1::vector
            LIMIT $3
            "#,
        )
        .bind(to_pgvector(query))
        .bind(params.threshold)
        .bind(params.limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::store(format!("Failed to search chunks: {}", e)))?;

        let hits = rows.iter().map(hit_from_row).collect::<Result<Vec<_>, _>>()?;

        // same f32 comparison as the in-memory store
        Ok(hits
            .into_iter()
            .filter(|hit| params.accepts(hit.similarity))
            .collect())
    }

    async fn delete_document(&self, id: Uuid) -> Result<bool, DomainError> {
        // Chunks are deleted via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM knowledge_documents WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::store(format!("Failed to delete document: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_documents(&self) -> Result<Vec<KnowledgeDocument>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, content, source_url, source_type, tags, metadata, chunk_count, created_at
            FROM knowledge_documents
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::store(format!("Failed to list documents: {}", e)))?;

        rows.iter().map(document_from_row).collect()
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<KnowledgeDocument>, DomainError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, source_url, source_type, tags, metadata, chunk_count, created_at
            FROM knowledge_documents
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::store(format!("Failed to get document: {}", e)))?;

        row.as_ref().map(document_from_row).transpose()
    }

    async fn document_chunks(&self, id: Uuid) -> Result<Vec<KnowledgeChunk>, DomainError> {
        let rows = sqlx::query(
            r#"
            SELECT id, document_id, chunk_index, content, token_count, embedding::text AS embedding
            FROM knowledge_chunks
            WHERE document_id = $1
            ORDER BY chunk_index
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DomainError::store(format!("Failed to get chunks: {}", e)))?;

        rows.iter().map(chunk_from_row).collect()
    }

    async fn health_check(&self) -> Result<bool, DomainError> {
        let result = sqlx::query("SELECT 1").fetch_one(&self.pool).await;

        Ok(result.is_ok())
    }

    async fn ensure_schema(&self) -> Result<(), DomainError> {
        sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
            .execute(&self.pool)
            .await
            .map_err(|e| {
                DomainError::store(format!("Failed to create vector extension: {}", e))
            })?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_documents (
                id UUID PRIMARY KEY,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                source_url TEXT,
                source_type TEXT NOT NULL,
                tags TEXT[] NOT NULL DEFAULT '{}',
                metadata JSONB NOT NULL DEFAULT '{}',
                chunk_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::store(format!("Failed to create documents table: {}", e)))?;

        let chunks_table = format!(
            r#"
            CREATE TABLE IF NOT EXISTS knowledge_chunks (
                id UUID PRIMARY KEY,
                document_id UUID NOT NULL REFERENCES knowledge_documents(id) ON DELETE CASCADE,
                chunk_index INTEGER NOT NULL,
                content TEXT NOT NULL,
                token_count INTEGER NOT NULL,
                embedding vector({}) NOT NULL,
                UNIQUE (document_id, chunk_index)
            )
            "#,
            self.dimensions
        );

        sqlx::query(&chunks_table)
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::store(format!("Failed to create chunks table: {}", e)))?;

        // HNSW needs pgvector >= 0.5; search still works without it
        if let Err(e) = sqlx::query(
            "CREATE INDEX IF NOT EXISTS knowledge_chunks_embedding_idx \
             ON knowledge_chunks USING hnsw (embedding vector_cosine_ops)",
        )
        .execute(&self.pool)
        .await
        {
            warn!(error = %e, "Could not create vector index");
        }

        Ok(())
    }
}

fn row_error(e: sqlx::Error) -> DomainError {
    DomainError::store(format!("Failed to decode row: {}", e))
}

fn document_from_row(row: &PgRow) -> Result<KnowledgeDocument, DomainError> {
    let metadata: serde_json::Value = row.try_get("metadata").map_err(row_error)?;
    let metadata = parse_metadata(metadata)?;
    let chunk_count: i32 = row.try_get("chunk_count").map_err(row_error)?;

    let document = NewDocument {
        title: row.try_get("title").map_err(row_error)?,
        content: row.try_get("content").map_err(row_error)?,
        source_url: row.try_get("source_url").map_err(row_error)?,
        source_type: row.try_get("source_type").map_err(row_error)?,
        tags: row.try_get("tags").map_err(row_error)?,
        metadata,
    };

    Ok(KnowledgeDocument::from_new(
        row.try_get("id").map_err(row_error)?,
        document,
        chunk_count.max(0) as usize,
    )
    .with_created_at(row.try_get("created_at").map_err(row_error)?))
}

fn parse_metadata(value: serde_json::Value) -> Result<HashMap<String, serde_json::Value>, DomainError> {
    if value.is_null() {
        return Ok(HashMap::new());
    }

    serde_json::from_value(value)
        .map_err(|e| DomainError::store(format!("Failed to decode document metadata: {}", e)))
}

fn hit_from_row(row: &PgRow) -> Result<SearchHit, DomainError> {
    let chunk_index: i32 = row.try_get("chunk_index").map_err(row_error)?;
    let similarity: f64 = row.try_get("similarity").map_err(row_error)?;

    Ok(SearchHit {
        chunk_id: row.try_get("chunk_id").map_err(row_error)?,
        document_id: row.try_get("document_id").map_err(row_error)?,
        chunk_index: chunk_index.max(0) as usize,
        content: row.try_get("content").map_err(row_error)?,
        similarity: similarity as f32,
        title: row.try_get("title").map_err(row_error)?,
        source_url: row.try_get("source_url").map_err(row_error)?,
        tags: row.try_get("tags").map_err(row_error)?,
    })
}

fn chunk_from_row(row: &PgRow) -> Result<KnowledgeChunk, DomainError> {
    let chunk_index: i32 = row.try_get("chunk_index").map_err(row_error)?;
    let token_count: i32 = row.try_get("token_count").map_err(row_error)?;
    let embedding: String = row.try_get("embedding").map_err(row_error)?;

    Ok(KnowledgeChunk {
        id: row.try_get("id").map_err(row_error)?,
        document_id: row.try_get("document_id").map_err(row_error)?,
        chunk_index: chunk_index.max(0) as usize,
        content: row.try_get("content").map_err(row_error)?,
        token_count: token_count.max(0) as usize,
        embedding: parse_pgvector(&embedding)?,
    })
}

/// Text literal accepted by a `::vector` cast
fn to_pgvector(embedding: &[f32]) -> String {
    format!(
        "[{}]",
        embedding
            .iter()
            .map(|f| f.to_string())
            .collect::<Vec<_>>()
            .join(",")
    )
}

/// Parse a pgvector string representation back to a Vec<f32>
fn parse_pgvector(s: &str) -> Result<Vec<f32>, DomainError> {
    let trimmed = s.trim().trim_start_matches('[').trim_end_matches(']');

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    trimmed
        .split(',')
        .map(|v| v.trim().parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()
        .map_err(|e| DomainError::store(format!("Failed to parse vector: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_must_be_an_object() {
        let parsed = parse_metadata(serde_json::json!({ "author": "ops" })).unwrap();
        assert_eq!(parsed["author"], "ops");

        assert!(parse_metadata(serde_json::Value::Null).unwrap().is_empty());
        assert!(matches!(
            parse_metadata(serde_json::json!(["not", "an", "object"])),
            Err(DomainError::Store { .. })
        ));
    }

    #[test]
    fn test_threshold_compares_in_f32() {
        let params = SearchParams::new(3, 0.6);
        let similarity: f64 = 0.6;

        assert!(similarity < params.threshold as f64);
        assert!(params.accepts(similarity as f32));
    }

    #[test]
    fn test_vector_literal() {
        assert_eq!(to_pgvector(&[0.5, -1.0, 2.25]), "[0.5,-1,2.25]");
        assert_eq!(to_pgvector(&[]), "[]");
    }

    #[test]
    fn test_parse_pgvector() {
        assert_eq!(parse_pgvector("[0.5,-1,2.25]").unwrap(), vec![0.5, -1.0, 2.25]);
        assert_eq!(parse_pgvector("[ 1 , 2 ]").unwrap(), vec![1.0, 2.0]);
        assert!(parse_pgvector("[]").unwrap().is_empty());
        assert!(parse_pgvector("[a,b]").is_err());
    }

    #[test]
    fn test_literal_round_trips() {
        let vector = vec![0.123_456_7, 1e-8, -3.5];

        assert_eq!(parse_pgvector(&to_pgvector(&vector)).unwrap(), vector);
    }

    #[test]
    fn test_config_defaults() {
        let config = PgvectorConfig::new("postgres://localhost/knowledge", 1536)
            .with_max_connections(4);

        assert_eq!(config.dimensions, 1536);
        assert_eq!(config.max_connections, 4);
    }
}
