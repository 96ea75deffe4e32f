//! Knowledge document and chunk entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::DomainError;

/// A document stored in the knowledge base. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeDocument {
    id: Uuid,
    title: String,
    content: String,
    source_url: Option<String>,
    source_type: String,
    tags: Vec<String>,
    metadata: HashMap<String, serde_json::Value>,
    chunk_count: usize,
    created_at: DateTime<Utc>,
}

impl KnowledgeDocument {
    /// Materialize a stored document from an insert request
    pub fn from_new(id: Uuid, document: NewDocument, chunk_count: usize) -> Self {
        Self {
            id,
            title: document.title,
            content: document.content,
            source_url: document.source_url,
            source_type: document.source_type,
            tags: document.tags,
            metadata: document.metadata,
            chunk_count,
            created_at: Utc::now(),
        }
    }

    /// Override the creation timestamp (for loading from DB)
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_url(&self) -> Option<&str> {
        self.source_url.as_deref()
    }

    pub fn source_type(&self) -> &str {
        &self.source_type
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn metadata(&self) -> &HashMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Request to add a document to the knowledge base
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default = "default_source_type")]
    pub source_type: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

fn default_source_type() -> String {
    "document".to_string()
}

impl NewDocument {
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            source_url: None,
            source_type: default_source_type(),
            tags: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    pub fn with_source_type(mut self, source_type: impl Into<String>) -> Self {
        self.source_type = source_type.into();
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        let tag = tag.into();
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    pub fn with_tags(self, tags: impl IntoIterator<Item = impl Into<String>>) -> Self {
        tags.into_iter().fold(self, |doc, tag| doc.with_tag(tag))
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::validation("Document title cannot be empty"));
        }

        if self.content.trim().is_empty() {
            return Err(DomainError::validation("Document content cannot be empty"));
        }

        if self.source_type.trim().is_empty() {
            return Err(DomainError::validation("Document source type cannot be empty"));
        }

        Ok(())
    }
}

/// A stored chunk of a document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: Uuid,
    pub document_id: Uuid,
    pub chunk_index: usize,
    pub content: String,
    pub token_count: usize,
    pub embedding: Vec<f32>,
}

/// A chunk ready to be persisted alongside its document
#[derive(Debug, Clone, PartialEq)]
pub struct NewChunk {
    pub chunk_index: usize,
    pub content: String,
    pub token_count: usize,
    pub embedding: Vec<f32>,
}

impl NewChunk {
    pub fn new(
        chunk_index: usize,
        content: impl Into<String>,
        token_count: usize,
        embedding: Vec<f32>,
    ) -> Self {
        Self {
            chunk_index,
            content: content.into(),
            token_count,
            embedding,
        }
    }

    pub fn into_stored(self, document_id: Uuid) -> KnowledgeChunk {
        KnowledgeChunk {
            id: Uuid::new_v4(),
            document_id,
            chunk_index: self.chunk_index,
            content: self.content,
            token_count: self.token_count,
            embedding: self.embedding,
        }
    }
}
