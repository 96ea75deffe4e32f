//! Domain layer - Core business logic and entities

pub mod embedding;
pub mod error;
pub mod ingestion;
pub mod knowledge;
pub mod llm;
pub mod provider;
pub mod rag;
pub mod usage;

pub use embedding::{normalize_input, EmbeddingProvider, EmbeddingRequest, EmbeddingResponse};
pub use error::DomainError;
pub use ingestion::{Chunk, ChunkingConfig, ChunkingStrategy, IngestionError, IngestionStage};
pub use knowledge::{
    KnowledgeChunk, KnowledgeDocument, KnowledgeStore, NewChunk, NewDocument, SearchHit,
    SearchParams,
};
pub use llm::{
    FinishReason, LlmProvider, LlmRequest, LlmRequestBuilder, LlmResponse, Message, MessageRole,
    Usage,
};
pub use provider::{
    AiProvider, Capability, Generation, GenerationOptions, Prompt, ProviderDescriptor,
    ProviderKind, ToolProviderMapping,
};
pub use rag::{AskError, RagAnswer, RagStage};
pub use usage::{CostAssumptions, MigrationReport, TokenPricing, ToolCostEstimate};
