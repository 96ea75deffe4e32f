//! Document ingestion domain types and traits
//!
//! This module provides:
//! - `ChunkingStrategy` trait for splitting documents into chunks
//! - `IngestionError` describing which stage of an ingestion failed

pub mod chunker;
pub mod error;

pub use chunker::{Chunk, ChunkingConfig, ChunkingStrategy};
pub use error::{IngestionError, IngestionStage};
