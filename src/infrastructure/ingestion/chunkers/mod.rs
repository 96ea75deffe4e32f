//! Chunking strategy implementations

mod paragraph;

pub use paragraph::ParagraphChunker;
