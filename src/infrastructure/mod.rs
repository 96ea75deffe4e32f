//! Infrastructure layer - External service implementations

pub mod embedding;
pub mod ingestion;
pub mod knowledge;
pub mod llm;
pub mod logging;
pub mod provider;
pub mod services;
