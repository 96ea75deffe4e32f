//! CLI module for the knowledge gateway
//!
//! Provides subcommands for operating the knowledge base and providers:
//! - `ingest`, `ask`, `documents`, `delete`: knowledge base
//! - `estimate`, `report`, `providers`: provider routing and costs

pub mod knowledge;
pub mod providers;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::infrastructure::logging;
use crate::state::AppState;

/// Knowledge Gateway - knowledge retrieval and AI provider orchestration
///
/// The default `in_memory` store does not persist: documents ingested by one
/// command are gone for the next. Set `APP__STORE__BACKEND=pgvector` and
/// `DATABASE_URL` to keep a knowledge base between runs.
#[derive(Debug, Parser)]
#[command(name = "knowledge-gateway")]
#[command(version, about)]
pub struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Chunk, embed and store a text document
    ///
    /// With the in-memory store the document only lives for this command;
    /// use the pgvector backend to query it later.
    Ingest(IngestArgs),

    /// Answer a question from the knowledge base
    Ask {
        question: String,
    },

    /// List stored documents, newest first
    Documents,

    /// Delete a document and its chunks
    Delete {
        id: Uuid,
    },

    /// Estimate the monthly cost of one task type after migration
    Estimate {
        task_type: String,

        /// Calls per month
        #[arg(long, default_value_t = 1000)]
        volume: u64,
    },

    /// Estimate every mapped task type
    Report {
        /// Calls per month for each task type
        #[arg(long, default_value_t = 1000)]
        volume: u64,
    },

    /// Show provider status and the resolved chain per task type
    Providers,
}

#[derive(Debug, Args)]
pub struct IngestArgs {
    /// Text file to ingest
    pub file: PathBuf,

    /// Document title (defaults to the file name)
    #[arg(long)]
    pub title: Option<String>,

    #[arg(long, default_value = "document")]
    pub source_type: String,

    #[arg(long)]
    pub source_url: Option<String>,

    /// Tag to attach; repeatable
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

/// Load `.env` and configuration, start logging, build the state
pub async fn bootstrap() -> anyhow::Result<AppState> {
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    logging::init_logging(&config.logging);

    crate::create_app_state_with_config(&config).await
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let state = bootstrap().await?;
    let json = cli.json;

    match cli.command {
        Command::Ingest(args) => knowledge::ingest(&state, args, json).await,
        Command::Ask { question } => knowledge::ask(&state, &question, json).await,
        Command::Documents => knowledge::documents(&state, json).await,
        Command::Delete { id } => knowledge::delete(&state, id, json).await,
        Command::Estimate { task_type, volume } => {
            providers::estimate(&state, &task_type, volume, json)
        }
        Command::Report { volume } => providers::report(&state, volume, json),
        Command::Providers => providers::status(&state, json).await,
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
