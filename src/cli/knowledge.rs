//! Knowledge base commands

use anyhow::Context;
use serde_json::json;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use super::{print_json, IngestArgs};
use crate::domain::knowledge::NewDocument;
use crate::state::AppState;

pub async fn ingest(state: &AppState, args: IngestArgs, json: bool) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let title = match args.title {
        Some(title) => title,
        None => args
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| args.file.display().to_string()),
    };

    let mut document = NewDocument::new(title, content)
        .with_source_type(args.source_type)
        .with_tags(args.tags);
    if let Some(url) = args.source_url {
        document = document.with_source_url(url);
    }

    let stored = state.knowledge.ingest(document).await?;

    if json {
        return print_json(&stored);
    }

    println!(
        "Ingested '{}' as {} ({} chunks)",
        stored.title(),
        stored.id(),
        stored.chunk_count()
    );
    Ok(())
}

/// Ctrl-C cancels the request; nothing is called after cancellation
pub async fn ask(state: &AppState, question: &str, json: bool) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    let watcher = tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("Received Ctrl+C, cancelling request");
            on_interrupt.cancel();
        }
    });

    let result = state.answers.ask_with_cancellation(question, &cancel).await;
    watcher.abort();

    let answer = match result {
        Ok(answer) => answer,
        Err(e) if e.is_unavailable() => {
            anyhow::bail!("AI is temporarily unavailable, please try again later ({})", e)
        }
        Err(e) => return Err(e.into()),
    };

    if json {
        return print_json(&answer);
    }

    println!("{}\n", answer.answer);
    println!(
        "Provider: {} ({})  Confidence: {:.2}",
        answer.provider, answer.model, answer.confidence
    );

    if !answer.sources.is_empty() {
        println!("Sources:");
        for source in &answer.sources {
            let label = format!("{} #{}", source.title, source.chunk_index);
            match &source.source_url {
                Some(url) => println!("  - {} <{}> ({:.2})", label, url, source.similarity),
                None => println!("  - {} ({:.2})", label, source.similarity),
            }
        }
    }

    Ok(())
}

pub async fn documents(state: &AppState, json: bool) -> anyhow::Result<()> {
    let documents = state.knowledge.list_documents().await?;

    if json {
        return print_json(&documents);
    }

    if documents.is_empty() {
        println!("No documents");
        return Ok(());
    }

    for doc in &documents {
        println!(
            "{}  {}  {:>3} chunks  {}  [{}]",
            doc.id(),
            doc.created_at().format("%Y-%m-%d %H:%M"),
            doc.chunk_count(),
            doc.title(),
            doc.tags().join(", ")
        );
    }

    Ok(())
}

pub async fn delete(state: &AppState, id: Uuid, json: bool) -> anyhow::Result<()> {
    let deleted = state.knowledge.delete_document(id).await?;

    if json {
        return print_json(&json!({ "id": id, "deleted": deleted }));
    }

    if deleted {
        println!("Deleted {}", id);
    } else {
        println!("No document with id {}", id);
    }

    Ok(())
}
