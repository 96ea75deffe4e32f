//! Knowledge Gateway
//!
//! Knowledge retrieval and multi-provider AI orchestration:
//! - Paragraph-aware chunking and embedding of documents
//! - Vector search over pgvector or an in-memory store
//! - Retrieval-augmented answers with cancellation
//! - Task-based provider selection with fallback
//! - Offline migration cost estimates

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod state;

pub use config::AppConfig;
pub use state::AppState;

use std::sync::Arc;

use domain::ingestion::ChunkingStrategy;
use domain::knowledge::KnowledgeStore;
use domain::provider::{ProviderKind, ToolProviderMapping};
use infrastructure::embedding::{EmbeddingClient, HttpClient, OpenAiEmbeddingProvider};
use infrastructure::ingestion::ParagraphChunker;
use infrastructure::knowledge::KnowledgeStoreFactory;
use infrastructure::provider::{
    build_builtin_providers, ApiKeys, ProviderManager, ProviderRegistry,
};
use infrastructure::services::{AnswerService, CostPlanner, KnowledgeService};
use tracing::{info, warn};

/// Create the application state from the default configuration
pub async fn create_app_state() -> anyhow::Result<AppState> {
    create_app_state_with_config(&AppConfig::default()).await
}

/// Create the application state with custom configuration.
///
/// API keys come from the environment. Fails on invalid configuration, an
/// unreadable mapping file or an unreachable database.
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    config.validate()?;

    let store_config = config.store_config()?;
    let store_type = store_config.store_type();
    info!(backend = ?store_type, "Opening knowledge store");
    if !store_type.is_persistent() {
        warn!(
            "In-memory knowledge store: documents are lost when the process exits. \
             Set APP__STORE__BACKEND=pgvector to keep them between commands"
        );
    }
    let store = KnowledgeStoreFactory::create(&store_config).await?;

    build_app_state(config, ApiKeys::from_env(), store)
}

/// Wire services around an existing store
pub fn build_app_state(
    config: &AppConfig,
    keys: ApiKeys,
    store: Arc<dyn KnowledgeStore>,
) -> anyhow::Result<AppState> {
    let mapping = Arc::new(ToolProviderMapping::load(
        config.providers.mapping_file.as_deref(),
    )?);

    let providers = build_builtin_providers(&config.providers.to_builtin()?, &keys)?;
    let registry = Arc::new(ProviderRegistry::builder().register_all(providers).build());
    let manager = Arc::new(ProviderManager::new(registry.clone(), mapping.clone()));

    let embeddings = Arc::new(create_embedding_client(config, &keys)?);

    let chunker: Arc<dyn ChunkingStrategy> = Arc::new(ParagraphChunker::new());
    let knowledge = KnowledgeService::new(
        store.clone(),
        embeddings.clone(),
        chunker,
        config.chunking.to_config(),
    )
    .with_concurrency(config.embedding.concurrency)
    .with_search_params(config.retrieval.search_params());

    let answers = AnswerService::new(store, embeddings.clone(), manager.clone())
        .with_params(config.retrieval.ask_params());

    let planner = CostPlanner::new(registry, mapping)
        .with_assumptions(config.planner.to_assumptions());

    Ok(AppState {
        config: Arc::new(config.clone()),
        embeddings,
        knowledge: Arc::new(knowledge),
        answers: Arc::new(answers),
        providers: manager,
        planner: Arc::new(planner),
    })
}

fn create_embedding_client(config: &AppConfig, keys: &ApiKeys) -> anyhow::Result<EmbeddingClient> {
    let settings = &config.embedding;
    let key = match keys.get(ProviderKind::OpenAi) {
        Some(key) => key,
        None => {
            warn!(
                env = ProviderKind::OpenAi.api_key_env(),
                "No embedding API key; ingestion and search will fail"
            );
            ""
        }
    };

    let http = HttpClient::with_timeout(settings.timeout())?;
    let provider = OpenAiEmbeddingProvider::with_base_url(http, key, &settings.base_url);

    Ok(
        EmbeddingClient::new(Arc::new(provider), &settings.model, settings.dimensions)
            .with_cache(settings.cache_capacity),
    )
}
