//! Application state for shared services

use std::sync::Arc;

use crate::config::AppConfig;
use crate::infrastructure::embedding::EmbeddingClient;
use crate::infrastructure::provider::ProviderManager;
use crate::infrastructure::services::{AnswerService, CostPlanner, KnowledgeService};

/// Everything a command needs, wired once at startup.
///
/// The provider registry and task mapping behind `providers` and `planner`
/// are immutable after construction.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub embeddings: Arc<EmbeddingClient>,
    pub knowledge: Arc<KnowledgeService>,
    pub answers: Arc<AnswerService>,
    pub providers: Arc<ProviderManager>,
    pub planner: Arc<CostPlanner>,
}
