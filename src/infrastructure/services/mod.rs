//! Application services

mod answer_service;
mod cost_planner;
mod knowledge_service;

pub use answer_service::{AnswerService, DEFAULT_ASK_PARAMS};
pub use cost_planner::CostPlanner;
pub use knowledge_service::KnowledgeService;
