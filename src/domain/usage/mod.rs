//! Pricing and cost estimation

mod estimate;
mod pricing;

pub use estimate::{CostAssumptions, MigrationReport, ToolCostEstimate};
pub use pricing::TokenPricing;
