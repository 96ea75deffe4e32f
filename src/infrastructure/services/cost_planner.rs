//! Offline migration cost estimates

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::provider::ToolProviderMapping;
use crate::domain::usage::{CostAssumptions, MigrationReport, ToolCostEstimate};
use crate::infrastructure::provider::ProviderRegistry;

/// Compares the legacy flat price with the mapped provider's pricing.
/// Pure computation: no provider is probed or called.
#[derive(Debug, Clone)]
pub struct CostPlanner {
    registry: Arc<ProviderRegistry>,
    mapping: Arc<ToolProviderMapping>,
    assumptions: CostAssumptions,
}

impl CostPlanner {
    pub fn new(registry: Arc<ProviderRegistry>, mapping: Arc<ToolProviderMapping>) -> Self {
        Self {
            registry,
            mapping,
            assumptions: CostAssumptions::default(),
        }
    }

    pub fn with_assumptions(mut self, assumptions: CostAssumptions) -> Self {
        self.assumptions = assumptions;
        self
    }

    pub fn assumptions(&self) -> &CostAssumptions {
        &self.assumptions
    }

    pub fn estimate_tool_cost(&self, task_type: &str, monthly_volume: u64) -> ToolCostEstimate {
        let (input, output) = self.assumptions.monthly_tokens(monthly_volume);
        let provider = self.mapping.preferred(task_type);

        let current_cost = self
            .assumptions
            .legacy_pricing
            .calculate_cost_usd(input, output);
        let new_cost = self.registry.estimate_cost(provider, input, output);

        debug!(
            task_type = %task_type,
            provider = %provider,
            monthly_volume,
            current_cost,
            new_cost,
            "Estimated tool cost"
        );

        ToolCostEstimate::new(task_type, provider, monthly_volume, current_cost, new_cost)
    }

    /// Estimate every mapped task. Tasks missing from `volumes` use `default_volume`.
    pub fn migration_report(
        &self,
        volumes: &HashMap<String, u64>,
        default_volume: u64,
    ) -> MigrationReport {
        let estimates = self
            .mapping
            .task_types()
            .map(|task| {
                let volume = volumes.get(task).copied().unwrap_or(default_volume);
                self.estimate_tool_cost(task, volume)
            })
            .collect();

        MigrationReport::new(estimates)
    }
}
