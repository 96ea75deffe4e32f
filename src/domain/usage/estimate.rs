//! Migration cost estimates

use serde::{Deserialize, Serialize};

use super::TokenPricing;
use crate::domain::provider::ProviderKind;

/// Assumptions behind an offline cost estimate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostAssumptions {
    /// Average tokens consumed by one tool call
    pub avg_tokens_per_call: u64,
    /// Share of those tokens that are input (0.0 - 1.0)
    pub input_ratio: f64,
    /// Legacy price applied to every token
    pub legacy_pricing: TokenPricing,
}

impl CostAssumptions {
    /// Split a monthly call volume into (input, output) token totals
    pub fn monthly_tokens(&self, monthly_volume: u64) -> (u64, u64) {
        let total = monthly_volume.saturating_mul(self.avg_tokens_per_call);
        let ratio = self.input_ratio.clamp(0.0, 1.0);
        let input = (total as f64 * ratio).round() as u64;

        (input, total - input.min(total))
    }
}

impl Default for CostAssumptions {
    fn default() -> Self {
        Self {
            avg_tokens_per_call: 500,
            input_ratio: 0.6,
            legacy_pricing: TokenPricing::flat(1.50),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolCostEstimate {
    pub task_type: String,
    pub provider: ProviderKind,
    pub monthly_volume: u64,
    /// Monthly USD cost at the legacy price
    pub current_cost: f64,
    /// Monthly USD cost with the mapped provider
    pub new_cost: f64,
    pub savings: f64,
    /// 0 when the current cost is 0
    pub savings_percentage: f64,
}

impl ToolCostEstimate {
    pub fn new(
        task_type: impl Into<String>,
        provider: ProviderKind,
        monthly_volume: u64,
        current_cost: f64,
        new_cost: f64,
    ) -> Self {
        let savings = current_cost - new_cost;
        let savings_percentage = if current_cost > 0.0 {
            savings / current_cost * 100.0
        } else {
            0.0
        };

        Self {
            task_type: task_type.into(),
            provider,
            monthly_volume,
            current_cost,
            new_cost,
            savings,
            savings_percentage,
        }
    }
}

/// Estimates for every mapped task, best savings first
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub estimates: Vec<ToolCostEstimate>,
    pub total_current_cost: f64,
    pub total_new_cost: f64,
    pub total_savings: f64,
    pub total_savings_percentage: f64,
}

impl MigrationReport {
    pub fn new(mut estimates: Vec<ToolCostEstimate>) -> Self {
        estimates.sort_by(|a, b| {
            b.savings
                .partial_cmp(&a.savings)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.task_type.cmp(&b.task_type))
        });

        let total_current_cost: f64 = estimates.iter().map(|e| e.current_cost).sum();
        let total_new_cost: f64 = estimates.iter().map(|e| e.new_cost).sum();
        let total_savings = total_current_cost - total_new_cost;
        let total_savings_percentage = if total_current_cost > 0.0 {
            total_savings / total_current_cost * 100.0
        } else {
            0.0
        };

        Self {
            estimates,
            total_current_cost,
            total_new_cost,
            total_savings,
            total_savings_percentage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_monthly_tokens_split() {
        let assumptions = CostAssumptions::default();

        assert_eq!(assumptions.monthly_tokens(500), (150_000, 100_000));
        assert_eq!(assumptions.monthly_tokens(0), (0, 0));
    }

    #[test]
    fn test_monthly_tokens_ratio_is_clamped() {
        let assumptions = CostAssumptions {
            input_ratio: 1.7,
            ..CostAssumptions::default()
        };

        assert_eq!(assumptions.monthly_tokens(2), (1000, 0));
    }

    #[test]
    fn test_zero_current_cost_has_zero_percentage() {
        let estimate = ToolCostEstimate::new("icp", ProviderKind::DeepSeek, 0, 0.0, 0.0);

        assert_eq!(estimate.savings, 0.0);
        assert_eq!(estimate.savings_percentage, 0.0);
    }

    #[test]
    fn test_report_sorted_by_savings() {
        let report = MigrationReport::new(vec![
            ToolCostEstimate::new("a", ProviderKind::Anthropic, 10, 1.0, 2.0),
            ToolCostEstimate::new("b", ProviderKind::DeepSeek, 10, 1.0, 0.1),
            ToolCostEstimate::new("c", ProviderKind::Groq, 10, 1.0, 0.5),
        ]);

        let order: Vec<_> = report.estimates.iter().map(|e| e.task_type.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert!((report.total_current_cost - 3.0).abs() < 1e-9);
        assert!((report.total_new_cost - 2.6).abs() < 1e-9);
        assert!((report.total_savings_percentage - 40.0 / 3.0).abs() < 1e-6);
    }
}
