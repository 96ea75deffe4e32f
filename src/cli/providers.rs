//! Provider and cost commands

use std::collections::HashMap;

use serde::Serialize;

use super::print_json;
use crate::domain::provider::ProviderKind;
use crate::infrastructure::provider::ProviderStatus;
use crate::state::AppState;

pub fn estimate(state: &AppState, task_type: &str, volume: u64, json: bool) -> anyhow::Result<()> {
    let estimate = state.planner.estimate_tool_cost(task_type, volume);

    if json {
        return print_json(&estimate);
    }

    println!("Task:        {} ({} calls/month)", estimate.task_type, estimate.monthly_volume);
    println!("Provider:    {}", estimate.provider);
    println!("Current:     ${:.4}", estimate.current_cost);
    println!("New:         ${:.4}", estimate.new_cost);
    println!(
        "Savings:     ${:.4} ({:.1}%)",
        estimate.savings, estimate.savings_percentage
    );
    Ok(())
}

pub fn report(state: &AppState, volume: u64, json: bool) -> anyhow::Result<()> {
    let report = state.planner.migration_report(&HashMap::new(), volume);

    if json {
        return print_json(&report);
    }

    println!(
        "{:<18} {:<10} {:>12} {:>12} {:>9}",
        "task", "provider", "current $", "new $", "savings"
    );
    for e in &report.estimates {
        println!(
            "{:<18} {:<10} {:>12.4} {:>12.4} {:>8.1}%",
            e.task_type, e.provider.as_str(), e.current_cost, e.new_cost, e.savings_percentage
        );
    }
    println!(
        "{:<18} {:<10} {:>12.4} {:>12.4} {:>8.1}%",
        "total",
        "",
        report.total_current_cost,
        report.total_new_cost,
        report.total_savings_percentage
    );
    Ok(())
}

#[derive(Debug, Serialize)]
struct TaskRoute {
    task_type: String,
    chain: Vec<ProviderKind>,
    resolved: Option<ProviderKind>,
}

#[derive(Debug, Serialize)]
struct ProvidersReport {
    providers: Vec<ProviderStatus>,
    routes: Vec<TaskRoute>,
}

/// Probe every provider, then resolve each mapped task from the probe results
pub async fn status(state: &AppState, json: bool) -> anyhow::Result<()> {
    let statuses = state.providers.provider_statuses().await;
    let available = |kind: ProviderKind| {
        statuses
            .iter()
            .any(|s| s.kind == kind && s.configured && s.reachable == Some(true))
    };

    let mapping = state.providers.mapping();
    let routes: Vec<TaskRoute> = mapping
        .task_types()
        .map(|task| {
            let chain = state.providers.fallback_chain(task);
            let resolved = chain.iter().copied().find(|&kind| available(kind));
            TaskRoute {
                task_type: task.to_string(),
                chain,
                resolved,
            }
        })
        .collect();

    if json {
        return print_json(&ProvidersReport {
            providers: statuses,
            routes,
        });
    }

    println!("{:<10} {:<28} {:<11} {}", "provider", "model", "configured", "reachable");
    for s in &statuses {
        let reachable = match s.reachable {
            Some(true) => "yes",
            Some(false) => "no",
            None => "-",
        };
        println!(
            "{:<10} {:<28} {:<11} {}",
            s.kind.as_str(),
            s.model,
            if s.configured { "yes" } else { "no" },
            reachable
        );
    }

    println!("\n{:<18} {:<30} {}", "task", "chain", "resolved");
    for route in &routes {
        let chain: Vec<&str> = route.chain.iter().map(|k| k.as_str()).collect();
        let resolved = route.resolved.map(|k| k.as_str()).unwrap_or("unavailable");
        println!("{:<18} {:<30} {}", route.task_type, chain.join(" -> "), resolved);
    }

    Ok(())
}
