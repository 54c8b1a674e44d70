use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::events::MetricsEvent;

/// Aggregated totals for a single dimension value.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct RollupEntry {
    pub event_count: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
}

/// Cost and token rollup across agent roles, models, and tickets.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CostRollup {
    pub total_cost_usd: f64,
    pub total_tokens: u64,
    pub total_events: u64,
    pub total_duration_ms: u64,
    pub by_agent_role: HashMap<String, RollupEntry>,
    pub by_model: HashMap<String, RollupEntry>,
    pub by_ticket: HashMap<String, RollupEntry>,
}

/// Duration statistics for a single operation.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct OperationStats {
    pub event_count: u64,
    pub avg_duration_ms: f64,
    pub p50_duration_ms: u64,
    pub p95_duration_ms: u64,
}

/// Duration summary with percentile statistics, overall and per operation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PerformanceSummary {
    pub total_events: u64,
    pub avg_duration_ms: f64,
    pub p50_duration_ms: u64,
    pub p95_duration_ms: u64,
    pub by_operation: HashMap<String, OperationStats>,
}

/// Roll up cost and token usage across roles, models, and tickets.
/// Events without a ticket id contribute to the totals but not to
/// `by_ticket`.
pub fn cost_rollup(events: &[MetricsEvent]) -> CostRollup {
    let mut rollup = CostRollup::default();

    for event in events {
        rollup.total_events += 1;
        rollup.total_tokens += event.usage.total();
        rollup.total_cost_usd += event.usage.cost_usd;
        rollup.total_duration_ms += event.duration_ms;

        accumulate(&mut rollup.by_agent_role, &event.agent_role, event);
        accumulate(&mut rollup.by_model, &event.model, event);
        if let Some(ticket_id) = &event.ticket_id {
            accumulate(&mut rollup.by_ticket, ticket_id, event);
        }
    }

    rollup
}

/// Duration statistics with p50/p95 percentiles, overall and grouped by
/// operation.
pub fn performance_summary(events: &[MetricsEvent]) -> PerformanceSummary {
    if events.is_empty() {
        return PerformanceSummary::default();
    }

    let durations: Vec<u64> = events.iter().map(|event| event.duration_ms).collect();

    let mut by_operation_events: HashMap<&str, Vec<u64>> = HashMap::new();
    for event in events {
        by_operation_events
            .entry(event.operation.as_str())
            .or_default()
            .push(event.duration_ms);
    }

    let by_operation = by_operation_events
        .into_iter()
        .map(|(operation, durations)| (operation.to_string(), operation_stats(durations)))
        .collect();

    PerformanceSummary {
        total_events: events.len() as u64,
        avg_duration_ms: average(&durations),
        p50_duration_ms: percentile(&durations, 50.0),
        p95_duration_ms: percentile(&durations, 95.0),
        by_operation,
    }
}

fn accumulate(group: &mut HashMap<String, RollupEntry>, key: &str, event: &MetricsEvent) {
    let entry = group.entry(key.to_string()).or_default();
    entry.event_count += 1;
    entry.total_tokens += event.usage.total();
    entry.total_cost_usd += event.usage.cost_usd;
    entry.total_duration_ms += event.duration_ms;
}

fn operation_stats(durations: Vec<u64>) -> OperationStats {
    OperationStats {
        event_count: durations.len() as u64,
        avg_duration_ms: average(&durations),
        p50_duration_ms: percentile(&durations, 50.0),
        p95_duration_ms: percentile(&durations, 95.0),
    }
}

fn average(durations: &[u64]) -> f64 {
    if durations.is_empty() {
        return 0.0;
    }
    durations.iter().sum::<u64>() as f64 / durations.len() as f64
}

/// Linear-interpolation percentile over the values; `pct` in 0..=100.
fn percentile(values: &[u64], pct: f64) -> u64 {
    if values.is_empty() {
        return 0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_unstable();

    let idx = (pct / 100.0) * (sorted.len() - 1) as f64;
    let lower = idx.floor() as usize;
    let upper = (lower + 1).min(sorted.len() - 1);
    let weight = idx - lower as f64;

    (sorted[lower] as f64 * (1.0 - weight) + sorted[upper] as f64 * weight) as u64
}
