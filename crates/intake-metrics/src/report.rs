use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::events::MetricsEvent;
use crate::types::GroupStats;

/// Per-ticket usage summary in the shape an external PM exporter uploads.
///
/// This layer only produces the payload; the upload itself belongs to the
/// ticketing integration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketReport {
    pub ticket_id: String,
    /// First session id observed among the ticket's events, if any.
    pub session_id: Option<String>,
    pub total_events: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
    pub by_agent_role: HashMap<String, GroupStats>,
}

impl TicketReport {
    /// Build a report for `ticket_id` from the given events; events for
    /// other tickets (or with no ticket) are ignored.
    pub fn from_events(ticket_id: impl Into<String>, events: &[MetricsEvent]) -> Self {
        let ticket_id = ticket_id.into();
        let mut report = Self {
            ticket_id: ticket_id.clone(),
            session_id: None,
            total_events: 0,
            total_tokens: 0,
            total_cost_usd: 0.0,
            total_duration_ms: 0,
            by_agent_role: HashMap::new(),
        };

        for event in events {
            if event.ticket_id.as_deref() != Some(ticket_id.as_str()) {
                continue;
            }

            if report.session_id.is_none() {
                report.session_id = event.session_id.clone();
            }

            report.total_events += 1;
            report.total_tokens += event.usage.total();
            report.total_cost_usd += event.usage.cost_usd;
            report.total_duration_ms += event.duration_ms;

            let stats = report
                .by_agent_role
                .entry(event.agent_role.clone())
                .or_default();
            stats.count += 1;
            stats.tokens += event.usage.total();
            stats.cost_usd += event.usage.cost_usd;
            stats.duration_ms += event.duration_ms;
        }

        report
    }
}
