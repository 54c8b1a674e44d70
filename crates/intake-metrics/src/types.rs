use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::events::MetricsEvent;
use crate::storage::MetricsError;

/// Closed set of event kinds the metrics layer records.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    AgentInvocation,
    SessionStart,
    SessionEnd,
    TicketStart,
    TicketEnd,
}

impl EventType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AgentInvocation => "agent_invocation",
            Self::SessionStart => "session_start",
            Self::SessionEnd => "session_end",
            Self::TicketStart => "ticket_start",
            Self::TicketEnd => "ticket_end",
        }
    }
}

impl FromStr for EventType {
    type Err = MetricsError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "agent_invocation" => Ok(Self::AgentInvocation),
            "session_start" => Ok(Self::SessionStart),
            "session_end" => Ok(Self::SessionEnd),
            "ticket_start" => Ok(Self::TicketStart),
            "ticket_end" => Ok(Self::TicketEnd),
            other => Err(MetricsError::InvalidData(format!(
                "unknown event type: {}",
                other
            ))),
        }
    }
}

/// Accumulated statistics for one grouping key in a summary.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct GroupStats {
    pub count: u64,
    pub tokens: u64,
    pub cost_usd: f64,
    pub duration_ms: u64,
}

/// Summary statistics over a collection of metrics events.
///
/// Always recomputed from the events in full; never cached or patched
/// incrementally.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MetricsSummary {
    pub total_events: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub total_duration_ms: u64,
    pub by_agent_role: HashMap<String, GroupStats>,
    pub by_operation: HashMap<String, GroupStats>,
}

/// Criteria for selecting events, usable in memory and on storage reads.
///
/// Every field is optional; unset fields match everything. String fields
/// match exactly and case-sensitively. `limit` caps how many matches
/// [`apply`] returns; [`matches`] judges single events and ignores it.
///
/// [`apply`]: EventFilter::apply
/// [`matches`]: EventFilter::matches
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EventFilter {
    pub agent_role: Option<String>,
    pub ticket_id: Option<String>,
    pub session_id: Option<String>,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub event_type: Option<EventType>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<usize>,
}

impl EventFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn agent_role(mut self, agent_role: impl Into<String>) -> Self {
        self.agent_role = Some(agent_role.into());
        self
    }

    pub fn ticket_id(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Select the matching events in order, stopping after `limit`
    /// matches when one is set.
    pub fn apply(&self, events: &[MetricsEvent]) -> Vec<MetricsEvent> {
        let matched = events.iter().filter(|event| self.matches(event)).cloned();
        match self.limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        }
    }

    pub fn matches(&self, event: &MetricsEvent) -> bool {
        if let Some(agent_role) = &self.agent_role {
            if event.agent_role != *agent_role {
                return false;
            }
        }
        if let Some(ticket_id) = &self.ticket_id {
            if event.ticket_id.as_deref() != Some(ticket_id.as_str()) {
                return false;
            }
        }
        if let Some(session_id) = &self.session_id {
            if event.session_id.as_deref() != Some(session_id.as_str()) {
                return false;
            }
        }
        if let Some(model) = &self.model {
            if event.model != *model {
                return false;
            }
        }
        if let Some(provider) = &self.provider {
            if event.provider != *provider {
                return false;
            }
        }
        if let Some(event_type) = self.event_type {
            if event.event_type != event_type {
                return false;
            }
        }
        if let Some(since) = self.since {
            if event.timestamp < since {
                return false;
            }
        }
        if let Some(until) = self.until {
            if event.timestamp > until {
                return false;
            }
        }
        true
    }
}
