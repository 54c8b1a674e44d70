use std::collections::HashMap;

use chrono::{DateTime, Utc};
use intake_core::TokenUsage;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::EventType;

/// Sentinel model/provider value for events that did not invoke a model.
pub const NOT_APPLICABLE: &str = "n/a";

/// One immutable record of an observed AI operation.
///
/// The serialized shape is the storage wire format, one JSON object per
/// line; field names and types must stay stable so old files keep
/// decoding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MetricsEvent {
    pub event_type: EventType,
    pub timestamp: DateTime<Utc>,
    pub agent_role: String,
    pub operation: String,
    #[serde(default)]
    pub usage: TokenUsage,
    pub model: String,
    pub provider: String,
    #[serde(default)]
    pub duration_ms: u64,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub ticket_id: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
}

impl MetricsEvent {
    /// Create an event stamped with the current time, zero usage, and the
    /// `"n/a"` model/provider sentinels. Use the `with_*` methods to fill
    /// in the rest before recording; events are not mutated afterwards.
    pub fn new(
        event_type: EventType,
        agent_role: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self {
            event_type,
            timestamp: Utc::now(),
            agent_role: agent_role.into(),
            operation: operation.into(),
            usage: TokenUsage::default(),
            model: NOT_APPLICABLE.to_string(),
            provider: NOT_APPLICABLE.to_string(),
            duration_ms: 0,
            session_id: None,
            ticket_id: None,
            metadata: HashMap::new(),
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_usage(mut self, usage: TokenUsage) -> Self {
        self.usage = usage;
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = provider.into();
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_ticket_id(mut self, ticket_id: impl Into<String>) -> Self {
        self.ticket_id = Some(ticket_id.into());
        self
    }

    /// Attach one opaque metadata entry. The metrics layer never
    /// interprets these values.
    pub fn with_metadata(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }
}
