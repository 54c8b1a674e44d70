use intake_core::{AgentResult, TokenUsage};

use crate::events::MetricsEvent;
use crate::storage::MetricsStorage;
use crate::types::{EventType, GroupStats, MetricsSummary};

/// Minimal extraction contract for deriving an invocation event from a
/// provider result. The collector stays agnostic to everything else about
/// the result's shape.
pub trait InvocationOutcome {
    fn usage(&self) -> TokenUsage;
    fn model(&self) -> &str;
    fn provider(&self) -> &str;
    fn duration_ms(&self) -> u64;
}

impl<T> InvocationOutcome for AgentResult<T> {
    fn usage(&self) -> TokenUsage {
        self.usage
    }

    fn model(&self) -> &str {
        &self.model
    }

    fn provider(&self) -> &str {
        &self.provider
    }

    fn duration_ms(&self) -> u64 {
        self.duration_ms
    }
}

/// In-memory metrics collector.
///
/// Accumulates events in insertion order and derives summaries and
/// filtered views on demand. Optionally mirrors every recorded event to
/// an append-only [`MetricsStorage`]; mirror failures are logged, not
/// surfaced, so recording itself never fails.
///
/// The collector's session id is stamped only onto events it constructs
/// itself in [`record_from_result`]; events passed to [`record_event`]
/// are stored exactly as built by the caller.
///
/// Not synchronized: callers needing concurrent access must serialize
/// calls externally.
///
/// [`record_from_result`]: MetricsCollector::record_from_result
/// [`record_event`]: MetricsCollector::record_event
#[derive(Debug, Default)]
pub struct MetricsCollector {
    session_id: Option<String>,
    events: Vec<MetricsEvent>,
    storage: Option<MetricsStorage>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_session(session_id: impl Into<String>) -> Self {
        Self {
            session_id: Some(session_id.into()),
            events: Vec::new(),
            storage: None,
        }
    }

    /// Attach a durable store that mirrors every recorded event.
    pub fn with_storage(mut self, storage: MetricsStorage) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Record a pre-constructed event. Always succeeds; a failed mirror
    /// write is logged and the event is still held in memory.
    pub fn record_event(&mut self, event: MetricsEvent) {
        if let Some(storage) = &self.storage {
            if let Err(error) = storage.write_event(&event) {
                log::warn!("metrics mirror write failed: {}", error);
            }
        }
        self.events.push(event);
    }

    /// Derive and record an `agent_invocation` event from a provider
    /// result, stamping the collector's session id.
    pub fn record_from_result(
        &mut self,
        result: &impl InvocationOutcome,
        agent_role: impl Into<String>,
        operation: impl Into<String>,
        ticket_id: Option<&str>,
    ) {
        let mut event = MetricsEvent::new(EventType::AgentInvocation, agent_role, operation)
            .with_usage(result.usage())
            .with_model(result.model())
            .with_provider(result.provider())
            .with_duration_ms(result.duration_ms());
        event.session_id = self.session_id.clone();
        event.ticket_id = ticket_id.map(str::to_string);

        self.record_event(event);
    }

    /// Snapshot of all recorded events in insertion order.
    pub fn events(&self) -> Vec<MetricsEvent> {
        self.events.clone()
    }

    pub fn filter_by_agent_role(&self, agent_role: &str) -> Vec<MetricsEvent> {
        self.events
            .iter()
            .filter(|event| event.agent_role == agent_role)
            .cloned()
            .collect()
    }

    pub fn filter_by_ticket_id(&self, ticket_id: &str) -> Vec<MetricsEvent> {
        self.events
            .iter()
            .filter(|event| event.ticket_id.as_deref() == Some(ticket_id))
            .cloned()
            .collect()
    }

    /// Recompute summary statistics from all held events in one pass.
    pub fn summary(&self) -> MetricsSummary {
        let mut summary = MetricsSummary::default();

        for event in &self.events {
            summary.total_events += 1;
            summary.total_tokens += event.usage.total();
            summary.total_cost_usd += event.usage.cost_usd;
            summary.total_duration_ms += event.duration_ms;

            for (key, group) in [
                (&event.agent_role, &mut summary.by_agent_role),
                (&event.operation, &mut summary.by_operation),
            ] {
                let stats = group.entry(key.clone()).or_insert_with(GroupStats::default);
                stats.count += 1;
                stats.tokens += event.usage.total();
                stats.cost_usd += event.usage.cost_usd;
                stats.duration_ms += event.duration_ms;
            }
        }

        summary
    }

    /// Discard all in-memory events. An attached store is untouched.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

#[cfg(test)]
mod tests {
    use intake_core::{AgentResult, TokenUsage};
    use tempfile::tempdir;

    use super::MetricsCollector;
    use crate::events::MetricsEvent;
    use crate::storage::MetricsStorage;
    use crate::types::EventType;

    fn result(input: u64, output: u64, cost: f64, duration_ms: u64) -> AgentResult<String> {
        AgentResult {
            output: "ok".to_string(),
            usage: TokenUsage::new(input, output, cost),
            model: "claude-sonnet-4-5".to_string(),
            provider: "anthropic".to_string(),
            duration_ms,
        }
    }

    #[test]
    fn record_event_appends_in_insertion_order() {
        let mut collector = MetricsCollector::new();

        for i in 0..3 {
            collector.record_event(MetricsEvent::new(
                EventType::AgentInvocation,
                "interview",
                format!("operation-{}", i),
            ));
        }

        let events = collector.events();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].operation, "operation-0");
        assert_eq!(events[2].operation, "operation-2");
    }

    #[test]
    fn record_from_result_extracts_provider_fields() {
        let mut collector = MetricsCollector::new();

        collector.record_from_result(
            &result(100, 50, 0.015, 1250),
            "interview",
            "ask_question",
            Some("PROJ-001"),
        );

        let events = collector.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type, EventType::AgentInvocation);
        assert_eq!(events[0].agent_role, "interview");
        assert_eq!(events[0].operation, "ask_question");
        assert_eq!(events[0].usage.input_tokens, 100);
        assert_eq!(events[0].model, "claude-sonnet-4-5");
        assert_eq!(events[0].provider, "anthropic");
        assert_eq!(events[0].duration_ms, 1250);
        assert_eq!(events[0].ticket_id.as_deref(), Some("PROJ-001"));
    }

    #[test]
    fn record_from_result_stamps_collector_session_id() {
        let mut collector = MetricsCollector::with_session("session-789");
        collector.record_from_result(&result(1, 1, 0.0, 1), "review", "check", None);

        assert_eq!(collector.events()[0].session_id.as_deref(), Some("session-789"));
    }

    #[test]
    fn record_event_leaves_caller_events_unstamped() {
        let mut collector = MetricsCollector::with_session("session-789");
        collector.record_event(MetricsEvent::new(
            EventType::SessionStart,
            "system",
            "initialize",
        ));

        // Caller-built events are stored as-is, advisory session id or not.
        assert!(collector.events()[0].session_id.is_none());
    }

    #[test]
    fn filter_by_ticket_id_preserves_order_and_exactness() {
        let mut collector = MetricsCollector::new();
        collector.record_from_result(&result(1, 1, 0.0, 1), "interview", "a", Some("PROJ-456"));
        collector.record_from_result(&result(1, 1, 0.0, 1), "review", "b", Some("PROJ-789"));
        collector.record_from_result(&result(1, 1, 0.0, 1), "coding", "c", Some("PROJ-456"));
        collector.record_from_result(&result(1, 1, 0.0, 1), "coding", "d", None);

        let matched = collector.filter_by_ticket_id("PROJ-456");
        assert_eq!(matched.len(), 2);
        assert_eq!(matched[0].operation, "a");
        assert_eq!(matched[1].operation, "c");

        assert!(collector.filter_by_ticket_id("PROJ-000").is_empty());
    }

    #[test]
    fn filter_by_agent_role_is_case_sensitive() {
        let mut collector = MetricsCollector::new();
        collector.record_from_result(&result(1, 1, 0.0, 1), "review", "a", None);

        assert_eq!(collector.filter_by_agent_role("review").len(), 1);
        assert!(collector.filter_by_agent_role("Review").is_empty());
    }

    #[test]
    fn summary_of_empty_collector_is_all_zero() {
        let summary = MetricsCollector::new().summary();
        assert_eq!(summary.total_events, 0);
        assert_eq!(summary.total_tokens, 0);
        assert_eq!(summary.total_cost_usd, 0.0);
        assert_eq!(summary.total_duration_ms, 0);
        assert!(summary.by_agent_role.is_empty());
        assert!(summary.by_operation.is_empty());
    }

    #[test]
    fn summary_totals_and_role_groups_match_recorded_usage() {
        let mut collector = MetricsCollector::new();
        collector.record_from_result(&result(100, 50, 0.01, 100), "interview", "ask_question", None);
        collector.record_from_result(&result(500, 200, 0.04, 200), "review", "code_review", None);
        collector.record_from_result(&result(1000, 1000, 0.10, 300), "coding", "implement", None);

        let summary = collector.summary();
        assert_eq!(summary.total_events, 3);
        assert_eq!(summary.total_tokens, 2850);
        assert!((summary.total_cost_usd - 0.15).abs() < 1e-9);
        assert_eq!(summary.total_duration_ms, 600);

        let review = summary.by_agent_role.get("review").expect("review group");
        assert_eq!(review.count, 1);
        assert_eq!(review.tokens, 700);
        assert!((review.cost_usd - 0.04).abs() < 1e-9);

        let implement = summary.by_operation.get("implement").expect("implement group");
        assert_eq!(implement.tokens, 2000);
    }

    #[test]
    fn group_counts_partition_total_events() {
        let mut collector = MetricsCollector::new();
        for (role, operation) in [
            ("interview", "ask"),
            ("interview", "probe"),
            ("review", "ask"),
            ("coding", "implement"),
        ] {
            collector.record_from_result(&result(1, 1, 0.0, 1), role, operation, None);
        }

        let summary = collector.summary();
        let by_role: u64 = summary.by_agent_role.values().map(|s| s.count).sum();
        let by_operation: u64 = summary.by_operation.values().map(|s| s.count).sum();
        assert_eq!(by_role, summary.total_events);
        assert_eq!(by_operation, summary.total_events);
    }

    #[test]
    fn clear_discards_memory_but_not_mirrored_storage() {
        let dir = tempdir().expect("temp dir");
        let storage = MetricsStorage::new(dir.path().join("metrics.jsonl"));
        let mut collector = MetricsCollector::new().with_storage(storage.clone());

        collector.record_from_result(&result(10, 5, 0.01, 50), "interview", "ask", None);
        collector.record_from_result(&result(20, 10, 0.02, 60), "review", "check", None);
        collector.clear();

        assert!(collector.events().is_empty());
        assert_eq!(storage.read_events().expect("read mirror").len(), 2);
    }

    #[test]
    fn mirrored_events_replay_into_a_fresh_collector() {
        let dir = tempdir().expect("temp dir");
        let storage = MetricsStorage::new(dir.path().join("metrics.jsonl"));

        {
            let mut collector =
                MetricsCollector::with_session("session-1").with_storage(storage.clone());
            collector.record_from_result(&result(100, 50, 0.01, 100), "interview", "ask", None);
        }

        let mut replayed = MetricsCollector::new();
        for event in storage.read_events().expect("read mirror") {
            replayed.record_event(event);
        }

        let summary = replayed.summary();
        assert_eq!(summary.total_events, 1);
        assert_eq!(summary.total_tokens, 150);
    }
}
