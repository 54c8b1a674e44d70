pub mod aggregator;
pub mod collector;
pub mod events;
pub mod report;
pub mod storage;
pub mod types;

pub use aggregator::{
    cost_rollup, performance_summary, CostRollup, OperationStats, PerformanceSummary, RollupEntry,
};
pub use collector::{InvocationOutcome, MetricsCollector};
pub use events::{MetricsEvent, NOT_APPLICABLE};
pub use report::TicketReport;
pub use storage::{MetricsError, MetricsResult, MetricsStorage};
pub use types::{EventFilter, EventType, GroupStats, MetricsSummary};
