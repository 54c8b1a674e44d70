//! Foundation types shared across the agent tooling suite.
//!
//! `TokenUsage` and `AgentResult` form the core vocabulary for provider
//! invocations and have no dependencies on the other crates.

use serde::{Deserialize, Serialize};

/// Token counts and cost for a single provider invocation.
///
/// All fields default to zero so a usage block absent from older records
/// decodes as empty rather than failing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
    #[serde(default)]
    pub cost_usd: f64,
}

impl TokenUsage {
    pub fn new(input_tokens: u64, output_tokens: u64, cost_usd: f64) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cost_usd,
        }
    }

    /// Combined input and output token count.
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }

    pub fn add_assign(&mut self, other: TokenUsage) {
        self.input_tokens += other.input_tokens;
        self.output_tokens += other.output_tokens;
        self.cost_usd += other.cost_usd;
    }
}

/// Result of one agent invocation.
///
/// Generic over the output payload so both structured outputs and plain
/// text share the same envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResult<T> {
    pub output: T,
    pub usage: TokenUsage,
    pub model: String,
    pub provider: String,
    pub duration_ms: u64,
}
