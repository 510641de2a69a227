//! Per-run counters surfaced in the run result.

use std::time::Duration;

/// Accumulated counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Metrics {
    /// Wall-clock time spent in the run so far.
    pub duration: Duration,
    /// Number of provider calls that counted toward the result (racing
    /// losers are not counted; see the provider-selection design notes).
    pub provider_calls: u64,
    /// Number of individual tool invocations dispatched.
    pub tool_executions: u64,
    /// Estimated savings from calls served by zero-marginal-cost providers.
    pub cost_savings: f64,
}

impl Metrics {
    /// Work done per model call: `tool_executions / max(provider_calls, 1)`.
    ///
    /// Informational only; nothing in the engine branches on this value.
    #[must_use]
    pub fn efficiency(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let executions = self.tool_executions as f64;
        #[allow(clippy::cast_precision_loss)]
        let calls = self.provider_calls.max(1) as f64;
        executions / calls
    }

    pub(crate) fn merge(&mut self, delta: Self) {
        self.duration += delta.duration;
        self.provider_calls += delta.provider_calls;
        self.tool_executions += delta.tool_executions;
        self.cost_savings += delta.cost_savings;
    }
}

/// Estimates the cost savings of a completed chat call, per the fixed
/// convention that zero-marginal-cost providers save `0.01` per 1000 total
/// tokens.
#[must_use]
pub fn estimate_cost_savings(provider_id: &str, total_tokens: u64) -> f64 {
    if provider_id.contains("free") || provider_id == "google" {
        #[allow(clippy::cast_precision_loss)]
        let tokens = total_tokens as f64;
        0.01 * (tokens / 1000.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn efficiency_is_zero_with_no_calls() {
        let metrics = Metrics::default();
        assert_eq!(metrics.efficiency(), 0.0);
    }

    #[test]
    fn efficiency_reflects_tool_to_call_ratio() {
        let metrics = Metrics {
            provider_calls: 2,
            tool_executions: 4,
            ..Metrics::default()
        };
        assert!((metrics.efficiency() - 2.0).abs() < f64::EPSILON);
    }

    #[test]
    fn free_provider_saves_cost() {
        assert!(estimate_cost_savings("groq-free", 2000) > 0.0);
        assert!(estimate_cost_savings("google", 1000) > 0.0);
        assert_eq!(estimate_cost_savings("openai", 2000), 0.0);
    }
}
