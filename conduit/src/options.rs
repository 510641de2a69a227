//! Run-time policy: budgets, pruning, and provider selection strategy.

use std::time::Duration;

/// How the executor dispatches a chat step across primary and fallback
/// providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderStrategy {
    /// Sequential primaries, then sequential fallbacks. Preserves free-tier
    /// quotas that concurrent attempts would damage. The operational default.
    #[default]
    Smart,
    /// All primaries launched concurrently; first success wins, losers are
    /// cancelled. Falls back to sequential fallbacks if every primary fails.
    Racing,
    /// Primaries and fallbacks concatenated into one flat, sequential list.
    Sequential,
}

/// Which planner flavor drives a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlannerKind {
    /// Fast keyword-driven planner: one-shot tool-set detection, no
    /// provider calls of its own.
    #[default]
    Heuristic,
    /// Hierarchical task-network planner with tree-of-thoughts alternatives
    /// and self-healing adaptation. Spends one extra provider call up front
    /// recognizing intent.
    Quantum,
}

/// Backoff policy between sequential provider attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryConfig {
    /// Maximum attempts for a single provider before moving on.
    pub max_retries: u32,
    /// Base delay before a retry.
    pub base_delay: Duration,
    /// Upper bound on the (possibly jittered) delay.
    pub max_delay: Duration,
    /// When true, a uniform 0-1000ms jitter is added to each delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Computes the delay before the next attempt, applying jitter and the
    /// configured cap.
    #[must_use]
    pub fn delay_for_attempt(&self) -> Duration {
        let jittered = if self.jitter {
            self.base_delay + Duration::from_millis(u64::from(fastrand::u32(0..1000)))
        } else {
            self.base_delay
        };
        jittered.min(self.max_delay)
    }
}

/// Policy governing one `run()` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Maximum planner/executor iterations before the run stops.
    pub max_steps: u32,
    /// Per-provider-call timeout.
    pub timeout: Duration,
    /// Maximum messages retained in history; `0` disables pruning.
    pub max_history_length: usize,
    /// Whether pruning keeps all system messages regardless of
    /// `max_history_length`.
    pub preserve_system_messages: bool,
    /// Chat-step dispatch strategy.
    pub provider_strategy: ProviderStrategy,
    /// Backoff policy between sequential provider attempts.
    pub retry: RetryConfig,
    /// When true, the run result records the plan history, per-step
    /// results, reflections, and provider call history.
    pub debug: bool,
    /// Which planner drives this run.
    pub planner: PlannerKind,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            max_steps: 8,
            timeout: Duration::from_secs(30),
            max_history_length: 50,
            preserve_system_messages: true,
            provider_strategy: ProviderStrategy::Smart,
            retry: RetryConfig::default(),
            debug: false,
            planner: PlannerKind::Heuristic,
        }
    }
}

impl Options {
    /// Starts a builder seeded with the defaults.
    #[must_use]
    pub fn builder() -> Self {
        Self::default()
    }

    /// Sets the step budget.
    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Sets the per-provider-call timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the history length at which pruning kicks in.
    #[must_use]
    pub const fn with_max_history_length(mut self, max_history_length: usize) -> Self {
        self.max_history_length = max_history_length;
        self
    }

    /// Sets whether pruning preserves all system messages.
    #[must_use]
    pub const fn with_preserve_system_messages(mut self, preserve: bool) -> Self {
        self.preserve_system_messages = preserve;
        self
    }

    /// Sets the chat-step dispatch strategy.
    #[must_use]
    pub const fn with_provider_strategy(mut self, strategy: ProviderStrategy) -> Self {
        self.provider_strategy = strategy;
        self
    }

    /// Sets the retry/backoff policy.
    #[must_use]
    pub const fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Enables run-result debug recording.
    #[must_use]
    pub const fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Selects the planner flavor.
    #[must_use]
    pub const fn with_planner(mut self, planner: PlannerKind) -> Self {
        self.planner = planner;
        self
    }
}
