//! Per-provider health gate.
//!
//! Three states: closed (normal), open (fast-fail), half-open (one trial
//! window after the recovery timeout elapses). The table is process-wide and
//! shared across concurrent runs via `Arc`/`Mutex`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

const DEFAULT_FAILURE_THRESHOLD: u32 = 5;
const DEFAULT_RECOVERY_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_SUCCESS_THRESHOLD: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone)]
struct Entry {
    state: State,
    consecutive_failures: u32,
    consecutive_successes: u32,
    opened_at: Option<Instant>,
}

impl Default for Entry {
    fn default() -> Self {
        Self {
            state: State::Closed,
            consecutive_failures: 0,
            consecutive_successes: 0,
            opened_at: None,
        }
    }
}

/// Process-wide, per-provider circuit breaker.
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    failure_threshold: u32,
    recovery_timeout: Duration,
    success_threshold: u32,
    entries: Arc<Mutex<HashMap<String, Entry>>>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(
            DEFAULT_FAILURE_THRESHOLD,
            DEFAULT_RECOVERY_TIMEOUT,
            DEFAULT_SUCCESS_THRESHOLD,
        )
    }
}

impl CircuitBreaker {
    /// Builds a breaker with explicit thresholds.
    #[must_use]
    pub fn new(failure_threshold: u32, recovery_timeout: Duration, success_threshold: u32) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            success_threshold,
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// True if a call to `provider_id` should be attempted right now.
    ///
    /// Transitions open -> half-open in place when the recovery timeout has
    /// elapsed, so callers never need to poll separately.
    #[must_use]
    pub fn is_available(&self, provider_id: &str) -> bool {
        let mut entries = self.entries.lock().expect("circuit breaker mutex poisoned");
        let entry = entries.entry(provider_id.to_string()).or_default();

        match entry.state {
            State::Closed | State::HalfOpen => true,
            State::Open => {
                let elapsed = entry.opened_at.is_none_or(|at| at.elapsed() >= self.recovery_timeout);
                if elapsed {
                    info!(provider = provider_id, "circuit breaker entering half-open");
                    entry.state = State::HalfOpen;
                    entry.consecutive_successes = 0;
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Records a successful call.
    pub fn record_success(&self, provider_id: &str) {
        let mut entries = self.entries.lock().expect("circuit breaker mutex poisoned");
        let entry = entries.entry(provider_id.to_string()).or_default();

        match entry.state {
            State::Closed => {
                entry.consecutive_failures = 0;
            }
            State::HalfOpen => {
                entry.consecutive_successes += 1;
                if entry.consecutive_successes >= self.success_threshold {
                    info!(provider = provider_id, "circuit breaker closing");
                    *entry = Entry::default();
                }
            }
            State::Open => {
                debug!(provider = provider_id, "success recorded while open, ignoring");
            }
        }
    }

    /// Records a failed call.
    pub fn record_failure(&self, provider_id: &str) {
        let mut entries = self.entries.lock().expect("circuit breaker mutex poisoned");
        let entry = entries.entry(provider_id.to_string()).or_default();

        match entry.state {
            State::Closed => {
                entry.consecutive_failures += 1;
                if entry.consecutive_failures >= self.failure_threshold {
                    warn!(provider = provider_id, "circuit breaker opening");
                    entry.state = State::Open;
                    entry.opened_at = Some(Instant::now());
                }
            }
            State::HalfOpen => {
                warn!(provider = provider_id, "probe failed, circuit breaker re-opening");
                entry.state = State::Open;
                entry.opened_at = Some(Instant::now());
                entry.consecutive_successes = 0;
            }
            State::Open => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker() -> CircuitBreaker {
        CircuitBreaker::new(3, Duration::from_millis(20), 2)
    }

    #[test]
    fn starts_closed_and_available() {
        let cb = breaker();
        assert!(cb.is_available("p"));
    }

    #[test]
    fn opens_after_threshold_failures() {
        let cb = breaker();
        cb.record_failure("p");
        cb.record_failure("p");
        assert!(cb.is_available("p"));
        cb.record_failure("p");
        assert!(!cb.is_available("p"));
    }

    #[test]
    fn success_resets_failure_count_while_closed() {
        let cb = breaker();
        cb.record_failure("p");
        cb.record_failure("p");
        cb.record_success("p");
        cb.record_failure("p");
        cb.record_failure("p");
        assert!(cb.is_available("p"));
    }

    #[test]
    fn half_open_after_recovery_timeout() {
        let cb = breaker();
        cb.record_failure("p");
        cb.record_failure("p");
        cb.record_failure("p");
        assert!(!cb.is_available("p"));
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_available("p"));
    }

    #[test]
    fn half_open_requires_consecutive_successes_to_close() {
        let cb = breaker();
        cb.record_failure("p");
        cb.record_failure("p");
        cb.record_failure("p");
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_available("p"));
        cb.record_success("p");
        cb.record_failure("p");
        assert!(!cb.is_available("p"));
    }

    #[test]
    fn half_open_closes_after_success_threshold() {
        let cb = breaker();
        cb.record_failure("p");
        cb.record_failure("p");
        cb.record_failure("p");
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_available("p"));
        cb.record_success("p");
        cb.record_success("p");
        assert!(cb.is_available("p"));
        // Fully closed: a fresh failure count starts from zero again.
        cb.record_failure("p");
        cb.record_failure("p");
        assert!(cb.is_available("p"));
    }

    #[test]
    fn independent_providers_do_not_interfere() {
        let cb = breaker();
        cb.record_failure("a");
        cb.record_failure("a");
        cb.record_failure("a");
        assert!(!cb.is_available("a"));
        assert!(cb.is_available("b"));
    }
}
