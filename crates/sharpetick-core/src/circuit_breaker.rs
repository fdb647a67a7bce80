//! Failure gate in front of the upstream price provider.
//!
//! A batch fans out one fetch per ticker. When the provider is down every
//! one of them would wait for its own timeout, so after a run of failures
//! the gate trips and rejects calls outright until a cool-down has passed.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{info, warn};

/// Observable state of a [`CircuitBreaker`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls go through; failures are being counted.
    Closed,
    /// Calls are rejected until the cool-down ends.
    Open,
    /// Cool-down ended; the next outcome decides.
    HalfOpen,
}

/// Trip threshold and cool-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures that trip a closed breaker.
    pub failure_threshold: u32,
    pub open_timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            open_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Gate {
    Closed { failures: u32 },
    Open { until: Instant, failures: u32 },
    Probing { failures: u32 },
}

impl Gate {
    fn failures(self) -> u32 {
        match self {
            Self::Closed { failures } | Self::Open { failures, .. } | Self::Probing { failures } => {
                failures
            }
        }
    }
}

/// Thread-safe breaker shared by every fetch of one price source.
#[derive(Debug)]
pub struct CircuitBreaker {
    source: &'static str,
    config: CircuitBreakerConfig,
    gate: Mutex<Gate>,
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            source: "upstream",
            config,
            gate: Mutex::new(Gate::Closed { failures: 0 }),
        }
    }

    /// Names the guarded source in log lines.
    pub fn for_source(mut self, source: &'static str) -> Self {
        self.source = source;
        self
    }

    // The gate is a plain value, so a poisoned lock still holds a usable one.
    fn gate(&self) -> MutexGuard<'_, Gate> {
        self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a call may go upstream now. An expired cool-down lets one trial call through.
    pub fn allow_request(&self) -> bool {
        let mut gate = self.gate();
        match *gate {
            Gate::Closed { .. } | Gate::Probing { .. } => true,
            Gate::Open { until, failures } if Instant::now() >= until => {
                *gate = Gate::Probing { failures };
                true
            }
            Gate::Open { .. } => false,
        }
    }

    /// Time left before an open breaker admits a trial call; `None` unless open.
    pub fn retry_after(&self) -> Option<Duration> {
        match *self.gate() {
            Gate::Open { until, .. } => Some(until.saturating_duration_since(Instant::now())),
            _ => None,
        }
    }

    pub fn record_success(&self) {
        let mut gate = self.gate();
        if matches!(*gate, Gate::Probing { .. }) {
            info!(source = self.source, "circuit closed after successful trial call");
        }
        *gate = Gate::Closed { failures: 0 };
    }

    pub fn record_failure(&self) {
        let mut gate = self.gate();
        let failures = gate.failures().saturating_add(1);
        let trips = match *gate {
            Gate::Probing { .. } => true,
            Gate::Closed { .. } => failures >= self.config.failure_threshold,
            Gate::Open { .. } => false,
        };

        *gate = match *gate {
            Gate::Open { until, .. } => Gate::Open { until, failures },
            _ if trips => {
                warn!(
                    source = self.source,
                    failures,
                    cool_down_ms = self.config.open_timeout.as_millis() as u64,
                    "circuit opened"
                );
                Gate::Open {
                    until: Instant::now() + self.config.open_timeout,
                    failures,
                }
            }
            _ => Gate::Closed { failures },
        };
    }

    pub fn state(&self) -> CircuitState {
        match *self.gate() {
            Gate::Closed { .. } => CircuitState::Closed,
            Gate::Open { .. } => CircuitState::Open,
            Gate::Probing { .. } => CircuitState::HalfOpen,
        }
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.gate().failures()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaker(failure_threshold: u32, open_timeout: Duration) -> CircuitBreaker {
        CircuitBreaker::new(CircuitBreakerConfig {
            failure_threshold,
            open_timeout,
        })
        .for_source("test")
    }

    #[test]
    fn trips_after_threshold_and_rejects_until_cool_down() {
        let breaker = breaker(2, Duration::from_secs(60));

        breaker.record_failure();
        assert_eq!(breaker.state(), CircuitState::Closed);
        assert!(breaker.retry_after().is_none());
        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(!breaker.allow_request());
        assert!(breaker.retry_after().is_some_and(|left| left > Duration::from_secs(50)));
    }

    #[test]
    fn success_resets_the_failure_run() {
        let breaker = breaker(2, Duration::from_secs(60));

        breaker.record_failure();
        breaker.record_success();
        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 1);
    }

    #[test]
    fn successful_trial_call_closes() {
        let breaker = breaker(1, Duration::from_millis(1));
        breaker.record_failure();

        std::thread::sleep(Duration::from_millis(5));
        assert!(breaker.allow_request());
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
        breaker.record_success();

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.consecutive_failures(), 0);
    }

    #[test]
    fn failed_trial_call_reopens() {
        let breaker = breaker(5, Duration::from_millis(1));
        for _ in 0..5 {
            breaker.record_failure();
        }
        std::thread::sleep(Duration::from_millis(5));
        assert!(breaker.allow_request());

        breaker.record_failure();

        assert_eq!(breaker.state(), CircuitState::Open);
        assert_eq!(breaker.consecutive_failures(), 6);
    }
}
