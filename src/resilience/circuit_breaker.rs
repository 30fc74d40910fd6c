//! Circuit breaker for backend protection.
//!
//! # States
//! - Closed: normal operation, requests pass through
//! - Open: backend assumed down, requests fail fast
//! - Half-Open: testing if backend recovered
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= threshold
//! Open → Half-Open: reset timeout elapsed and a request arrives
//! Half-Open → Closed: trial request succeeds
//! Half-Open → Open: trial request fails
//! ```
//!
//! # Design Decisions
//! - Per-backend circuit breaker (not global), held in a `BreakerRegistry`
//! - Fail fast in Open state (no waiting for timeout)
//! - Admission check and Open → Half-Open transition share one critical section
//! - Any success resets the failure streak, Closed included
//! - The lock is never held across I/O or sleeps

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;

use crate::config::BreakerConfig;
use crate::observability::metrics;
use crate::routing::ServiceRegistry;

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl CircuitState {
    /// Gauge encoding: 0 closed, 1 half-open, 2 open.
    pub fn as_gauge(self) -> f64 {
        match self {
            CircuitState::Closed => 0.0,
            CircuitState::HalfOpen => 1.0,
            CircuitState::Open => 2.0,
        }
    }
}

/// Result of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Closed or Half-Open: send the request.
    Admitted,
    /// This call moved the breaker from Open to Half-Open.
    Trial,
    /// Open and still cooling down.
    Rejected,
}

/// Receives the final outcome of a forwarded request.
pub trait OutcomeRecorder: Send + Sync {
    fn record_success(&self);
    fn record_failure(&self);
}

/// Point-in-time view of a breaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: CircuitState,
    pub consecutive_failures: u32,
}

#[derive(Debug)]
struct BreakerInner {
    state: CircuitState,
    consecutive_failures: u32,
    last_failure: Option<Instant>,
}

/// Consecutive-failure circuit breaker for one backend.
#[derive(Debug)]
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    reset_timeout: Duration,
    inner: Mutex<BreakerInner>,
}

impl CircuitBreaker {
    pub fn new(name: impl Into<String>, failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            failure_threshold: failure_threshold.max(1),
            reset_timeout,
            inner: Mutex::new(BreakerInner {
                state: CircuitState::Closed,
                consecutive_failures: 0,
                last_failure: None,
            }),
        }
    }

    pub fn from_config(name: impl Into<String>, config: &BreakerConfig) -> Self {
        Self::new(
            name,
            config.failure_threshold,
            Duration::from_secs(config.reset_timeout_secs),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn lock(&self) -> MutexGuard<'_, BreakerInner> {
        // Every critical section leaves the fields consistent, so a poisoned
        // lock still holds a usable state.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Decide whether a request may be sent to the backend.
    ///
    /// In Open state this admits one trial request once the reset timeout has
    /// elapsed, moving the breaker to Half-Open in the same critical section.
    /// Exactly one caller per open period gets `Admission::Trial`.
    pub fn admit(&self) -> Admission {
        let admission = {
            let mut inner = self.lock();
            match inner.state {
                CircuitState::Closed | CircuitState::HalfOpen => Admission::Admitted,
                CircuitState::Open => {
                    if self.reset_elapsed(&inner) {
                        inner.state = CircuitState::HalfOpen;
                        Admission::Trial
                    } else {
                        Admission::Rejected
                    }
                }
            }
        };

        if admission == Admission::Trial {
            tracing::info!(service = %self.name, "Circuit breaker half-open, admitting trial request");
            metrics::record_breaker_state(&self.name, CircuitState::HalfOpen);
        }
        admission
    }

    pub fn allow_request(&self) -> bool {
        self.admit() != Admission::Rejected
    }

    /// True while the breaker is Open and the reset timeout has not elapsed.
    ///
    /// Read-only: never moves the breaker to Half-Open.
    pub fn is_rejecting(&self) -> bool {
        let inner = self.lock();
        inner.state == CircuitState::Open && !self.reset_elapsed(&inner)
    }

    fn reset_elapsed(&self, inner: &BreakerInner) -> bool {
        inner
            .last_failure
            .map(|at| at.elapsed() > self.reset_timeout)
            .unwrap_or(true)
    }

    /// Record a request that reached the backend.
    pub fn record_success(&self) {
        let previous = {
            let mut inner = self.lock();
            let previous = inner.state;
            match inner.state {
                CircuitState::HalfOpen => {
                    inner.state = CircuitState::Closed;
                    inner.consecutive_failures = 0;
                    inner.last_failure = None;
                }
                CircuitState::Closed => {
                    inner.consecutive_failures = 0;
                    inner.last_failure = None;
                }
                // A late success from a request admitted before the breaker opened.
                CircuitState::Open => {}
            }
            previous
        };

        if previous == CircuitState::HalfOpen {
            tracing::info!(service = %self.name, "Circuit breaker closed after successful trial");
            metrics::record_breaker_state(&self.name, CircuitState::Closed);
        }
    }

    /// Record a request that could not reach the backend.
    pub fn record_failure(&self) {
        let (previous, failures) = {
            let mut inner = self.lock();
            let previous = inner.state;
            inner.consecutive_failures = inner.consecutive_failures.saturating_add(1);
            inner.last_failure = Some(Instant::now());
            if inner.consecutive_failures >= self.failure_threshold {
                inner.state = CircuitState::Open;
            }
            (previous, inner.consecutive_failures)
        };

        if failures >= self.failure_threshold {
            match previous {
                CircuitState::Closed => tracing::warn!(
                    service = %self.name,
                    failures,
                    threshold = self.failure_threshold,
                    "Circuit breaker opened"
                ),
                CircuitState::HalfOpen => tracing::warn!(
                    service = %self.name,
                    failures,
                    "Circuit breaker reopened after failed trial"
                ),
                CircuitState::Open => {}
            }
            metrics::record_breaker_state(&self.name, CircuitState::Open);
        }
    }

    pub fn state(&self) -> CircuitState {
        self.lock().state
    }

    pub fn snapshot(&self) -> BreakerSnapshot {
        let inner = self.lock();
        BreakerSnapshot {
            state: inner.state,
            consecutive_failures: inner.consecutive_failures,
        }
    }

    /// Instant of the most recent failure, if the streak is non-empty.
    pub fn last_failure(&self) -> Option<Instant> {
        self.lock().last_failure
    }
}

impl OutcomeRecorder for CircuitBreaker {
    fn record_success(&self) {
        CircuitBreaker::record_success(self)
    }

    fn record_failure(&self) {
        CircuitBreaker::record_failure(self)
    }
}

/// One breaker per registered service, built once at startup.
#[derive(Debug, Default)]
pub struct BreakerRegistry {
    breakers: HashMap<String, Arc<CircuitBreaker>>,
}

impl BreakerRegistry {
    pub fn from_registry(registry: &ServiceRegistry, config: &BreakerConfig) -> Self {
        let breakers = registry
            .routes()
            .iter()
            .map(|route| {
                let name = route.service_name().to_string();
                let breaker = Arc::new(CircuitBreaker::from_config(&name, config));
                metrics::record_breaker_state(&name, CircuitState::Closed);
                (name, breaker)
            })
            .collect();
        Self { breakers }
    }

    pub fn get(&self, service_name: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(service_name).cloned()
    }

    pub fn snapshots(&self) -> HashMap<String, BreakerSnapshot> {
        self.breakers
            .iter()
            .map(|(name, breaker)| (name.clone(), breaker.snapshot()))
            .collect()
    }
}
