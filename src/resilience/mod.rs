//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to backend:
//!     → circuit_breaker.rs (admission: fail fast while open)
//!     → timeouts.rs (per-attempt deadline)
//!     → On transport failure: retries.rs + backoff.rs (retry with linear delay)
//!     → circuit_breaker.rs (one outcome per request: success or failure)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Breakers track reachability, not application-level correctness
//! - Circuit breaker prevents cascading failures

pub mod backoff;
pub mod circuit_breaker;
pub mod retries;
pub mod timeouts;

pub use circuit_breaker::{Admission, BreakerRegistry, CircuitBreaker, CircuitState, OutcomeRecorder};
pub use retries::RetryPolicy;
