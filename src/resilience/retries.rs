//! Retry policy.
//!
//! # Responsibilities
//! - Bound the number of attempts per forwarded request
//! - Compute the delay before each retry
//!
//! # Design Decisions
//! - Only transport failures are retried; any HTTP response ends the loop
//! - All methods are retried, since the request body is fully buffered
//! - Delay grows linearly with the attempt number

use std::time::Duration;

use crate::config::ForwarderConfig;
use crate::resilience::backoff::calculate_backoff;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts allowed after the first one.
    pub max_retries: u32,
    pub step: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, step: Duration, max_delay: Duration) -> Self {
        Self {
            max_retries,
            step,
            max_delay,
        }
    }

    pub fn from_config(config: &ForwarderConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.retry_step_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Total attempts including the first.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Whether another attempt may follow attempt number `attempt` (1-based).
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts()
    }

    /// Delay to wait after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        calculate_backoff(
            attempt,
            self.step.as_millis() as u64,
            self.max_delay.as_millis() as u64,
        )
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ForwarderConfig::default())
    }
}
