//! Linear backoff between retry attempts.

use std::time::Duration;

/// Delay before retry number `attempt`: `attempt * step_ms`, capped at `max_ms`.
pub fn calculate_backoff(attempt: u32, step_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let delay_ms = step_ms.saturating_mul(u64::from(attempt));
    Duration::from_millis(delay_ms.min(max_ms))
}
