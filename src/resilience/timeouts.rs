//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap backend calls with a deadline
//! - Keep timeout errors distinct from the wrapped operation's errors
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the inner future is dropped on expiry

use std::future::Future;
use std::time::Duration;

/// Failure of a deadline-bound operation.
#[derive(Debug, thiserror::Error)]
pub enum TimeoutError<E> {
    #[error("timed out after {0:?}")]
    Elapsed(Duration),
    #[error(transparent)]
    Inner(E),
}

/// Run `fut` with a deadline of `limit`.
pub async fn with_timeout<F, T, E>(limit: Duration, fut: F) -> Result<T, TimeoutError<E>>
where
    F: Future<Output = Result<T, E>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(TimeoutError::Inner(e)),
        Err(_) => Err(TimeoutError::Elapsed(limit)),
    }
}
