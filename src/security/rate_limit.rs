//! Per-client rate limiting middleware.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

/// A simple token bucket rate limiter.
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_update: Instant::now(),
        }
    }

    fn try_acquire(&mut self, capacity: f64, refill_rate: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * refill_rate).min(capacity);
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }
}

/// Shared state for the rate limiter: one bucket per client key.
pub struct RateLimiterState {
    buckets: DashMap<String, TokenBucket>,
    capacity: f64,
    refill_per_sec: f64,
}

impl RateLimiterState {
    /// `max_requests` per `window`, refilled continuously.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let capacity = f64::from(max_requests.max(1));
        let window = window.as_secs_f64().max(f64::EPSILON);
        Self {
            buckets: DashMap::new(),
            capacity,
            refill_per_sec: capacity / window,
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.max_requests, Duration::from_secs(config.window_secs))
    }

    pub fn check(&self, key: &str) -> bool {
        if let Some(mut bucket) = self.buckets.get_mut(key) {
            return bucket.try_acquire(self.capacity, self.refill_per_sec);
        }
        let mut bucket = self
            .buckets
            .entry(key.to_string())
            .or_insert_with(|| TokenBucket::new(self.capacity));
        bucket.try_acquire(self.capacity, self.refill_per_sec)
    }

    /// Drop buckets that have been idle long enough to be full again.
    pub fn purge_idle(&self) {
        let full_after = Duration::from_secs_f64(self.capacity / self.refill_per_sec);
        self.buckets
            .retain(|_, bucket| bucket.last_update.elapsed() < full_after);
    }

    pub fn tracked_clients(&self) -> usize {
        self.buckets.len()
    }
}

/// Middleware function for per-client rate limiting.
pub async fn rate_limit_middleware(
    State(state): State<Arc<RateLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if state.check(&key) {
        next.run(request).await
    } else {
        tracing::warn!(client = %key, "Rate limit exceeded");
        metrics::record_rate_limited("client_window");
        GatewayError::RateLimited.into_response()
    }
}
