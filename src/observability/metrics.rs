//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (requests, latency, retries, breaker state)
//! - Expose Prometheus-compatible metrics at `/metrics`
//! - Track per-service and aggregate metrics
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency by method, route
//! - `gateway_upstream_retries_total` (counter): retries by service
//! - `gateway_circuit_breaker_state` (gauge): 0=closed, 1=half-open, 2=open
//! - `gateway_service_status` (gauge): 1=ok, 0=unavailable/unknown
//! - `gateway_rate_limited_total` (counter): rejected requests by reason
//!
//! # Design Decisions
//! - Route label is the matched prefix, never the raw path (bounded cardinality)
//! - Recorder installed at most once per process; without it calls are no-ops

use std::sync::OnceLock;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::resilience::CircuitState;

static PROMETHEUS: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the global Prometheus recorder and return a handle for rendering.
///
/// Subsequent calls return the handle from the first call.
pub fn init_metrics() -> Option<PrometheusHandle> {
    PROMETHEUS
        .get_or_init(|| match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                tracing::info!("Prometheus metrics recorder installed");
                Some(handle)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install metrics recorder");
                None
            }
        })
        .clone()
}

/// Record a completed request.
pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    counter!("gateway_requests_total", &labels).increment(1);

    let labels = [("method", method.to_string()), ("route", route.to_string())];
    histogram!("gateway_request_duration_seconds", &labels).record(start.elapsed().as_secs_f64());
}

pub fn record_retry(service: &str) {
    counter!("gateway_upstream_retries_total", "service" => service.to_string()).increment(1);
}

pub fn record_breaker_state(service: &str, state: CircuitState) {
    gauge!("gateway_circuit_breaker_state", "service" => service.to_string()).set(state.as_gauge());
}

pub fn record_service_status(service: &str, up: bool) {
    gauge!("gateway_service_status", "service" => service.to_string())
        .set(if up { 1.0 } else { 0.0 });
}

pub fn record_rate_limited(reason: &'static str) {
    counter!("gateway_rate_limited_total", "reason" => reason).increment(1);
}
