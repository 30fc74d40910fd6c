//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Backend services and the prefixes that route to them.
    pub services: Vec<ServiceConfig>,

    /// Circuit breaker settings, applied to every service.
    pub breaker: BreakerConfig,

    /// Outbound forwarding and retry settings.
    pub forwarder: ForwarderConfig,

    /// Health aggregation settings.
    pub health: HealthConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Rate limiting configuration.
    pub rate_limit: RateLimitConfig,

    /// CORS configuration.
    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Request hardening settings.
    pub security: SecurityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            services: default_services(),
            breaker: BreakerConfig::default(),
            forwarder: ForwarderConfig::default(),
            health: HealthConfig::default(),
            timeouts: TimeoutConfig::default(),
            rate_limit: RateLimitConfig::default(),
            cors: CorsConfig::default(),
            observability: ObservabilityConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// A backend service and the gateway prefix routed to it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Logical service name (e.g. "menu-service").
    pub name: String,

    /// Gateway-facing path prefix (e.g. "/api/menu").
    pub prefix: String,

    /// Prefix removed before forwarding. Defaults to `prefix`.
    #[serde(default)]
    pub strip_prefix: Option<String>,

    /// Default host. Defaults to the service name.
    #[serde(default)]
    pub host: Option<String>,

    /// Default port.
    pub port: u16,

    /// Explicit base URL; takes precedence over host and port.
    #[serde(default)]
    pub url: Option<String>,
}

impl ServiceConfig {
    fn new(name: &str, prefix: &str, port: u16) -> Self {
        Self {
            name: name.to_string(),
            prefix: prefix.to_string(),
            strip_prefix: None,
            host: None,
            port,
            url: None,
        }
    }
}

/// The service set the gateway ships with.
pub fn default_services() -> Vec<ServiceConfig> {
    vec![
        ServiceConfig::new("user-service", "/api/users", 8081),
        ServiceConfig::new("auth-service", "/api/auth", 8082),
        ServiceConfig::new("menu-service", "/api/menu", 8083),
        ServiceConfig::new("order-service", "/api/orders", 8084),
        ServiceConfig::new("payment-service", "/api/payments", 8085),
        ServiceConfig::new("review-service", "/api/reviews", 8086),
    ]
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive transport failures before the breaker opens.
    pub failure_threshold: u32,

    /// Time the breaker stays open before admitting a trial request.
    pub reset_timeout_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            reset_timeout_secs: 30,
        }
    }
}

/// Outbound forwarding configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Additional attempts after the first transport failure.
    pub max_retries: u32,

    /// Delay step; attempt `n` waits `n * retry_step_ms` before retrying.
    pub retry_step_ms: u64,

    /// Upper bound for a single retry delay.
    pub max_delay_ms: u64,

    /// Timeout for a single outbound attempt.
    pub attempt_timeout_ms: u64,

    /// Idle pooled connections kept per backend.
    pub pool_max_idle_per_host: usize,

    /// Idle timeout for pooled connections in seconds.
    pub pool_idle_timeout_secs: u64,
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_step_ms: 200,
            max_delay_ms: 2000,
            attempt_timeout_ms: 10_000,
            pool_max_idle_per_host: 32,
            pool_idle_timeout_secs: 90,
        }
    }
}

/// Health aggregation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Liveness path probed on every backend.
    pub path: String,

    /// Probe timeout in milliseconds.
    pub timeout_ms: u64,

    /// Name of the gateway's own entry in the aggregate.
    pub self_name: String,

    /// Background refresh interval in seconds (0 disables the monitor).
    pub interval_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/health".to_string(),
            timeout_ms: 2000,
            self_name: "api_gateway".to_string(),
            interval_secs: 0,
        }
    }
}

/// Timeout configuration for inbound requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time allowed for an inbound request, retries included.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 45 }
    }
}

/// Rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Enable per-client rate limiting.
    pub enabled: bool,

    /// Requests allowed per client within one window.
    pub max_requests: u32,

    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 100,
            window_secs: 60,
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow cross-origin requests from any origin.
    pub enabled: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("pretty" or "json").
    pub log_format: String,

    /// Expose Prometheus metrics at `/metrics`.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "pretty".to_string(),
            metrics_enabled: true,
        }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_size: usize,

    /// Maximum buffered upstream response body size in bytes.
    pub max_response_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            max_body_size: 4 * 1024 * 1024, // 4MB
            max_response_size: 32 * 1024 * 1024,
        }
    }
}
