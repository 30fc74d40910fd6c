//! Edge API gateway library.
//!
//! Routes requests by path prefix to backend services, rewrites the path,
//! forwards with bounded retries behind a per-service circuit breaker, and
//! reports aggregate backend health.

pub mod config;
pub mod error;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod resilience;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use error::GatewayError;
pub use http::GatewayServer;
pub use lifecycle::Shutdown;
