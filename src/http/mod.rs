//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (request ID)
//!     → routing (resolve service, rewrite path)
//!     → circuit breaker admission
//!     → forward.rs (retrying upstream call, single breaker outcome)
//!     → response.rs (passthrough or JSON error)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, OutboundRequest, ProxyOutcome};
pub use request::X_REQUEST_ID;
pub use server::{AppState, GatewayServer};
