//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-client limits)
//!     → Pass to routing
//!     → headers.rs (strip hop-by-hop, add X-Forwarded-For) before forwarding
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client-supplied connection headers

pub mod headers;
pub mod rate_limit;
