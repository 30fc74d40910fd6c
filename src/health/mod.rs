//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /health (on demand):
//!     → aggregator.rs (probe every backend concurrently)
//!     → state.rs (ok / unavailable / unknown per service)
//!     → JSON map, always 200
//!
//! Background refresh (monitor.rs, optional):
//!     Periodic timer
//!     → aggregator.rs
//!     → service status gauge + change logs
//! ```
//!
//! # Design Decisions
//! - Health is informational: circuit breakers are never consulted or updated
//! - Health state is per-service, shared only through the ServiceRegistry

pub mod aggregator;
pub mod monitor;
pub mod state;

pub use aggregator::HealthAggregator;
pub use monitor::HealthMonitor;
pub use state::HealthStatus;
