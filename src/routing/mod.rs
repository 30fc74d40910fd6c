//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → router.rs (registry lookup)
//!     → matcher.rs (segment-aware prefix match)
//!     → Return: matched ServiceRoute or NoMatch
//!     → rewrite.rs (gateway path → backend path)
//!
//! Registry Compilation (at startup):
//!     ServiceConfig[] (+ environment overrides)
//!     → ServiceRoute per service
//!     → Freeze as immutable ServiceRegistry
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod rewrite;
pub mod router;

pub use rewrite::rewrite;
pub use router::{ServiceRegistry, ServiceRoute};
