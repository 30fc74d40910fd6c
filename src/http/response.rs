//! Response shaping for gateway-generated responses.
//!
//! # Responsibilities
//! - Map forwarder outcomes to client responses
//! - Turn handler panics into JSON 500 responses
//!
//! # Design Decisions
//! - Upstream status, headers and body pass through; only hop-by-hop headers are dropped
//! - Gateway-generated errors always carry a JSON `{"error", "code"}` body

use std::any::Any;

use axum::response::{IntoResponse, Response};

use crate::error::GatewayError;
use crate::http::forward::{ForwardError, ProxyOutcome};

/// Client response for a completed forward.
pub fn outcome_response(service: &str, outcome: ProxyOutcome) -> Response {
    match outcome.result {
        Ok(upstream) => upstream.into_response(),
        Err(ForwardError::Unreachable { attempts, .. }) => GatewayError::Unreachable {
            service: service.to_string(),
            attempts,
        }
        .into_response(),
        Err(ForwardError::ResponseBody(_)) => GatewayError::UpstreamBody.into_response(),
    }
}

/// Panic handler for `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    GatewayError::Internal.into_response()
}
