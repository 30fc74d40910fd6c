//! Errors produced by the gateway itself (as opposed to upstream responses).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// A synthetic failure response generated by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GatewayError {
    #[error("no service is registered for '{path}'")]
    NoRouteMatch { path: String },

    #[error("{service} is temporarily unavailable")]
    BreakerOpen { service: String },

    #[error("{service} is unreachable")]
    Unreachable { service: String, attempts: u32 },

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: usize },

    #[error("failed to create upstream request: {0}")]
    Construction(String),

    #[error("failed to read upstream response")]
    UpstreamBody,

    #[error("rate limit exceeded")]
    RateLimited,

    #[error("request did not complete within {limit_secs}s")]
    Timeout { limit_secs: u64 },

    #[error("internal server error")]
    Internal,
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::NoRouteMatch { .. } => StatusCode::NOT_FOUND,
            GatewayError::BreakerOpen { .. } | GatewayError::Unreachable { .. } => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            GatewayError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            GatewayError::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            GatewayError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::Construction(_) | GatewayError::UpstreamBody | GatewayError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable tag included in the response body.
    pub fn code(&self) -> &'static str {
        match self {
            GatewayError::NoRouteMatch { .. } => "NO_ROUTE_MATCH",
            GatewayError::BreakerOpen { .. } => "BREAKER_OPEN",
            GatewayError::Unreachable { .. } => "UPSTREAM_UNREACHABLE",
            GatewayError::PayloadTooLarge { .. } => "PAYLOAD_TOO_LARGE",
            GatewayError::RateLimited => "RATE_LIMITED",
            GatewayError::Timeout { .. } => "GATEWAY_TIMEOUT",
            GatewayError::Construction(_) | GatewayError::UpstreamBody | GatewayError::Internal => {
                "INTERNAL_ERROR"
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_breaker_open_body() {
        let response = GatewayError::BreakerOpen {
            service: "menu-service".into(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "menu-service is temporarily unavailable");
        assert_eq!(body["code"], "BREAKER_OPEN");
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            GatewayError::NoRouteMatch { path: "/x".into() }.status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            GatewayError::Unreachable { service: "a".into(), attempts: 3 }.code(),
            "UPSTREAM_UNREACHABLE"
        );
        assert_eq!(
            GatewayError::Construction("bad uri".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            GatewayError::Timeout { limit_secs: 45 }.status(),
            StatusCode::GATEWAY_TIMEOUT
        );
    }
}
