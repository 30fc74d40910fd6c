//! On-demand health aggregation across all registered backends.
//!
//! # Responsibilities
//! - Probe every backend's liveness path with a short deadline
//! - Report ok / unavailable / unknown per service
//!
//! # Design Decisions
//! - Independent of the circuit breakers: never reads or updates them
//! - Only explicitly configured addresses are probed; the rest are unknown
//! - Probes run concurrently, so the aggregate takes one probe timeout at most

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request};
use futures_util::future::join_all;
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::HealthConfig;
use crate::health::state::HealthStatus;
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;
use crate::routing::{ServiceRegistry, ServiceRoute};

pub struct HealthAggregator {
    registry: Arc<ServiceRegistry>,
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HealthAggregator {
    pub fn new(registry: Arc<ServiceRegistry>, config: &HealthConfig) -> Self {
        let timeout = Duration::from_millis(config.timeout_ms);
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(timeout));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        Self {
            registry,
            client,
            path: config.path.clone(),
            timeout,
        }
    }

    /// Probe every registered service.
    pub async fn check_all(&self) -> BTreeMap<String, HealthStatus> {
        let probes = self.registry.routes().iter().map(|route| async move {
            let status = self.check(route).await;
            metrics::record_service_status(route.service_name(), status.is_ok());
            (route.service_name().to_string(), status)
        });
        join_all(probes).await.into_iter().collect()
    }

    /// Probe one service.
    pub async fn check(&self, route: &ServiceRoute) -> HealthStatus {
        let Some(base) = route.configured_url() else {
            return HealthStatus::Unknown;
        };
        let uri = format!("{}{}", base, self.path);

        let request = match Request::builder()
            .method(Method::GET)
            .uri(uri.as_str())
            .header(header::USER_AGENT, "edge-gateway-health-check")
            .body(Body::empty())
        {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(service = %route.service_name(), uri = %uri, error = %e, "Failed to build health check request");
                return HealthStatus::Unavailable;
            }
        };

        match with_timeout(self.timeout, self.client.request(request)).await {
            Ok(response) if response.status().is_success() => HealthStatus::Ok,
            Ok(response) => {
                tracing::warn!(service = %route.service_name(), status = %response.status(), "Health check failed: non-success status");
                HealthStatus::Unavailable
            }
            Err(e) => {
                tracing::warn!(service = %route.service_name(), error = %e, "Health check failed: transport error");
                HealthStatus::Unavailable
            }
        }
    }
}
