//! HTTP server setup and request orchestration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, panic recovery, timeout, CORS, rate limit)
//! - Resolve the service route, consult its breaker, rewrite and forward
//! - Serve the aggregate `/health` report and Prometheus `/metrics`
//! - Bind server to listener and shut down gracefully

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    extract::{ConnectInfo, State},
    http::{header, Request, StatusCode, Uri},
    middleware,
    response::{IntoResponse, Response},
    routing::{any, get},
    BoxError, Json, Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::timeout::{error::Elapsed, TimeoutLayer};
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::GatewayConfig;
use crate::error::GatewayError;
use crate::health::{HealthAggregator, HealthMonitor, HealthStatus};
use crate::http::forward::{Forwarder, OutboundRequest};
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::http::response::{outcome_response, panic_response};
use crate::observability::metrics;
use crate::resilience::{Admission, BreakerRegistry};
use crate::routing::{rewrite, ServiceRegistry, ServiceRoute};
use crate::security::headers::outbound_headers;
use crate::security::rate_limit::{rate_limit_middleware, RateLimiterState};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub breakers: Arc<BreakerRegistry>,
    pub forwarder: Forwarder,
    pub health: Arc<HealthAggregator>,
    pub health_self_name: String,
    pub metrics: Option<PrometheusHandle>,
    pub max_body_size: usize,
}

/// HTTP server for the edge gateway.
pub struct GatewayServer {
    router: Router,
    config: GatewayConfig,
    state: AppState,
    rate_limiter: Option<Arc<RateLimiterState>>,
}

impl GatewayServer {
    /// Create a new gateway server with the given configuration.
    pub fn new(config: GatewayConfig) -> Self {
        let metrics_handle = if config.observability.metrics_enabled {
            metrics::init_metrics()
        } else {
            None
        };
        let registry = Arc::new(ServiceRegistry::from_config(&config.services));
        let breakers = Arc::new(BreakerRegistry::from_registry(&registry, &config.breaker));
        let health = Arc::new(HealthAggregator::new(registry.clone(), &config.health));

        let state = AppState {
            registry,
            breakers,
            forwarder: Forwarder::from_config(&config),
            health,
            health_self_name: config.health.self_name.clone(),
            metrics: metrics_handle,
            max_body_size: config.security.max_body_size,
        };

        let rate_limiter = config
            .rate_limit
            .enabled
            .then(|| Arc::new(RateLimiterState::from_config(&config.rate_limit)));

        let router = Self::build_router(&config, state.clone(), rate_limiter.clone());

        for route in state.registry.routes() {
            tracing::info!(
                service = %route.service_name(),
                prefix = %route.prefix(),
                target = %route.base_url(),
                "Route registered"
            );
        }

        Self {
            router,
            config,
            state,
            rate_limiter,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(
        config: &GatewayConfig,
        state: AppState,
        rate_limiter: Option<Arc<RateLimiterState>>,
    ) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/metrics", get(metrics_handler))
            .route("/", any(proxy_handler))
            .route("/{*path}", any(proxy_handler))
            .with_state(state);

        if let Some(limiter) = rate_limiter {
            router = router.layer(middleware::from_fn_with_state(limiter, rate_limit_middleware));
        }
        if config.cors.enabled {
            router = router.layer(CorsLayer::permissive());
        }

        let limit_secs = config.timeouts.request_secs;
        router
            .layer(
                ServiceBuilder::new()
                    .layer(HandleErrorLayer::new(move |err: BoxError| async move {
                        timeout_response(err, limit_secs)
                    }))
                    .layer(TimeoutLayer::new(Duration::from_secs(limit_secs))),
            )
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %req.method(),
                    uri = %req.uri(),
                    request_id = %request_id(req.headers()),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
    }

    /// The fully layered router, for serving or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server, accepting connections on the given listener until shutdown.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            services = self.state.registry.len(),
            max_attempts = self.state.forwarder.policy().max_attempts(),
            "HTTP server starting"
        );

        if self.config.health.interval_secs > 0 {
            let monitor = HealthMonitor::new(
                self.state.health.clone(),
                Duration::from_secs(self.config.health.interval_secs),
            );
            tokio::spawn(monitor.run(shutdown.resubscribe()));
        }

        if let Some(limiter) = self.rate_limiter.clone() {
            let period = Duration::from_secs(self.config.rate_limit.window_secs.max(1));
            let mut stop = shutdown.resubscribe();
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(period);
                loop {
                    tokio::select! {
                        _ = ticker.tick() => limiter.purge_idle(),
                        _ = stop.recv() => break,
                    }
                }
            });
        }

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        for (service, snapshot) in self.state.breakers.snapshots() {
            tracing::info!(
                service = %service,
                state = ?snapshot.state,
                consecutive_failures = snapshot.consecutive_failures,
                "Final circuit breaker state"
            );
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }
}

/// Main proxy handler.
/// Resolves the service, checks its breaker, and forwards the request.
async fn proxy_handler(State(state): State<AppState>, request: Request<Body>) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let Some(route) = state.registry.resolve(&path) else {
        tracing::warn!(request_id = %request_id(request.headers()), method = %method, path = %path, "No route matched");
        metrics::record_request(method.as_str(), "none", StatusCode::NOT_FOUND.as_u16(), start);
        return GatewayError::NoRouteMatch { path }.into_response();
    };

    let response = match forward_to_service(&state, &route, request).await {
        Ok(response) => response,
        Err(e) => {
            match &e {
                GatewayError::BreakerOpen { .. } => {
                    tracing::warn!(service = %route.service_name(), path = %path, "Circuit open, request rejected")
                }
                other => {
                    tracing::error!(service = %route.service_name(), path = %path, error = %other, "Request failed")
                }
            }
            e.into_response()
        }
    };

    metrics::record_request(method.as_str(), route.prefix(), response.status().as_u16(), start);
    response
}

async fn forward_to_service(
    state: &AppState,
    route: &ServiceRoute,
    request: Request<Body>,
) -> Result<Response, GatewayError> {
    let service = route.service_name();
    let breaker = state.breakers.get(service).ok_or_else(|| {
        tracing::error!(service = %service, "No circuit breaker registered for service");
        GatewayError::Internal
    })?;

    let (parts, body) = request.into_parts();
    let original_path = parts.uri.path();
    let target = target_uri(route, &parts.uri)?;

    let client_ip = parts
        .extensions
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip());
    let headers = outbound_headers(&parts.headers, client_ip);

    // Fail fast before reading the upload; admission proper happens below.
    if breaker.is_rejecting() {
        return Err(GatewayError::BreakerOpen {
            service: service.to_string(),
        });
    }

    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|_| GatewayError::PayloadTooLarge {
            limit: state.max_body_size,
        })?;

    match breaker.admit() {
        Admission::Rejected => {
            return Err(GatewayError::BreakerOpen {
                service: service.to_string(),
            })
        }
        Admission::Trial => {
            tracing::info!(request_id = %request_id(&parts.headers), service = %service, "Sending half-open trial request")
        }
        Admission::Admitted => {}
    }

    let outbound = OutboundRequest {
        method: parts.method.clone(),
        uri: target,
        headers,
        body,
    };
    let outcome = state.forwarder.forward(service, &outbound, breaker.as_ref()).await;

    tracing::info!(
        request_id = %request_id(&parts.headers),
        method = %parts.method,
        path = %original_path,
        target = %outbound.uri,
        service = %service,
        attempts = outcome.attempts,
        status = outcome.upstream_status().map(|s| s.as_u16()),
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Forwarded request"
    );

    Ok(outcome_response(service, outcome))
}

/// Backend URI: base address + rewritten path + original query.
fn target_uri(route: &ServiceRoute, original: &Uri) -> Result<Uri, GatewayError> {
    let path = rewrite(original.path(), route);
    let target = match original.query() {
        Some(query) => format!("{}{}?{}", route.base_url(), path, query),
        None => format!("{}{}", route.base_url(), path),
    };
    let uri = target
        .parse::<Uri>()
        .map_err(|e| GatewayError::Construction(format!("{}: {}", target, e)))?;
    if uri.scheme_str() != Some("http") || uri.host().is_none() {
        return Err(GatewayError::Construction(format!(
            "{}: only http:// backends are supported",
            target
        )));
    }
    Ok(uri)
}

/// Error handler for the overall request deadline.
fn timeout_response(err: BoxError, limit_secs: u64) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!(limit_secs, "Request exceeded gateway deadline");
        GatewayError::Timeout { limit_secs }.into_response()
    } else {
        tracing::error!(error = %err, "Unhandled middleware error");
        GatewayError::Internal.into_response()
    }
}

/// Aggregate health of every backend plus the gateway itself.
async fn health_handler(State(state): State<AppState>) -> Json<BTreeMap<String, HealthStatus>> {
    let mut report = state.health.check_all().await;
    report.insert(state.health_self_name.clone(), HealthStatus::Ok);
    metrics::record_service_status(&state.health_self_name, true);
    Json(report)
}

async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => GatewayError::NoRouteMatch {
            path: "/metrics".to_string(),
        }
        .into_response(),
    }
}
