//! Retrying forwarder.
//!
//! # Responsibilities
//! - Send a buffered request to a backend with a per-attempt deadline
//! - Retry transport failures with linear backoff
//! - Report exactly one outcome per request to the circuit breaker
//! - Hand the upstream status, headers and body back unchanged
//!
//! # Design Decisions
//! - The request body is owned as `Bytes`, so every attempt replays it
//! - Any HTTP response counts as reachable, whatever its status
//! - Dropping the returned future cancels the in-flight attempt or backoff sleep

use std::time::{Duration, Instant};

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, Request, StatusCode, Uri},
    response::Response,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};

use crate::config::{ForwarderConfig, GatewayConfig};
use crate::observability::metrics;
use crate::resilience::timeouts::with_timeout;
use crate::resilience::{OutcomeRecorder, RetryPolicy};
use crate::security::headers::strip_hop_by_hop;

/// Pooled outbound HTTP client shared by all requests.
pub type HttpClient = Client<HttpConnector, Body>;

/// Build the shared outbound client.
pub fn build_client(config: &ForwarderConfig) -> HttpClient {
    let mut connector = HttpConnector::new();
    connector.set_connect_timeout(Some(Duration::from_millis(config.attempt_timeout_ms)));
    connector.set_nodelay(true);

    Client::builder(TokioExecutor::new())
        .pool_idle_timeout(Duration::from_secs(config.pool_idle_timeout_secs))
        .pool_max_idle_per_host(config.pool_max_idle_per_host)
        .build(connector)
}

/// A fully buffered request ready to be sent (and re-sent) to a backend.
#[derive(Debug, Clone)]
pub struct OutboundRequest {
    pub method: Method,
    pub uri: Uri,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl OutboundRequest {
    fn to_request(&self) -> Request<Body> {
        let mut request = Request::new(Body::from(self.body.clone()));
        *request.method_mut() = self.method.clone();
        *request.uri_mut() = self.uri.clone();
        *request.headers_mut() = self.headers.clone();
        request
    }
}

/// A complete upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Convert into a client response, dropping hop-by-hop headers.
    pub fn into_response(self) -> Response {
        let mut headers = self.headers;
        strip_hop_by_hop(&mut headers);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = self.status;
        *response.headers_mut() = headers;
        response
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ForwardError {
    /// Every attempt failed at the transport level.
    #[error("upstream unreachable after {attempts} attempt(s): {reason}")]
    Unreachable { attempts: u32, reason: String },

    /// The backend answered but its body could not be read.
    #[error("failed to read upstream response body: {0}")]
    ResponseBody(String),
}

/// Result of one `forward` call.
#[derive(Debug)]
pub struct ProxyOutcome {
    pub attempts: u32,
    pub elapsed: Duration,
    pub result: Result<UpstreamResponse, ForwardError>,
}

impl ProxyOutcome {
    /// True when the backend was reached.
    pub fn is_success(&self) -> bool {
        !matches!(self.result, Err(ForwardError::Unreachable { .. }))
    }

    pub fn upstream_status(&self) -> Option<StatusCode> {
        self.result.as_ref().ok().map(|r| r.status)
    }
}

#[derive(Clone)]
pub struct Forwarder {
    client: HttpClient,
    policy: RetryPolicy,
    attempt_timeout: Duration,
    max_response_size: usize,
}

impl Forwarder {
    pub fn new(
        client: HttpClient,
        policy: RetryPolicy,
        attempt_timeout: Duration,
        max_response_size: usize,
    ) -> Self {
        Self {
            client,
            policy,
            attempt_timeout,
            max_response_size,
        }
    }

    pub fn from_config(config: &GatewayConfig) -> Self {
        Self::new(
            build_client(&config.forwarder),
            RetryPolicy::from_config(&config.forwarder),
            Duration::from_millis(config.forwarder.attempt_timeout_ms),
            config.security.max_response_size,
        )
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Send `request`, retrying transport failures.
    ///
    /// The caller must already have been admitted by the breaker behind
    /// `recorder`, which receives exactly one outcome when this returns.
    pub async fn forward<R>(&self, service: &str, request: &OutboundRequest, recorder: &R) -> ProxyOutcome
    where
        R: OutcomeRecorder + ?Sized,
    {
        let start = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let response = match with_timeout(self.attempt_timeout, self.client.request(request.to_request())).await {
                Ok(response) => response,
                Err(e) => {
                    let reason = describe(&e);
                    if self.policy.should_retry(attempt) {
                        let delay = self.policy.delay_after(attempt);
                        tracing::warn!(
                            service = %service,
                            uri = %request.uri,
                            attempt,
                            delay_ms = delay.as_millis() as u64,
                            error = %reason,
                            "Upstream transport failure, retrying"
                        );
                        metrics::record_retry(service);
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    recorder.record_failure();
                    tracing::error!(
                        service = %service,
                        uri = %request.uri,
                        attempts = attempt,
                        error = %reason,
                        "Upstream unreachable, retries exhausted"
                    );
                    return ProxyOutcome {
                        attempts: attempt,
                        elapsed: start.elapsed(),
                        result: Err(ForwardError::Unreachable {
                            attempts: attempt,
                            reason,
                        }),
                    };
                }
            };

            recorder.record_success();

            let (parts, body) = response.into_parts();
            let body = axum::body::to_bytes(Body::new(body), self.max_response_size);
            let result = match with_timeout(self.attempt_timeout, body).await {
                Ok(bytes) => Ok(UpstreamResponse {
                    status: parts.status,
                    headers: parts.headers,
                    body: bytes,
                }),
                Err(e) => {
                    let reason = describe(&e);
                    tracing::error!(service = %service, uri = %request.uri, error = %reason, "Failed to read upstream response");
                    Err(ForwardError::ResponseBody(reason))
                }
            };

            return ProxyOutcome {
                attempts: attempt,
                elapsed: start.elapsed(),
                result,
            };
        }
    }
}

/// Render an error with its source chain.
fn describe(error: &(dyn std::error::Error + 'static)) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
