//! Failure injection tests for the edge gateway.

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::Value;

mod common;

use common::{service, start_backend, start_gateway, test_config};

#[tokio::test]
async fn test_retry_then_success() {
    let backend = start_backend(200, "menu").await;
    backend.drop_next(2);

    let mut config = test_config(vec![service("menu-service", "/api/menu", Some(backend.url()))]);
    config.forwarder.max_retries = 2;
    let (gateway, _shutdown) = start_gateway(config).await;

    let res = reqwest::get(format!("{}/api/menu/1", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "menu");
    assert_eq!(backend.accepted(), 3);
}

#[tokio::test]
async fn test_breaker_opens_then_recovers() {
    let backend = start_backend(200, "orders").await;
    backend.set_down(true);

    let mut config = test_config(vec![service("order-service", "/api/orders", Some(backend.url()))]);
    config.forwarder.max_retries = 0;
    config.breaker.failure_threshold = 3;
    config.breaker.reset_timeout_secs = 1;
    let (gateway, _shutdown) = start_gateway(config).await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/orders/7", gateway);

    for _ in 0..3 {
        let res = client.get(&url).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["code"], "UPSTREAM_UNREACHABLE");
    }
    assert_eq!(backend.accepted(), 3);

    // Open: rejected without touching the backend
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "BREAKER_OPEN");
    assert_eq!(body["error"], "order-service is temporarily unavailable");
    assert_eq!(backend.accepted(), 3);

    backend.set_down(false);
    tokio::time::sleep(Duration::from_millis(1200)).await;

    // Half-open trial succeeds and closes the circuit
    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "orders");

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(backend.accepted(), 5);
}

#[tokio::test]
async fn test_upstream_errors_pass_through_without_tripping() {
    let missing = start_backend(404, "no such user").await;
    let broken = start_backend(500, "boom").await;

    let mut config = test_config(vec![
        service("user-service", "/api/users", Some(missing.url())),
        service("payment-service", "/api/payments", Some(broken.url())),
    ]);
    config.breaker.failure_threshold = 2;
    let (gateway, _shutdown) = start_gateway(config).await;

    for _ in 0..4 {
        let res = reqwest::get(format!("{}/api/users/99", gateway)).await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.text().await.unwrap(), "no such user");

        let res = reqwest::get(format!("{}/api/payments/1", gateway)).await.unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.text().await.unwrap(), "boom");
    }
    assert_eq!(missing.accepted(), 4);
    assert_eq!(broken.accepted(), 4);
}

#[tokio::test]
async fn test_path_rewrite_and_forwarded_headers() {
    let backend = start_backend(200, "ok").await;
    let (gateway, _shutdown) =
        start_gateway(test_config(vec![service("menu-service", "/api/menu", Some(backend.url()))])).await;

    let client = reqwest::Client::new();
    client.get(format!("{}/api/menu/55", gateway)).send().await.unwrap();
    client
        .post(format!("{}/api/menu/items?page=2", gateway))
        .header("x-request-id", "req-42")
        .body("{}")
        .send()
        .await
        .unwrap();
    client.get(format!("{}/api/menu", gateway)).send().await.unwrap();

    assert_eq!(
        backend.request_lines(),
        vec![
            "GET /55 HTTP/1.1".to_string(),
            "POST /items?page=2 HTTP/1.1".to_string(),
            "GET / HTTP/1.1".to_string(),
        ]
    );

    let head = backend.heads()[1].to_lowercase();
    assert!(head.contains("x-forwarded-for: 127.0.0.1"));
    assert!(head.contains("x-request-id: req-42"));
}

#[tokio::test]
async fn test_unknown_route() {
    let (gateway, _shutdown) = start_gateway(test_config(vec![])).await;

    let res = reqwest::get(format!("{}/api/unknown/1", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "NO_ROUTE_MATCH");
}

#[tokio::test]
async fn test_health_report() {
    let healthy = start_backend(200, "up").await;
    let failing = start_backend(503, "down").await;

    let (gateway, _shutdown) = start_gateway(test_config(vec![
        service("menu-service", "/api/menu", Some(healthy.url())),
        service("order-service", "/api/orders", Some(failing.url())),
        service("user-service", "/api/users", None),
    ]))
    .await;

    let res = reqwest::get(format!("{}/health", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["api_gateway"], "ok");
    assert_eq!(report["menu-service"], "ok");
    assert_eq!(report["order-service"], "unavailable");
    assert_eq!(report["user-service"], "unknown");

    assert_eq!(healthy.request_lines(), vec!["GET /health HTTP/1.1".to_string()]);
}

#[tokio::test]
async fn test_health_does_not_touch_breaker() {
    let backend = start_backend(200, "up").await;
    backend.set_down(true);

    let mut config = test_config(vec![service("menu-service", "/api/menu", Some(backend.url()))]);
    config.breaker.failure_threshold = 1;
    let (gateway, _shutdown) = start_gateway(config).await;

    for _ in 0..3 {
        let report: Value = reqwest::get(format!("{}/health", gateway))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(report["menu-service"], "unavailable");
    }

    backend.set_down(false);
    let res = reqwest::get(format!("{}/api/menu/1", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_rate_limit() {
    let backend = start_backend(200, "ok").await;
    let mut config = test_config(vec![service("menu-service", "/api/menu", Some(backend.url()))]);
    config.rate_limit.enabled = true;
    config.rate_limit.max_requests = 3;
    config.rate_limit.window_secs = 60;
    let (gateway, _shutdown) = start_gateway(config).await;

    for _ in 0..3 {
        let res = reqwest::get(format!("{}/api/menu/1", gateway)).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
    let res = reqwest::get(format!("{}/api/menu/1", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["code"], "RATE_LIMITED");
    assert_eq!(backend.accepted(), 3);
}

#[tokio::test]
async fn test_payload_too_large() {
    let backend = start_backend(200, "ok").await;
    let mut config = test_config(vec![service("review-service", "/api/reviews", Some(backend.url()))]);
    config.security.max_body_size = 16;
    let (gateway, _shutdown) = start_gateway(config).await;

    let res = reqwest::Client::new()
        .post(format!("{}/api/reviews", gateway))
        .body(vec![b'x'; 64])
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(backend.accepted(), 0);
}

#[tokio::test]
async fn test_graceful_shutdown_stops_listener() {
    let (gateway, shutdown) = start_gateway(test_config(vec![])).await;
    let res = reqwest::get(format!("{}/health", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(1))
        .build()
        .unwrap();
    assert!(client.get(format!("{}/health", gateway)).send().await.is_err());
}
