//! Prometheus exposition through the gateway listener.

use reqwest::StatusCode;

mod common;

use common::{service, start_backend, start_gateway, test_config};

#[tokio::test]
async fn test_metrics_exposed_after_traffic() {
    let backend = start_backend(200, "ok").await;
    let mut config = test_config(vec![service("menu-service", "/api/menu", Some(backend.url()))]);
    config.observability.metrics_enabled = true;
    let (gateway, _shutdown) = start_gateway(config).await;

    reqwest::get(format!("{}/api/menu/1", gateway)).await.unwrap();
    reqwest::get(format!("{}/nowhere", gateway)).await.unwrap();

    let res = reqwest::get(format!("{}/metrics", gateway)).await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.text().await.unwrap();
    assert!(body.contains("gateway_requests_total"));
    assert!(body.contains("route=\"/api/menu\""));
    assert!(body.contains("status=\"404\""));
}

#[tokio::test]
async fn test_breaker_gauge_published_at_startup() {
    let mut config = test_config(vec![
        service("menu-service", "/api/menu", None),
        service("review-service", "/api/reviews", None),
    ]);
    config.observability.metrics_enabled = true;
    let (gateway, _shutdown) = start_gateway(config).await;

    let body = reqwest::get(format!("{}/metrics", gateway)).await.unwrap().text().await.unwrap();
    for service in ["menu-service", "review-service"] {
        let series = format!("gateway_circuit_breaker_state{{service=\"{}\"}}", service);
        let value = body
            .lines()
            .find_map(|line| line.strip_prefix(series.as_str()))
            .map(|v| v.trim().parse::<f64>().unwrap());
        assert_eq!(value, Some(0.0), "missing closed gauge for {}", service);
    }
}
