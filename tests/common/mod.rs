//! Shared utilities for integration and load testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use edge_gateway::config::{GatewayConfig, ServiceConfig};
use edge_gateway::{GatewayServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Raw-TCP mock backend.
///
/// Counts every accepted connection. While `down`, or while `drop_first`
/// is non-zero, connections are closed without a response. Otherwise the
/// request head is read, recorded, and answered with the fixed status/body.
pub struct MockBackend {
    pub addr: SocketAddr,
    accepted: Arc<AtomicU32>,
    drop_first: Arc<AtomicU32>,
    down: Arc<AtomicBool>,
    heads: Arc<Mutex<Vec<String>>>,
}

impl MockBackend {
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn accepted(&self) -> u32 {
        self.accepted.load(Ordering::SeqCst)
    }

    pub fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }

    pub fn drop_next(&self, n: u32) {
        self.drop_first.store(n, Ordering::SeqCst);
    }

    /// Request lines ("GET /path HTTP/1.1") seen so far.
    pub fn request_lines(&self) -> Vec<String> {
        self.heads()
            .iter()
            .filter_map(|h| h.lines().next().map(str::to_string))
            .collect()
    }

    /// Full request heads seen so far.
    pub fn heads(&self) -> Vec<String> {
        self.heads.lock().unwrap().clone()
    }
}

pub async fn start_backend(status: u16, body: &'static str) -> MockBackend {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let backend = MockBackend {
        addr: listener.local_addr().unwrap(),
        accepted: Arc::new(AtomicU32::new(0)),
        drop_first: Arc::new(AtomicU32::new(0)),
        down: Arc::new(AtomicBool::new(false)),
        heads: Arc::new(Mutex::new(Vec::new())),
    };

    let accepted = backend.accepted.clone();
    let drop_first = backend.drop_first.clone();
    let down = backend.down.clone();
    let heads = backend.heads.clone();

    tokio::spawn(async move {
        while let Ok((socket, _)) = listener.accept().await {
            accepted.fetch_add(1, Ordering::SeqCst);
            let dropping = down.load(Ordering::SeqCst)
                || drop_first
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                    .is_ok();
            if dropping {
                drop(socket);
                continue;
            }
            let heads = heads.clone();
            tokio::spawn(respond(socket, status, body, heads));
        }
    });

    backend
}

async fn respond(mut socket: TcpStream, status: u16, body: &'static str, heads: Arc<Mutex<Vec<String>>>) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            buf.truncate(end);
            break;
        }
    }
    heads.lock().unwrap().push(String::from_utf8_lossy(&buf).into_owned());

    let status_text = match status {
        200 => "200 OK",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/plain\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

pub fn service(name: &str, prefix: &str, url: Option<String>) -> ServiceConfig {
    ServiceConfig {
        name: name.into(),
        prefix: prefix.into(),
        strip_prefix: None,
        host: None,
        port: 80,
        url,
    }
}

/// Config with fast retries, no pooling and no rate limiting.
pub fn test_config(services: Vec<ServiceConfig>) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.services = services;
    config.rate_limit.enabled = false;
    config.observability.metrics_enabled = false;
    config.forwarder.retry_step_ms = 10;
    config.forwarder.attempt_timeout_ms = 2000;
    config.forwarder.pool_max_idle_per_host = 0;
    config.health.timeout_ms = 500;
    config
}

/// Start a gateway on an ephemeral port. Keep the `Shutdown` alive for the test.
pub async fn start_gateway(config: GatewayConfig) -> (String, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config);
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, rx).await.unwrap();
    });
    tokio::time::sleep(Duration::from_millis(50)).await;
    (format!("http://{}", addr), shutdown)
}
