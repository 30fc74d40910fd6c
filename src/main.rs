//! Edge API gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                   EDGE GATEWAY                    │
//!   Client Request     │  ┌──────────┐   ┌──────────┐   ┌──────────────┐   │
//!   ───────────────────┼─▶│middleware│──▶│ routing  │──▶│   circuit    │   │
//!                      │  │ id/trace │   │ registry │   │   breaker    │   │
//!                      │  │ cors/rl  │   │ +rewrite │   └──────┬───────┘   │
//!                      │  └──────────┘   └──────────┘          │           │
//!                      │                                       ▼           │
//!   Client Response    │                                ┌──────────────┐   │
//!   ◀──────────────────┼────────────────────────────────│  forwarder   │◀──┼── Backend
//!                      │                                │ retry+backoff│   │   Service
//!                      │                                └──────────────┘   │
//!                      │  /health → aggregator    /metrics → prometheus    │
//!                      └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use edge_gateway::config::{self, GatewayConfig};
use edge_gateway::lifecycle::{wait_for_signal, Shutdown};
use edge_gateway::observability::logging;
use edge_gateway::GatewayServer;

#[derive(Parser)]
#[command(name = "edge-gateway")]
#[command(about = "Edge API gateway routing to backend services", long_about = None)]
struct Args {
    /// Path to a TOML config file; built-in defaults are used when absent
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::load_config(path)?,
        None => config::finalize(GatewayConfig::default())?,
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-gateway starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = config.services.len(),
        failure_threshold = config.breaker.failure_threshold,
        max_retries = config.forwarder.max_retries,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = GatewayServer::new(config);
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            tracing::warn!("Server exited without a shutdown signal");
            return Ok(());
        }
        _ = wait_for_signal() => {}
    }

    shutdown.trigger();
    server_task.await??;
    tracing::info!("Shutdown complete");
    Ok(())
}
