//! Periodic health refresh.
//!
//! # Responsibilities
//! - Run the aggregator on a fixed interval
//! - Keep the service status gauge current between scrapes
//! - Log status changes

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time;

use crate::health::aggregator::HealthAggregator;
use crate::health::state::HealthStatus;

pub struct HealthMonitor {
    aggregator: Arc<HealthAggregator>,
    interval: Duration,
}

impl HealthMonitor {
    pub fn new(aggregator: Arc<HealthAggregator>, interval: Duration) -> Self {
        Self {
            aggregator,
            interval,
        }
    }

    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        if self.interval.is_zero() {
            tracing::info!("Background health monitor disabled");
            return;
        }

        tracing::info!(interval_secs = self.interval.as_secs(), "Health monitor starting");

        let mut ticker = time::interval(self.interval);
        let mut last: BTreeMap<String, HealthStatus> = BTreeMap::new();

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.aggregator.check_all().await;
                    for (service, status) in &report {
                        if last.get(service) != Some(status) {
                            tracing::info!(service = %service, status = ?status, "Service health changed");
                        }
                    }
                    last = report;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }
}
