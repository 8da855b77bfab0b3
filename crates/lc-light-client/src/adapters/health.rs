//! # Pool Health Task
//!
//! On a fixed interval: reconnect the bootstrap node if it is not in the
//! pool, and when the pool is below the minimum, ask a peer for neighbors
//! and dial each in its own task with a bounded number of attempts.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::network::NetworkClient;

/// Periodic pool maintenance.
pub struct HealthMonitor {
    client: Arc<NetworkClient>,
}

impl HealthMonitor {
    /// Monitor the pool of `client`.
    pub fn new(client: Arc<NetworkClient>) -> Self {
        Self { client }
    }

    /// Run one maintenance pass.
    pub async fn check_once(&self) {
        let config = self.client.config();
        let pool = self.client.pool();

        if !pool.contains_addr(&config.bootstrap_addr) {
            info!(
                "[lc-net] Bootstrap {} not connected, reconnecting",
                config.bootstrap_addr
            );
            if let Err(e) = self.client.connect(&config.bootstrap_addr).await {
                warn!("[lc-net] Reconnecting bootstrap failed: {}", e);
            }
        }

        if pool.len() >= config.min_peers {
            return;
        }

        let neighbors = match self.client.neighbor_req().await {
            Ok(neighbors) => neighbors,
            Err(e) => {
                debug!("[lc-net] Neighbor request failed: {}", e);
                return;
            }
        };

        let mut dials = JoinSet::new();
        for neighbor in neighbors {
            let addr = neighbor.to_string();
            if pool.contains_addr(&addr) {
                continue;
            }
            debug!("[lc-net] IP/Port received: {}", addr);
            dials.spawn(dial_neighbor(
                Arc::clone(&self.client),
                addr,
                config.neighbor_dial_retries,
            ));
        }
        while dials.join_next().await.is_some() {}
    }

    /// Run until `shutdown` flips.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.client.config().health_check_interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.check_once().await,
                _ = shutdown.changed() => {
                    info!("[lc-net] Health monitor shutting down");
                    break;
                }
            }
        }
    }
}

async fn dial_neighbor(client: Arc<NetworkClient>, addr: String, retries: u32) {
    for attempt in 1..=retries {
        match client.connect(&addr).await {
            Ok(()) => return,
            Err(e) => debug!(
                "[lc-net] Dial {} attempt {}/{} failed: {}",
                addr, attempt, retries, e
            ),
        }
    }
}
