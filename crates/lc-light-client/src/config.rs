//! # Light Client Configuration
//!
//! Endpoints, timeouts and sync bounds.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};

/// Headers discarded from the tip when an announcement does not link.
pub const DEFAULT_ROLLBACK_DEPTH: usize = 100;

/// Iteration guard for one backward walk.
pub const DEFAULT_MAX_WALK_DEPTH: usize = 1_000_000;

/// Genesis credit of the network root account.
pub const DEFAULT_ROOT_INITIAL_BALANCE: u64 = 1_000_000;

/// Light client configuration.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightClientConfig {
    /// Main bootstrap node, `host:port`.
    pub bootstrap_addr: String,

    /// Co-signing service, `host:port`.
    pub cosigning_addr: String,

    /// Port advertised in the handshake.
    pub listen_port: u16,

    /// Bound on every request/response round-trip.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub fetch_timeout: Duration,

    /// Bound on dialing plus handshake.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub connect_timeout: Duration,

    /// Pause before retrying a failed header fetch.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub retry_backoff: Duration,

    /// Period of the pool health task.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub health_check_interval: Duration,

    /// Below this many live sessions the health task asks for neighbors.
    pub min_peers: usize,

    /// Dial attempts per neighbor address per health cycle.
    pub neighbor_dial_retries: u32,

    /// Fetch attempts per relevant block during reconstruction.
    pub block_fetch_retries: u32,

    /// Headers dropped from the tip on divergence.
    pub rollback_depth: usize,

    /// Maximum headers collected by one backward walk.
    pub max_walk_depth: usize,

    /// Balance credited to the root account with no matching transaction.
    pub root_initial_balance: u64,

    /// Buffered values per response kind.
    pub channel_capacity: usize,

    /// Header store location.
    pub header_db_path: PathBuf,
}

impl Default for LightClientConfig {
    fn default() -> Self {
        Self {
            bootstrap_addr: "127.0.0.1:8000".to_string(),
            cosigning_addr: "127.0.0.1:8002".to_string(),
            listen_port: 8001,
            fetch_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(20),
            retry_backoff: Duration::from_secs(1),
            health_check_interval: Duration::from_secs(30),
            min_peers: 2,
            neighbor_dial_retries: 3,
            block_fetch_retries: 3,
            rollback_depth: DEFAULT_ROLLBACK_DEPTH,
            max_walk_depth: DEFAULT_MAX_WALK_DEPTH,
            root_initial_balance: DEFAULT_ROOT_INITIAL_BALANCE,
            channel_capacity: 1,
            header_db_path: PathBuf::from("client.db"),
        }
    }
}

impl LightClientConfig {
    /// Create a config for testing (short timeouts, small bounds).
    pub fn for_testing() -> Self {
        Self {
            fetch_timeout: Duration::from_millis(200),
            connect_timeout: Duration::from_millis(500),
            retry_backoff: Duration::from_millis(10),
            health_check_interval: Duration::from_millis(100),
            min_peers: 1,
            neighbor_dial_retries: 1,
            block_fetch_retries: 2,
            rollback_depth: 10,
            max_walk_depth: 10_000,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LightClientConfig::default();
        assert_eq!(config.bootstrap_addr, "127.0.0.1:8000");
        assert_eq!(config.listen_port, 8001);
        assert_eq!(config.rollback_depth, 100);
        assert_eq!(config.channel_capacity, 1);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_testing_config() {
        let config = LightClientConfig::for_testing();
        assert!(config.fetch_timeout < Duration::from_secs(1));
        assert_eq!(config.min_peers, 1);
    }
}
