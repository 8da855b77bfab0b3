//! # Light Client Runtime
//!
//! Wires the light client together for the `light-client` binary.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `LC_*` environment overrides)
//! 2. Open the header store; failure here is fatal
//! 3. Connect to the bootstrap node (the health task retries on failure)
//! 4. Spawn the health task and the header synchronizer
//! 5. Optionally reconstruct a watched account once the chain is synced

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use lc_header_store::{FileBackedKVStore, KvHeaderStore};
use lc_light_client::{
    ClientSession, HealthMonitor, LightClientApi, LightClientConfig, NetworkClient, SyncState,
};
use lc_types::{short_hex, Address};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Session type the binary runs.
pub type RuntimeSession = ClientSession<NetworkClient, KvHeaderStore<FileBackedKVStore>>;

/// Apply `LC_*` overrides from `lookup` on top of `config`.
///
/// Unparseable values are logged and ignored.
pub fn apply_overrides(
    mut config: LightClientConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> LightClientConfig {
    if let Some(addr) = lookup("LC_BOOTSTRAP_ADDR") {
        config.bootstrap_addr = addr;
    }
    if let Some(addr) = lookup("LC_COSIGNING_ADDR") {
        config.cosigning_addr = addr;
    }
    if let Some(port) = lookup("LC_LISTEN_PORT") {
        match port.parse() {
            Ok(p) => config.listen_port = p,
            Err(_) => warn!("LC_LISTEN_PORT '{}' is not a port", port),
        }
    }
    if let Some(secs) = lookup("LC_FETCH_TIMEOUT_SECS") {
        match secs.parse() {
            Ok(s) => config.fetch_timeout = Duration::from_secs(s),
            Err(_) => warn!("LC_FETCH_TIMEOUT_SECS '{}' is not a number", secs),
        }
    }
    if let Some(path) = lookup("LC_HEADER_DB") {
        config.header_db_path = PathBuf::from(path);
    }
    if let Some(balance) = lookup("LC_ROOT_INITIAL_BALANCE") {
        match balance.parse() {
            Ok(b) => config.root_initial_balance = b,
            Err(_) => warn!("LC_ROOT_INITIAL_BALANCE '{}' is not a number", balance),
        }
    }
    config
}

/// Load configuration from the process environment.
pub fn load_config() -> LightClientConfig {
    apply_overrides(LightClientConfig::default(), |key| std::env::var(key).ok())
}

/// Parse a hex-encoded 64-byte address.
pub fn parse_address(text: &str) -> Result<Address> {
    let bytes = hex::decode(text.trim()).context("address is not hex")?;
    if bytes.len() != 64 {
        bail!("address must be 64 bytes, got {}", bytes.len());
    }
    let mut address = [0u8; 64];
    address.copy_from_slice(&bytes);
    Ok(address)
}

/// The running light client.
pub struct LightClientRuntime {
    network: Arc<NetworkClient>,
    session: Arc<RuntimeSession>,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl LightClientRuntime {
    /// Open the header store and build the session.
    ///
    /// # Errors
    /// Fails if the header store cannot be opened.
    pub fn new(config: LightClientConfig) -> Result<Self> {
        let kv = FileBackedKVStore::open(&config.header_db_path).with_context(|| {
            format!("Failed to open header store at {:?}", config.header_db_path)
        })?;
        let store = Arc::new(KvHeaderStore::new(kv));
        let network = Arc::new(NetworkClient::new(config.clone()));
        let session = Arc::new(ClientSession::new(config, Arc::clone(&network), store));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            network,
            session,
            shutdown_tx,
            shutdown_rx,
            handles: Vec::new(),
        })
    }

    /// The client session.
    pub fn session(&self) -> Arc<RuntimeSession> {
        Arc::clone(&self.session)
    }

    /// Connect and spawn the background tasks.
    pub async fn start(&mut self, watch_address: Option<Address>) {
        let config = self.network.config().clone();
        info!("===========================================");
        info!("  Light Client v{}", lc_light_client::VERSION);
        info!("===========================================");
        info!("Bootstrap: {}", config.bootstrap_addr);
        info!("Co-signer: {}", config.cosigning_addr);
        info!("Header DB: {:?}", config.header_db_path);

        if let Err(e) = self.network.connect(&config.bootstrap_addr).await {
            warn!("[lc-net] Bootstrap connection failed, health task will retry: {}", e);
        }

        let monitor = HealthMonitor::new(Arc::clone(&self.network));
        self.handles
            .push(tokio::spawn(monitor.run(self.shutdown_rx.clone())));

        let synchronizer = self.session.synchronizer();
        self.handles
            .push(tokio::spawn(synchronizer.run(self.shutdown_rx.clone())));

        if let Some(address) = watch_address {
            let session = Arc::clone(&self.session);
            let mut shutdown = self.shutdown_rx.clone();
            self.handles.push(tokio::spawn(async move {
                tokio::select! {
                    _ = report_account(session, address) => {}
                    _ = shutdown.changed() => {}
                }
            }));
        }
    }

    /// Signal every task and wait for them, bounded by `grace`.
    pub async fn shutdown(self, grace: Duration) {
        info!("Initiating graceful shutdown...");
        if let Err(e) = self.shutdown_tx.send(true) {
            error!("Failed to send shutdown signal: {}", e);
        }
        for handle in self.handles {
            if tokio::time::timeout(grace, handle).await.is_err() {
                warn!("A task did not stop within {:?}", grace);
            }
        }
        info!("Shutdown complete");
    }
}

async fn report_account(session: Arc<RuntimeSession>, address: Address) {
    while session.sync_state() != SyncState::UpToDate {
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    match session.query_account(&address).await {
        Ok((account, recent)) => {
            info!(
                "Account {}: balance {}, txCnt {}, created {}, root {}, staking {}",
                short_hex(&account.address_hash),
                account.balance,
                account.tx_cnt,
                account.is_created,
                account.is_root,
                account.is_staking
            );
            for tx in recent {
                info!(
                    "  {} -> {}: {} (fee {}, {})",
                    short_hex(&tx.from),
                    short_hex(&tx.to),
                    tx.amount,
                    tx.fee,
                    tx.status.as_str()
                );
            }
        }
        Err(e) => error!("Could not reconstruct watched account: {}", e),
    }
}
