//! # Header-Chain Synchronizer
//!
//! ```text
//! Uninitialized --startup--> Syncing --chain assembled--> UpToDate
//!                                                          |    ^
//!                         announcement does not link to tip |    | spliced
//!                                                          v    |
//!                                                        Reconciling
//! ```
//!
//! Startup loads the stored chain, fetches the network tip and walks back
//! until it reaches a held header or genesis. Afterwards a listener follows
//! new-tip announcements: a header on the tip is appended, a duplicate is
//! ignored, anything else drops a bounded suffix and re-walks from the
//! announced header. Ancestor fetches retry until they succeed.

use std::collections::HashSet;
use std::sync::Arc;

use lc_header_store::HeaderStore;
use lc_types::{decode, encode, short_hex, BlockHeader, Hash};
use parking_lot::{Mutex, RwLock};
use tokio::sync::{broadcast, watch};
use tracing::{debug, error, info, warn};

use crate::algorithms::{validate_header_batch, AncestorWalk, WalkStep};
use crate::config::LightClientConfig;
use crate::domain::{ChainTip, HeaderChain, LightClientError, SyncState};
use crate::ports::FullNodeConnection;

/// What happened to an announced header.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnouncementOutcome {
    /// Already held.
    Ignored,
    /// Appended at the tip.
    Appended,
    /// Triggered a rollback and re-walk.
    Reconciled,
}

/// Keeps the local header chain in line with the network.
pub struct HeaderSynchronizer<N: FullNodeConnection, S: HeaderStore> {
    config: LightClientConfig,
    node: Arc<N>,
    store: Arc<S>,
    chain: Arc<RwLock<HeaderChain>>,
    state: Mutex<SyncState>,
}

impl<N: FullNodeConnection, S: HeaderStore> HeaderSynchronizer<N, S> {
    /// Create a synchronizer with an empty chain.
    pub fn new(config: LightClientConfig, node: Arc<N>, store: Arc<S>) -> Self {
        Self {
            config,
            node,
            store,
            chain: Arc::new(RwLock::new(HeaderChain::new())),
            state: Mutex::new(SyncState::Uninitialized),
        }
    }

    /// Shared handle to the chain.
    pub fn chain(&self) -> Arc<RwLock<HeaderChain>> {
        Arc::clone(&self.chain)
    }

    /// Current state.
    pub fn state(&self) -> SyncState {
        *self.state.lock()
    }

    /// Current tip, if any.
    pub fn tip(&self) -> Option<ChainTip> {
        self.chain.read().tip()
    }

    fn set_state(&self, state: SyncState) {
        let mut current = self.state.lock();
        if *current != state {
            debug!("[lc-sync] State {:?} -> {:?}", *current, state);
            *current = state;
        }
    }

    fn read_stored(&self, hash: &Hash) -> Result<Option<BlockHeader>, LightClientError> {
        match self.store.get_header(hash)? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Rebuild the chain from the store by walking back from the last tip.
    ///
    /// Returns the number of headers loaded.
    ///
    /// # Errors
    /// - `InvalidHeaderChain` if a stored ancestor is missing or mislinked
    /// - `Store` / `Codec` on read or decode failure
    pub fn load_from_store(&self) -> Result<usize, LightClientError> {
        let Some(bytes) = self.store.get_last()? else {
            return Ok(0);
        };
        let last: BlockHeader = decode(&bytes)?;

        let mut walk = AncestorWalk::new(last, self.config.max_walk_depth);
        while let WalkStep::Fetch(hash) = walk.next_step(|_| false) {
            let ancestor = self.read_stored(&hash)?.ok_or_else(|| {
                LightClientError::InvalidHeaderChain(format!(
                    "stored ancestor {} missing",
                    short_hex(&hash)
                ))
            })?;
            walk.push_ancestor(ancestor)?;
        }

        let loaded = HeaderChain::from_ordered(walk.into_ordered())?;
        let count = loaded.len();
        if let Some(tip) = loaded.tip() {
            info!(
                "[lc-sync] Loaded {} headers from store, tip {} at height {}",
                count,
                short_hex(&tip.hash),
                tip.height
            );
        }
        *self.chain.write() = loaded;
        Ok(count)
    }

    async fn fetch_tip(&self) -> BlockHeader {
        loop {
            match self.node.fetch_header(None).await {
                Ok(tip) => return tip,
                Err(e) => {
                    warn!("[lc-sync] Fetching tip failed, retrying: {}", e);
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
            }
        }
    }

    async fn fetch_ancestor(&self, hash: Hash, child: &BlockHeader) -> BlockHeader {
        match self.read_stored(&hash) {
            Ok(Some(header)) if header.hash == hash => return header,
            Ok(_) => {}
            Err(e) => debug!("[lc-sync] Cached header {} unreadable: {}", short_hex(&hash), e),
        }

        loop {
            match self.node.fetch_header(Some(hash)).await {
                Ok(header) if header.hash == hash => return header,
                Ok(header) => warn!(
                    "[lc-sync] Asked for {}, got {}; retrying",
                    short_hex(&hash),
                    short_hex(&header.hash)
                ),
                Err(e) => warn!(
                    "[lc-sync] Try to fetch parent of header {} with height {} again: {}",
                    short_hex(&child.hash),
                    child.height,
                    e
                ),
            }
            tokio::time::sleep(self.config.retry_backoff).await;
        }
    }

    fn persist(&self, headers: &[BlockHeader]) -> Result<(), LightClientError> {
        for header in headers {
            self.store.put_header(&header.hash, &encode(header)?)?;
        }
        self.write_last()
    }

    fn write_last(&self) -> Result<(), LightClientError> {
        let tip = self.chain.read().tip_header().cloned();
        if let Some(tip) = tip {
            self.store.put_last(&encode(&tip)?)?;
        }
        Ok(())
    }

    /// Walk back from `start` until a held header or genesis, then replace
    /// everything after the reconnection point with the walked segment.
    ///
    /// `dropped` are headers already removed from the chain by the caller;
    /// they are deleted from the store unless the new chain holds them.
    async fn resync_from(
        &self,
        start: BlockHeader,
        dropped: Vec<BlockHeader>,
    ) -> Result<usize, LightClientError> {
        let mut walk = AncestorWalk::new(start, self.config.max_walk_depth);
        let anchor = loop {
            let step = {
                let chain = self.chain.read();
                walk.next_step(|h| chain.contains(h))
            };
            match step {
                WalkStep::Fetch(hash) => {
                    let child = walk.oldest().clone();
                    let ancestor = self.fetch_ancestor(hash, &child).await;
                    walk.push_ancestor(ancestor)?;
                    if walk.depth() % 1000 == 0 {
                        info!("[lc-sync] Walked back {} headers", walk.depth());
                    }
                }
                WalkStep::Reconnected(anchor) => break Some(anchor),
                WalkStep::ReachedGenesis => break None,
            }
        };

        let segment = walk.into_ordered();
        validate_header_batch(&segment)?;

        let mut removed = dropped;
        {
            let mut chain = self.chain.write();
            removed.extend(match anchor {
                Some(anchor) => chain.truncate_after(&anchor),
                None => {
                    let len = chain.len();
                    chain.drop_suffix(len)
                }
            });
            chain.splice(segment.clone())?;
        }

        let kept: HashSet<Hash> = segment.iter().map(|h| h.hash).collect();
        for header in removed.iter().filter(|h| !kept.contains(&h.hash)) {
            self.store.delete_header(&header.hash)?;
        }
        self.persist(&segment)?;

        Ok(segment.len())
    }

    /// Load from store, then catch up with the network tip.
    ///
    /// The state returns to `Uninitialized` if the walk fails.
    pub async fn initial_sync(&self) -> Result<(), LightClientError> {
        self.set_state(SyncState::Syncing);
        let result = self.catch_up().await;
        self.set_state(match result {
            Ok(()) => SyncState::UpToDate,
            Err(_) => SyncState::Uninitialized,
        });
        result
    }

    async fn catch_up(&self) -> Result<(), LightClientError> {
        if let Err(e) = self.load_from_store() {
            error!("[lc-sync] Stored chain unusable, resyncing from network: {}", e);
            *self.chain.write() = HeaderChain::new();
        }

        let tip = self.fetch_tip().await;
        let known = self.chain.read().contains(&tip.hash);
        if known {
            info!("[lc-sync] Stored chain is up to date at height {}", tip.height);
        } else {
            let height = tip.height;
            let count = self.resync_from(tip, Vec::new()).await?;
            info!("[lc-sync] Synced {} headers up to height {}", count, height);
        }
        Ok(())
    }

    /// Apply one announced header.
    pub async fn on_announcement(
        &self,
        header: BlockHeader,
    ) -> Result<AnnouncementOutcome, LightClientError> {
        let (held, extends) = {
            let chain = self.chain.read();
            (chain.contains(&header.hash), chain.extends_tip(&header))
        };

        if held {
            debug!("[lc-sync] Ignoring known header {}", short_hex(&header.hash));
            return Ok(AnnouncementOutcome::Ignored);
        }

        if extends {
            self.store.put_header(&header.hash, &encode(&header)?)?;
            info!(
                "[lc-sync] Header {} with height {} appended",
                short_hex(&header.hash),
                header.height
            );
            self.chain.write().append(header)?;
            self.write_last()?;
            return Ok(AnnouncementOutcome::Appended);
        }

        self.reconcile(header).await?;
        Ok(AnnouncementOutcome::Reconciled)
    }

    async fn reconcile(&self, header: BlockHeader) -> Result<(), LightClientError> {
        self.set_state(SyncState::Reconciling);

        let dropped = {
            let mut chain = self.chain.write();
            let depth = self.config.rollback_depth.min(chain.len());
            chain.drop_suffix(depth)
        };
        warn!(
            "[lc-sync] Header {} at height {} does not extend tip, dropped {} headers",
            short_hex(&header.hash),
            header.height,
            dropped.len()
        );

        let result = self.resync_from(header, dropped.clone()).await;
        if let Err(e) = &result {
            error!("[lc-sync] Reconciliation failed, restoring chain: {}", e);
            let mut chain = self.chain.write();
            let held: HashSet<Hash> = chain.headers().iter().map(|h| h.hash).collect();
            let restore: Vec<BlockHeader> = dropped
                .into_iter()
                .filter(|h| !held.contains(&h.hash))
                .collect();
            if let Err(restore_err) = chain.splice(restore) {
                error!("[lc-sync] Could not restore dropped headers: {}", restore_err);
            }
        }

        self.set_state(SyncState::UpToDate);
        result.map(|count| {
            info!("[lc-sync] Reconciled, spliced {} headers", count);
        })
    }

    /// Sync until it succeeds, then follow announcements until `shutdown`
    /// flips.
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut announcements = self.node.subscribe_headers();

        loop {
            tokio::select! {
                result = self.initial_sync() => match result {
                    Ok(()) => break,
                    Err(e) => error!(
                        "[lc-sync] Initial sync failed, retrying in {:?}: {}",
                        self.config.retry_backoff, e
                    ),
                },
                _ = shutdown.changed() => return,
            }
            tokio::select! {
                _ = tokio::time::sleep(self.config.retry_backoff) => {}
                _ = shutdown.changed() => return,
            }
        }

        loop {
            tokio::select! {
                received = announcements.recv() => match received {
                    Ok(header) => match self.on_announcement(header).await {
                        Ok(AnnouncementOutcome::Reconciled) => {
                            // Headers queued during the re-walk are not trusted.
                            announcements = announcements.resubscribe();
                        }
                        Ok(_) => {}
                        Err(e) => warn!("[lc-sync] Announcement rejected: {}", e),
                    },
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("[lc-sync] Skipped {} announcements", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                },
                _ = shutdown.changed() => break,
            }
        }
        info!("[lc-sync] Header listener stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MockFullNode;
    use lc_header_store::{InMemoryKVStore, KvHeaderStore};
    use lc_types::ZERO_HASH;
    use std::time::Duration;

    type TestStore = KvHeaderStore<InMemoryKVStore>;

    fn make_hash(branch: u8, height: u32) -> Hash {
        let mut h = [0u8; 32];
        h[0] = branch;
        h[1..5].copy_from_slice(&height.to_be_bytes());
        h[31] = 1;
        h
    }

    /// Headers 1..=len on `branch`, the first linking to genesis.
    fn create_valid_chain(branch: u8, len: u32) -> Vec<BlockHeader> {
        (1..=len)
            .map(|height| {
                let prev = if height == 1 {
                    ZERO_HASH
                } else {
                    make_hash(branch, height - 1)
                };
                BlockHeader::new(make_hash(branch, height), prev, height, ZERO_HASH)
            })
            .collect()
    }

    fn fork_from(base: &BlockHeader, branch: u8, len: u32) -> Vec<BlockHeader> {
        let mut prev = base.hash;
        (base.height + 1..=base.height + len)
            .map(|height| {
                let header = BlockHeader::new(make_hash(branch, height), prev, height, ZERO_HASH);
                prev = header.hash;
                header
            })
            .collect()
    }

    fn setup(
        remote: &[BlockHeader],
    ) -> (
        Arc<MockFullNode>,
        Arc<TestStore>,
        HeaderSynchronizer<MockFullNode, TestStore>,
    ) {
        let node = Arc::new(MockFullNode::new());
        node.extend_chain(remote.iter().cloned());
        let store = Arc::new(KvHeaderStore::new(InMemoryKVStore::new()));
        let sync = HeaderSynchronizer::new(
            LightClientConfig::for_testing(),
            Arc::clone(&node),
            Arc::clone(&store),
        );
        (node, store, sync)
    }

    #[tokio::test]
    async fn test_initial_sync_from_empty_store() {
        let remote = create_valid_chain(1, 8);
        let (_node, store, sync) = setup(&remote);
        assert_eq!(sync.state(), SyncState::Uninitialized);

        sync.initial_sync().await.unwrap();

        assert_eq!(sync.state(), SyncState::UpToDate);
        let chain = sync.chain();
        assert_eq!(chain.read().headers(), remote.as_slice());

        let last: BlockHeader = decode(&store.get_last().unwrap().unwrap()).unwrap();
        assert_eq!(last, remote[7]);
        for header in &remote {
            assert!(store.get_header(&header.hash).unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_initial_sync_resumes_from_store() {
        let remote = create_valid_chain(1, 10);
        let (node, store, first) = setup(&remote[..6]);
        first.initial_sync().await.unwrap();
        let fetches_before = node.header_fetches();

        node.extend_chain(remote[6..].iter().cloned());
        let second = HeaderSynchronizer::new(
            LightClientConfig::for_testing(),
            Arc::clone(&node),
            Arc::clone(&store),
        );
        second.initial_sync().await.unwrap();

        assert_eq!(second.chain().read().headers(), remote.as_slice());
        // Tip plus the three headers between the stored tip and the new one.
        assert_eq!(node.header_fetches() - fetches_before, 4);
    }

    #[tokio::test]
    async fn test_initial_sync_up_to_date_store() {
        let remote = create_valid_chain(1, 4);
        let (node, _store, sync) = setup(&remote);
        sync.initial_sync().await.unwrap();
        let fetches = node.header_fetches();

        sync.initial_sync().await.unwrap();
        assert_eq!(node.header_fetches(), fetches + 1);
        assert_eq!(sync.tip().unwrap().height, 4);
    }

    #[tokio::test]
    async fn test_fetch_retries_after_timeouts() {
        let remote = create_valid_chain(1, 3);
        let (node, _store, sync) = setup(&remote);
        node.fail_next_header_fetches(3);

        sync.initial_sync().await.unwrap();

        assert_eq!(sync.chain().read().len(), 3);
        assert!(node.header_fetches() >= 6);
    }

    #[tokio::test]
    async fn test_corrupt_store_triggers_resync() {
        let remote = create_valid_chain(1, 5);
        let (_node, store, sync) = setup(&remote);
        store.put_last(&[0xff, 0x01]).unwrap();

        sync.initial_sync().await.unwrap();
        assert_eq!(sync.chain().read().headers(), remote.as_slice());
    }

    #[test]
    fn test_missing_stored_ancestor_rejected() {
        let remote = create_valid_chain(1, 5);
        let (_node, store, sync) = setup(&remote);
        store.put_last(&encode(&remote[4]).unwrap()).unwrap();

        let err = sync.load_from_store().unwrap_err();
        assert!(matches!(err, LightClientError::InvalidHeaderChain(_)));
    }

    #[tokio::test]
    async fn test_announcement_appends_on_tip() {
        let remote = create_valid_chain(1, 5);
        let (_node, store, sync) = setup(&remote[..4]);
        sync.initial_sync().await.unwrap();

        let outcome = sync.on_announcement(remote[4].clone()).await.unwrap();
        assert_eq!(outcome, AnnouncementOutcome::Appended);
        assert_eq!(sync.tip().unwrap().hash, remote[4].hash);

        let last: BlockHeader = decode(&store.get_last().unwrap().unwrap()).unwrap();
        assert_eq!(last.hash, remote[4].hash);
    }

    #[tokio::test]
    async fn test_duplicate_announcement_ignored() {
        let remote = create_valid_chain(1, 5);
        let (_node, _store, sync) = setup(&remote);
        sync.initial_sync().await.unwrap();

        let outcome = sync.on_announcement(remote[2].clone()).await.unwrap();
        assert_eq!(outcome, AnnouncementOutcome::Ignored);
        assert_eq!(sync.chain().read().len(), 5);
    }

    #[tokio::test]
    async fn test_fork_reconciliation() {
        let main = create_valid_chain(1, 6);
        let (node, store, sync) = setup(&main);
        sync.initial_sync().await.unwrap();

        // Competing branch off height 3, one block longer.
        let fork = fork_from(&main[2], 2, 4);
        for header in &fork {
            node.insert_header(header.clone());
        }

        let announced = fork[3].clone();
        let outcome = sync.on_announcement(announced.clone()).await.unwrap();
        assert_eq!(outcome, AnnouncementOutcome::Reconciled);
        assert_eq!(sync.state(), SyncState::UpToDate);

        let chain = sync.chain();
        let chain = chain.read();
        assert_eq!(chain.len(), 7);
        assert_eq!(chain.tip().unwrap().hash, announced.hash);
        assert!(chain.contains(&main[2].hash));
        for orphan in &main[3..] {
            assert!(!chain.contains(&orphan.hash));
            assert!(store.get_header(&orphan.hash).unwrap().is_none());
        }
        for header in &fork {
            assert!(store.get_header(&header.hash).unwrap().is_some());
        }
    }

    #[tokio::test]
    async fn test_reconcile_reuses_dropped_headers() {
        // An announcement two ahead of the tip forces a rollback even
        // though the dropped suffix is still on the main chain.
        let remote = create_valid_chain(1, 8);
        let (node, store, sync) = setup(&remote[..5]);
        sync.initial_sync().await.unwrap();
        node.insert_header(remote[5].clone());

        let outcome = sync.on_announcement(remote[6].clone()).await.unwrap();
        assert_eq!(outcome, AnnouncementOutcome::Reconciled);
        assert_eq!(sync.chain().read().headers(), &remote[..7]);
        for header in &remote[..7] {
            assert!(store.get_header(&header.hash).unwrap().is_some());
        }
    }

    fn shallow_sync(
        node: &Arc<MockFullNode>,
        max_walk_depth: usize,
    ) -> Arc<HeaderSynchronizer<MockFullNode, TestStore>> {
        Arc::new(HeaderSynchronizer::new(
            LightClientConfig {
                max_walk_depth,
                ..LightClientConfig::for_testing()
            },
            Arc::clone(node),
            Arc::new(KvHeaderStore::new(InMemoryKVStore::new())),
        ))
    }

    #[tokio::test]
    async fn test_depth_guard_leaves_state_uninitialized() {
        let node = Arc::new(MockFullNode::new());
        node.extend_chain(create_valid_chain(1, 8));
        let sync = shallow_sync(&node, 4);

        let err = sync.initial_sync().await.unwrap_err();
        assert!(matches!(err, LightClientError::InvalidHeaderChain(_)));
        assert_eq!(sync.state(), SyncState::Uninitialized);
        assert!(sync.chain().read().is_empty());
    }

    #[tokio::test]
    async fn test_run_retries_failed_initial_sync() {
        let node = Arc::new(MockFullNode::new());
        node.extend_chain(create_valid_chain(1, 8));
        let sync = shallow_sync(&node, 4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&sync).run(shutdown_rx));

        for _ in 0..100 {
            if node.header_fetches() >= 4 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_ne!(sync.state(), SyncState::UpToDate);

        // The network moves to a chain short enough for the guard.
        let short = create_valid_chain(2, 3);
        node.extend_chain(short.iter().cloned());
        for _ in 0..200 {
            if sync.state() == SyncState::UpToDate {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(sync.state(), SyncState::UpToDate);
        assert_eq!(sync.chain().read().headers(), short.as_slice());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_run_follows_announcements_until_shutdown() {
        let remote = create_valid_chain(1, 6);
        let (node, _store, sync) = setup(&remote[..3]);
        let sync = Arc::new(sync);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Arc::clone(&sync).run(shutdown_rx));

        for _ in 0..100 {
            if sync.state() == SyncState::UpToDate {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(sync.state(), SyncState::UpToDate);

        for header in &remote[3..] {
            node.announce(header.clone());
        }
        for _ in 0..100 {
            if sync.tip().map(|t| t.height) == Some(6) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(sync.chain().read().headers(), remote.as_slice());

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
