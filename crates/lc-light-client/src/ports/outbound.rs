//! # Outbound Ports
//!
//! Traits for external dependencies (full nodes, the co-signing service and
//! the key holder).

use std::collections::HashMap;

use async_trait::async_trait;
use lc_types::{
    Account, Address, Block, BlockHeader, FundsTx, Hash, Signature, Transaction, TxKind,
};
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::algorithms::build_merkle_path;
use crate::domain::{BroadcastTarget, LightClientError};

/// Full node connection - outbound port.
///
/// Every call is time-bounded by the implementation.
#[async_trait]
pub trait FullNodeConnection: Send + Sync {
    /// Header by hash, or the current tip when `hash` is `None`.
    async fn fetch_header(&self, hash: Option<Hash>) -> Result<BlockHeader, LightClientError>;

    /// Full block body.
    async fn fetch_block(&self, hash: Hash) -> Result<Block, LightClientError>;

    /// Transaction of `kind` by hash.
    async fn fetch_tx(&self, kind: TxKind, hash: Hash) -> Result<Transaction, LightClientError>;

    /// Remote account record; `root` asks the root-account registry instead.
    /// `None` means the node does not know the account.
    async fn fetch_account(
        &self,
        address_hash: Hash,
        root: bool,
    ) -> Result<Option<Account>, LightClientError>;

    /// Flat sibling/parent path for `tx_hash` inside `block_hash`.
    async fn fetch_merkle_path(
        &self,
        block_hash: Hash,
        tx_hash: Hash,
    ) -> Result<Vec<Hash>, LightClientError>;

    /// Transfers touching the account that the co-signing service holds but
    /// that are not yet in a block.
    async fn fetch_non_verified_txs(
        &self,
        address_hash: Hash,
    ) -> Result<Vec<FundsTx>, LightClientError>;

    /// Submit a signed transaction.
    async fn broadcast_tx(
        &self,
        target: BroadcastTarget,
        tx: &Transaction,
    ) -> Result<(), LightClientError>;

    /// Subscribe to unsolicited new-tip header announcements.
    fn subscribe_headers(&self) -> broadcast::Receiver<BlockHeader>;
}

/// Key holder - outbound port. The core never loads key material itself.
pub trait TxSigner: Send + Sync {
    /// Address (public key) of the held key.
    fn address(&self) -> Address;

    /// Sign a transaction hash.
    fn sign(&self, hash: &Hash) -> Result<Signature, LightClientError>;
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

#[derive(Default)]
struct MockChain {
    headers: HashMap<Hash, BlockHeader>,
    tip: Option<Hash>,
    blocks: HashMap<Hash, Block>,
    txs: HashMap<Hash, Transaction>,
    accounts: HashMap<Hash, Account>,
    root_accounts: HashMap<Hash, Account>,
    non_verified: HashMap<Hash, Vec<FundsTx>>,
    broadcasts: Vec<(BroadcastTarget, Transaction)>,
    failing_header_fetches: usize,
    failing_broadcasts: bool,
    failing_account_lookups: usize,
    header_fetches: usize,
    account_fetches: usize,
    block_fetches: usize,
}

/// In-memory full node for tests.
///
/// Merkle paths are computed from the stored block's leaves, so headers
/// must carry the matching root.
pub struct MockFullNode {
    chain: Mutex<MockChain>,
    announcements: broadcast::Sender<BlockHeader>,
}

impl Default for MockFullNode {
    fn default() -> Self {
        let (announcements, _) = broadcast::channel(64);
        Self {
            chain: Mutex::new(MockChain::default()),
            announcements,
        }
    }
}

impl MockFullNode {
    /// Empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a header without moving the tip.
    pub fn insert_header(&self, header: BlockHeader) {
        self.chain.lock().headers.insert(header.hash, header);
    }

    /// Store headers in order and point the tip at the last one.
    pub fn extend_chain(&self, headers: impl IntoIterator<Item = BlockHeader>) {
        let mut chain = self.chain.lock();
        for header in headers {
            chain.tip = Some(header.hash);
            chain.headers.insert(header.hash, header);
        }
    }

    /// Point the tip at a stored header.
    pub fn set_tip(&self, hash: Hash) {
        self.chain.lock().tip = Some(hash);
    }

    /// Store a block body and its header.
    pub fn insert_block(&self, block: Block) {
        let mut chain = self.chain.lock();
        chain.headers.insert(block.header.hash, block.header.clone());
        chain.blocks.insert(block.header.hash, block);
    }

    /// Store a transaction under its canonical hash.
    pub fn insert_tx(&self, tx: Transaction) {
        self.chain.lock().txs.insert(tx.hash(), tx);
    }

    /// Register a remote account.
    pub fn insert_account(&self, address_hash: Hash, account: Account) {
        self.chain.lock().accounts.insert(address_hash, account);
    }

    /// Register a root account.
    pub fn insert_root_account(&self, address_hash: Hash, account: Account) {
        self.chain.lock().root_accounts.insert(address_hash, account);
    }

    /// Queue a co-signing-service transfer for an account.
    pub fn insert_non_verified(&self, address_hash: Hash, tx: FundsTx) {
        self.chain
            .lock()
            .non_verified
            .entry(address_hash)
            .or_default()
            .push(tx);
    }

    /// Store `header`, move the tip to it and announce it.
    pub fn announce(&self, header: BlockHeader) {
        {
            let mut chain = self.chain.lock();
            chain.tip = Some(header.hash);
            chain.headers.insert(header.hash, header.clone());
        }
        // No subscriber is not an error for a mock.
        let _ = self.announcements.send(header);
    }

    /// Fail the next `count` header fetches with `FetchTimedOut`.
    pub fn fail_next_header_fetches(&self, count: usize) {
        self.chain.lock().failing_header_fetches = count;
    }

    /// Fail the next `count` account lookups with `FetchTimedOut`.
    pub fn fail_next_account_lookups(&self, count: usize) {
        self.chain.lock().failing_account_lookups = count;
    }

    /// Make every broadcast fail with `NotFound`.
    pub fn set_broadcast_failure(&self, fail: bool) {
        self.chain.lock().failing_broadcasts = fail;
    }

    /// Broadcasts received so far.
    pub fn broadcasts(&self) -> Vec<(BroadcastTarget, Transaction)> {
        self.chain.lock().broadcasts.clone()
    }

    /// Header fetches served or failed so far.
    pub fn header_fetches(&self) -> usize {
        self.chain.lock().header_fetches
    }

    /// Account lookups served or failed so far.
    pub fn account_fetches(&self) -> usize {
        self.chain.lock().account_fetches
    }

    /// Block fetches served so far.
    pub fn block_fetches(&self) -> usize {
        self.chain.lock().block_fetches
    }
}

#[async_trait]
impl FullNodeConnection for MockFullNode {
    async fn fetch_header(&self, hash: Option<Hash>) -> Result<BlockHeader, LightClientError> {
        let mut chain = self.chain.lock();
        chain.header_fetches += 1;
        if chain.failing_header_fetches > 0 {
            chain.failing_header_fetches -= 1;
            return Err(LightClientError::FetchTimedOut { kind: "header" });
        }
        let target = match hash.or(chain.tip) {
            Some(target) => target,
            None => return Err(LightClientError::NotFound("no tip".into())),
        };
        chain
            .headers
            .get(&target)
            .cloned()
            .ok_or(LightClientError::FetchTimedOut { kind: "header" })
    }

    async fn fetch_block(&self, hash: Hash) -> Result<Block, LightClientError> {
        let mut chain = self.chain.lock();
        chain.block_fetches += 1;
        chain
            .blocks
            .get(&hash)
            .cloned()
            .ok_or(LightClientError::FetchTimedOut { kind: "block" })
    }

    async fn fetch_tx(&self, kind: TxKind, hash: Hash) -> Result<Transaction, LightClientError> {
        self.chain
            .lock()
            .txs
            .get(&hash)
            .filter(|tx| tx.kind() == kind)
            .cloned()
            .ok_or(LightClientError::FetchTimedOut { kind: "transaction" })
    }

    async fn fetch_account(
        &self,
        address_hash: Hash,
        root: bool,
    ) -> Result<Option<Account>, LightClientError> {
        let mut chain = self.chain.lock();
        chain.account_fetches += 1;
        if chain.failing_account_lookups > 0 {
            chain.failing_account_lookups -= 1;
            return Err(LightClientError::FetchTimedOut { kind: "account" });
        }
        let registry = if root {
            &chain.root_accounts
        } else {
            &chain.accounts
        };
        Ok(registry.get(&address_hash).cloned())
    }

    async fn fetch_merkle_path(
        &self,
        block_hash: Hash,
        tx_hash: Hash,
    ) -> Result<Vec<Hash>, LightClientError> {
        let chain = self.chain.lock();
        let block = chain
            .blocks
            .get(&block_hash)
            .ok_or(LightClientError::FetchTimedOut { kind: "intermediate nodes" })?;
        let leaves = block.leaves();
        leaves
            .iter()
            .position(|leaf| *leaf == tx_hash)
            .and_then(|idx| build_merkle_path(&leaves, idx))
            .ok_or(LightClientError::FetchTimedOut { kind: "intermediate nodes" })
    }

    async fn fetch_non_verified_txs(
        &self,
        address_hash: Hash,
    ) -> Result<Vec<FundsTx>, LightClientError> {
        Ok(self
            .chain
            .lock()
            .non_verified
            .get(&address_hash)
            .cloned()
            .unwrap_or_default())
    }

    async fn broadcast_tx(
        &self,
        target: BroadcastTarget,
        tx: &Transaction,
    ) -> Result<(), LightClientError> {
        let mut chain = self.chain.lock();
        if chain.failing_broadcasts {
            return Err(LightClientError::NotFound("mock broadcast rejected".into()));
        }
        chain.broadcasts.push((target, tx.clone()));
        Ok(())
    }

    fn subscribe_headers(&self) -> broadcast::Receiver<BlockHeader> {
        self.announcements.subscribe()
    }
}

/// Signer returning a fixed signature.
#[derive(Clone)]
pub struct MockSigner {
    /// Address reported by the signer.
    pub address: Address,
    /// Signature returned for every hash.
    pub signature: Signature,
}

impl TxSigner for MockSigner {
    fn address(&self) -> Address {
        self.address
    }

    fn sign(&self, _hash: &Hash) -> Result<Signature, LightClientError> {
        Ok(self.signature)
    }
}
