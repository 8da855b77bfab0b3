//! # Domain Entities
//!
//! The local header chain and the account projection rebuilt from it.

use std::collections::{HashSet, VecDeque};

use lc_types::{short_hex, Address, BlockHeader, FundsTx, Signature};

use super::errors::{Hash, LightClientError};
use super::value_objects::{ChainTip, TxStatus};

/// Number of transfers kept in an account's recent-transfer window.
pub const TX_RING_CAPACITY: usize = 10;

/// Ordered header chain from genesis to tip.
///
/// Invariants: every header's `prev_hash` is the hash of the header before
/// it, the first header links to genesis, and no hash appears twice.
#[derive(Clone, Debug, Default)]
pub struct HeaderChain {
    headers: Vec<BlockHeader>,
    index: HashSet<Hash>,
}

impl HeaderChain {
    /// Empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from headers ordered oldest to newest.
    pub fn from_ordered(headers: Vec<BlockHeader>) -> Result<Self, LightClientError> {
        let mut chain = Self::new();
        chain.splice(headers)?;
        Ok(chain)
    }

    /// Current tip, if any.
    pub fn tip(&self) -> Option<ChainTip> {
        self.headers.last().map(|h| ChainTip {
            hash: h.hash,
            height: h.height,
        })
    }

    /// Tip header, if any.
    pub fn tip_header(&self) -> Option<&BlockHeader> {
        self.headers.last()
    }

    /// Headers oldest to newest.
    pub fn headers(&self) -> &[BlockHeader] {
        &self.headers
    }

    /// Number of headers held.
    pub fn len(&self) -> usize {
        self.headers.len()
    }

    /// `true` if no header is held.
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// `true` if a header with this hash is held.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.index.contains(hash)
    }

    /// `true` if `header` can be appended at the tip.
    pub fn extends_tip(&self, header: &BlockHeader) -> bool {
        match self.headers.last() {
            Some(tip) => header.prev_hash == tip.hash,
            None => header.is_genesis_link(),
        }
    }

    /// Append one header at the tip.
    ///
    /// # Errors
    /// - `InvalidHeaderChain` if the hash is already held
    /// - `InvalidHeaderChain` if `prev_hash` does not match the tip
    pub fn append(&mut self, header: BlockHeader) -> Result<(), LightClientError> {
        if self.contains(&header.hash) {
            return Err(duplicate(&header));
        }
        if !self.extends_tip(&header) {
            return Err(unlinked(&header));
        }
        self.index.insert(header.hash);
        self.headers.push(header);
        Ok(())
    }

    /// Append an ordered, contiguous segment. Nothing is applied on error.
    ///
    /// The whole segment is checked against the tip before the chain changes.
    pub fn splice(&mut self, segment: Vec<BlockHeader>) -> Result<(), LightClientError> {
        let mut fresh = HashSet::with_capacity(segment.len());
        let mut prev = self.headers.last().map(|tip| tip.hash);
        for header in &segment {
            if self.contains(&header.hash) || !fresh.insert(header.hash) {
                return Err(duplicate(header));
            }
            let links = match prev {
                Some(hash) => header.prev_hash == hash,
                None => header.is_genesis_link(),
            };
            if !links {
                return Err(unlinked(header));
            }
            prev = Some(header.hash);
        }
        self.index.extend(fresh);
        self.headers.extend(segment);
        Ok(())
    }

    /// Remove up to `count` headers from the tip; returns them oldest first.
    pub fn drop_suffix(&mut self, count: usize) -> Vec<BlockHeader> {
        let keep = self.headers.len().saturating_sub(count);
        self.split_off(keep)
    }

    /// Keep headers up to and including `hash`; returns the removed suffix.
    /// Returns an empty vector if `hash` is not held.
    pub fn truncate_after(&mut self, hash: &Hash) -> Vec<BlockHeader> {
        match self.headers.iter().position(|h| &h.hash == hash) {
            Some(pos) => self.split_off(pos + 1),
            None => Vec::new(),
        }
    }

    fn split_off(&mut self, at: usize) -> Vec<BlockHeader> {
        let removed = self.headers.split_off(at);
        for header in &removed {
            self.index.remove(&header.hash);
        }
        removed
    }
}

fn duplicate(header: &BlockHeader) -> LightClientError {
    LightClientError::InvalidHeaderChain(format!("duplicate header {}", short_hex(&header.hash)))
}

fn unlinked(header: &BlockHeader) -> LightClientError {
    LightClientError::InvalidHeaderChain(format!(
        "header {} at height {} does not extend tip",
        short_hex(&header.hash),
        header.height
    ))
}

/// A transfer as shown in an account's recent-transfer window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FundsTxView {
    /// Header byte
    pub header: u8,
    /// Transaction hash
    pub hash: Hash,
    /// Amount
    pub amount: u64,
    /// Fee
    pub fee: u64,
    /// Sender transaction counter
    pub tx_cnt: u32,
    /// Sender account hash
    pub from: Hash,
    /// Recipient account hash
    pub to: Hash,
    /// Sender signature
    pub sig1: Signature,
    /// Co-signature
    pub sig2: Signature,
    /// Verification status
    pub status: TxStatus,
}

impl FundsTxView {
    /// View of `tx` with the given status.
    pub fn new(tx: &FundsTx, status: TxStatus) -> Self {
        Self {
            header: tx.header,
            hash: tx.hash(),
            amount: tx.amount,
            fee: tx.fee,
            tx_cnt: tx.tx_cnt,
            from: tx.from,
            to: tx.to,
            sig1: tx.sig1,
            sig2: tx.sig2,
            status,
        }
    }
}

/// Fixed-size window of the most recent incoming transfers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TxRing {
    entries: VecDeque<FundsTxView>,
}

impl TxRing {
    /// Empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a transfer, evicting the oldest when full.
    pub fn push(&mut self, view: FundsTxView) {
        if self.entries.len() == TX_RING_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back(view);
    }

    /// Entries oldest first, most recent last.
    pub fn to_vec(&self) -> Vec<FundsTxView> {
        self.entries.iter().cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locally reconstructed view of one account. Rebuilt on every query.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccountProjection {
    /// Public-key address
    pub address: Address,
    /// SHA3 hash of the address
    pub address_hash: Hash,
    /// Reconstructed balance
    pub balance: u64,
    /// Transaction counter
    pub tx_cnt: u32,
    /// Known to the network
    pub is_created: bool,
    /// Network root account (never debited)
    pub is_root: bool,
    /// Validator account
    pub is_staking: bool,
    /// Most recent incoming transfers
    pub recent: TxRing,
}

impl AccountProjection {
    /// Fresh projection with zero balance.
    pub fn new(address: Address, address_hash: Hash) -> Self {
        Self {
            address,
            address_hash,
            balance: 0,
            tx_cnt: 0,
            is_created: false,
            is_root: false,
            is_staking: false,
            recent: TxRing::new(),
        }
    }
}
