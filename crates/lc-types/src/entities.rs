//! # Chain Entities
//!
//! Block headers, full blocks and remote account records.

use lc_bloom_filters::BloomFilter;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, Bytes};

use crate::hashing::ZERO_HASH;
use crate::{Address, Hash};

/// Block metadata served to light clients.
///
/// The header carries the per-kind transaction counts and, when the block
/// touches any account, a Bloom filter over the touched account hashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Hash of this block.
    pub hash: Hash,
    /// Hash of the parent block; zero for the block after genesis.
    pub prev_hash: Hash,
    /// Block height.
    pub height: u32,
    /// Unix timestamp.
    pub timestamp: i64,
    /// Account hash credited with the block reward and fees.
    pub beneficiary: Hash,
    /// Merkle root over all transaction hashes in the block.
    pub merkle_root: Hash,
    /// Number of account-creation transactions.
    pub nr_acc_tx: u16,
    /// Number of funds transfers.
    pub nr_funds_tx: u16,
    /// Number of configuration transactions.
    pub nr_config_tx: u8,
    /// Number of stake transactions.
    pub nr_stake_tx: u16,
    /// Number of elements inserted into `bloom_filter`.
    pub nr_elements_bf: u16,
    /// Filter over touched account hashes.
    pub bloom_filter: Option<BloomFilter>,
}

impl BlockHeader {
    /// Header with the given linkage and no transactions.
    pub fn new(hash: Hash, prev_hash: Hash, height: u32, beneficiary: Hash) -> Self {
        Self {
            hash,
            prev_hash,
            height,
            timestamp: 0,
            beneficiary,
            merkle_root: ZERO_HASH,
            nr_acc_tx: 0,
            nr_funds_tx: 0,
            nr_config_tx: 0,
            nr_stake_tx: 0,
            nr_elements_bf: 0,
            bloom_filter: None,
        }
    }

    /// `true` if this header links to genesis (no further ancestor to fetch).
    pub fn is_genesis_link(&self) -> bool {
        self.prev_hash == ZERO_HASH
    }

    /// Bloom test for an account hash. Headers without elements never match.
    pub fn bloom_may_contain(&self, account: &Hash) -> bool {
        match &self.bloom_filter {
            Some(filter) if self.nr_elements_bf > 0 => filter.contains(account),
            _ => false,
        }
    }
}

/// Full block body: header plus ordered transaction hashes per kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block header.
    pub header: BlockHeader,
    /// Account-creation transaction hashes.
    pub acc_tx_data: Vec<Hash>,
    /// Funds transfer hashes.
    pub funds_tx_data: Vec<Hash>,
    /// Configuration transaction hashes.
    pub config_tx_data: Vec<Hash>,
    /// Stake transaction hashes.
    pub stake_tx_data: Vec<Hash>,
}

impl Block {
    /// Empty block for a header.
    pub fn new(header: BlockHeader) -> Self {
        Self {
            header,
            acc_tx_data: Vec::new(),
            funds_tx_data: Vec::new(),
            config_tx_data: Vec::new(),
            stake_tx_data: Vec::new(),
        }
    }

    /// Block hash.
    pub fn hash(&self) -> Hash {
        self.header.hash
    }

    /// All transaction hashes in Merkle leaf order.
    pub fn leaves(&self) -> Vec<Hash> {
        self.acc_tx_data
            .iter()
            .chain(&self.funds_tx_data)
            .chain(&self.config_tx_data)
            .chain(&self.stake_tx_data)
            .copied()
            .collect()
    }
}

/// Account record as held by a full node's state.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Public-key address.
    #[serde_as(as = "Bytes")]
    pub address: Address,
    /// Balance in the node's state.
    pub balance: u64,
    /// Transaction counter.
    pub tx_cnt: u32,
    /// Whether the account is a validator.
    pub is_staking: bool,
}
