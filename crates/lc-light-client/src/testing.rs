//! # Test Fixtures
//!
//! A [`ChainBuilder`] that mints well-formed blocks into a [`MockFullNode`]:
//! hashes chain through `prev_hash`, Merkle roots cover the listed
//! transactions and Bloom filters cover every touched account.

use std::sync::Arc;

use lc_bloom_filters::{BloomFilter, FilterError};
use lc_types::{
    address_hash, serialize_hash_content, Address, Block, BlockHeader, FundsTx, Hash, Transaction,
    EMPTY_SIGNATURE, ZERO_HASH,
};

use crate::algorithms::compute_merkle_root;
use crate::ports::MockFullNode;

/// Unsigned transfer.
pub fn funds_tx(from: Hash, to: Hash, amount: u64, fee: u64, tx_cnt: u32) -> FundsTx {
    FundsTx {
        header: 0,
        amount,
        fee,
        tx_cnt,
        from,
        to,
        sig1: EMPTY_SIGNATURE,
        sig2: EMPTY_SIGNATURE,
    }
}

/// Deterministic test address.
pub fn make_address(n: u8) -> Address {
    let mut address = [0u8; 64];
    address[0] = n;
    address[63] = 0xa5;
    address
}

/// Accounts a transaction touches, as a full node would add them to the
/// block's Bloom filter.
fn touched_accounts(tx: &Transaction) -> Vec<Hash> {
    match tx {
        Transaction::Acc(acc) => vec![acc.issuer, address_hash(&acc.pub_key)],
        Transaction::Config(_) => Vec::new(),
        Transaction::Funds(funds) => vec![funds.from, funds.to],
        Transaction::Stake(stake) => vec![stake.account],
        Transaction::Iot(_) => Vec::new(),
    }
}

/// Builds a chain block by block into a mock node.
#[derive(Clone)]
pub struct ChainBuilder {
    node: Arc<MockFullNode>,
    headers: Vec<BlockHeader>,
    branch: u8,
}

impl ChainBuilder {
    /// Start an empty chain on `node`.
    pub fn new(node: Arc<MockFullNode>) -> Self {
        Self {
            node,
            headers: Vec::new(),
            branch: 0,
        }
    }

    /// Headers built so far, oldest first.
    pub fn headers(&self) -> &[BlockHeader] {
        &self.headers
    }

    /// Last built header.
    pub fn tip(&self) -> Option<&BlockHeader> {
        self.headers.last()
    }

    /// A competing branch sharing the first `height` headers.
    ///
    /// Blocks built on the fork hash differently from this builder's.
    pub fn fork_at(&self, height: usize) -> Self {
        Self {
            node: Arc::clone(&self.node),
            headers: self.headers[..height.min(self.headers.len())].to_vec(),
            branch: self.branch.wrapping_add(1),
        }
    }

    /// Append `count` blocks with no transactions.
    pub fn push_empty(&mut self, count: usize, beneficiary: Hash) {
        for _ in 0..count {
            // No touched accounts means no filter to build.
            let _ = self.push_block(beneficiary, Vec::new());
        }
    }

    /// Append a block holding `txs`; the transactions are registered with
    /// the node and the node's tip moves to the new block. IoT transfers
    /// are dropped.
    pub fn push_block(
        &mut self,
        beneficiary: Hash,
        txs: Vec<Transaction>,
    ) -> Result<BlockHeader, FilterError> {
        let prev_hash = self.tip().map_or(ZERO_HASH, |h| h.hash);
        let height = self.headers.len() as u32 + 1;

        let mut header = BlockHeader::new(ZERO_HASH, prev_hash, height, beneficiary);
        let mut block = Block::new(header.clone());
        let mut touched: Vec<Hash> = Vec::new();

        for tx in &txs {
            let hash = tx.hash();
            match tx {
                Transaction::Acc(_) => block.acc_tx_data.push(hash),
                Transaction::Config(_) => block.config_tx_data.push(hash),
                Transaction::Funds(_) => block.funds_tx_data.push(hash),
                Transaction::Stake(_) => block.stake_tx_data.push(hash),
                // Block bodies do not list IoT transfers.
                Transaction::Iot(_) => continue,
            }
            for account in touched_accounts(tx) {
                if !touched.contains(&account) {
                    touched.push(account);
                }
            }
            self.node.insert_tx(tx.clone());
        }

        header.nr_acc_tx = block.acc_tx_data.len() as u16;
        header.nr_funds_tx = block.funds_tx_data.len() as u16;
        header.nr_config_tx = block.config_tx_data.len() as u8;
        header.nr_stake_tx = block.stake_tx_data.len() as u16;
        header.merkle_root = compute_merkle_root(&block.leaves());
        if !touched.is_empty() {
            header.bloom_filter = Some(BloomFilter::for_block(
                touched.iter().map(|h| h.as_slice()),
            )?);
            header.nr_elements_bf = touched.len() as u16;
        }

        let mut preimage = Vec::with_capacity(32 + 4 + 32 + 32 + 1);
        preimage.extend_from_slice(&prev_hash);
        preimage.extend_from_slice(&height.to_be_bytes());
        preimage.extend_from_slice(&header.merkle_root);
        preimage.extend_from_slice(&beneficiary);
        preimage.push(self.branch);
        header.hash = serialize_hash_content(&preimage);

        block.header = header.clone();
        self.node.insert_block(block);
        self.node.set_tip(header.hash);
        self.headers.push(header.clone());
        Ok(header)
    }
}
