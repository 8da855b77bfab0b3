//! # Account-State Reconstructor
//!
//! Replays the relevant blocks of the synchronized chain for one account.
//!
//! ## Balance Rules
//!
//! - Beneficiary blocks credit the block reward in force before the block's
//!   own config transactions, plus every validated fee in the block
//! - Validated outgoing transfers debit amount and fee (root accounts are
//!   never debited) and bump the counter
//! - Validated incoming transfers credit the amount and enter the ring
//! - Root accounts start with the configured issuance
//!
//! Every replayed transaction is checked against the header's Merkle root
//! first. A transaction that fails the check is skipped.

use std::future::Future;
use std::sync::Arc;

use lc_types::{
    address_hash, short_hex, Address, Block, BlockHeader, FundsTx, Hash, Parameters, Transaction,
    TxKind,
};
use parking_lot::RwLock;
use tracing::{debug, info, warn};

use crate::algorithms::{select_relevant, validate_inclusion};
use crate::config::LightClientConfig;
use crate::domain::{AccountProjection, FundsTxView, HeaderChain, LightClientError, TxStatus};
use crate::ports::FullNodeConnection;

/// Outcome of one replay.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reconstruction {
    /// The rebuilt account.
    pub projection: AccountProjection,
    /// Parameters in force after the last relevant block.
    pub parameters: Parameters,
    /// Relevant blocks replayed.
    pub blocks_replayed: usize,
}

/// Running state of one replay.
struct Replay {
    projection: AccountProjection,
    parameters: Parameters,
    touched: bool,
}

impl Replay {
    fn credit(&mut self, amount: u64) {
        self.projection.balance = self.projection.balance.saturating_add(amount);
    }

    fn debit(&mut self, amount: u64) {
        if !self.projection.is_root {
            self.projection.balance = self.projection.balance.saturating_sub(amount);
        }
    }
}

/// Rebuilds account projections from the header chain.
pub struct AccountReconstructor<N: FullNodeConnection> {
    config: LightClientConfig,
    node: Arc<N>,
    chain: Arc<RwLock<HeaderChain>>,
}

impl<N: FullNodeConnection> AccountReconstructor<N> {
    /// Create a reconstructor over a shared chain.
    pub fn new(config: LightClientConfig, node: Arc<N>, chain: Arc<RwLock<HeaderChain>>) -> Self {
        Self {
            config,
            node,
            chain,
        }
    }

    /// Rebuild the projection for `address` from scratch.
    ///
    /// # Errors
    /// - `AccountNotFound` if the network does not know the account, it is
    ///   not root, and no relevant block touches it
    /// - Network errors once account, block or transaction retries are
    ///   exhausted
    pub async fn reconstruct(&self, address: &Address) -> Result<Reconstruction, LightClientError> {
        let hash = address_hash(address);
        let mut replay = Replay {
            projection: AccountProjection::new(*address, hash),
            parameters: Parameters::default(),
            touched: false,
        };

        if let Some(account) = self.lookup_account(hash, false).await? {
            replay.projection.is_created = true;
            replay.projection.is_staking = account.is_staking;
        }
        if self.lookup_account(hash, true).await?.is_some() {
            replay.projection.is_root = true;
            replay.projection.is_created = true;
            replay.credit(self.config.root_initial_balance);
        }

        let relevant: Vec<BlockHeader> = {
            let chain = self.chain.read();
            select_relevant(chain.headers(), &hash)
                .into_iter()
                .cloned()
                .collect()
        };
        debug!(
            "[lc-sync] {} relevant blocks for account {}",
            relevant.len(),
            short_hex(&hash)
        );

        for header in &relevant {
            self.replay_block(header, &mut replay).await?;
        }

        self.fold_non_verified(&mut replay).await;

        if !replay.projection.is_created {
            if !replay.touched {
                return Err(LightClientError::AccountNotFound(hash));
            }
            replay.projection.is_created = true;
        }

        info!(
            "[lc-sync] Account {} reconstructed: balance {}, txCnt {}",
            short_hex(&hash),
            replay.projection.balance,
            replay.projection.tx_cnt
        );

        Ok(Reconstruction {
            projection: replay.projection,
            parameters: replay.parameters,
            blocks_replayed: relevant.len(),
        })
    }

    async fn lookup_account(
        &self,
        hash: Hash,
        root: bool,
    ) -> Result<Option<lc_types::Account>, LightClientError> {
        let what = if root { "root account" } else { "account" };
        self.with_retries(what, || self.node.fetch_account(hash, root))
            .await
    }

    /// Run `op` until it succeeds, a non-recoverable error occurs, or the
    /// retry budget is spent.
    async fn with_retries<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, LightClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LightClientError>>,
    {
        let attempts = self.config.block_fetch_retries.max(1);
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_recoverable() && attempt < attempts => {
                    warn!(
                        "[lc-sync] Fetching {} failed (attempt {}/{}): {}",
                        what, attempt, attempts, e
                    );
                    attempt += 1;
                    tokio::time::sleep(self.config.retry_backoff).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_block(&self, header: &BlockHeader) -> Result<Block, LightClientError> {
        self.with_retries("block", || self.node.fetch_block(header.hash))
            .await
    }

    async fn fetch_tx(&self, kind: TxKind, hash: Hash) -> Result<Transaction, LightClientError> {
        self.with_retries("transaction", || self.node.fetch_tx(kind, hash))
            .await
    }

    /// `true` if `tx` is listed under `listed` and its path closes on the
    /// header's Merkle root.
    async fn validate(&self, header: &BlockHeader, tx: &Transaction, listed: Hash) -> bool {
        let path = match self.node.fetch_merkle_path(header.hash, listed).await {
            Ok(path) => path,
            Err(e) => {
                warn!(
                    "[lc-merkle] No path for tx {} in block {}: {}",
                    short_hex(&listed),
                    short_hex(&header.hash),
                    e
                );
                return false;
            }
        };
        match validate_inclusion(&header.merkle_root, &listed, &tx.hash(), &path) {
            Ok(()) => true,
            Err(e) => {
                warn!("[lc-merkle] {} in block {}", e, short_hex(&header.hash));
                false
            }
        }
    }

    async fn replay_block(
        &self,
        header: &BlockHeader,
        replay: &mut Replay,
    ) -> Result<(), LightClientError> {
        let account = replay.projection.address_hash;
        let is_beneficiary = header.beneficiary == account;

        if is_beneficiary {
            replay.credit(replay.parameters.block_reward);
            replay.touched = true;
        }

        let block = self.fetch_block(header).await?;

        if is_beneficiary {
            for &listed in &block.acc_tx_data {
                let tx = self.fetch_tx(TxKind::Acc, listed).await?;
                if self.validate(header, &tx, listed).await {
                    replay.credit(tx.fee());
                }
            }
        }

        for &listed in &block.funds_tx_data {
            let tx = self.fetch_tx(TxKind::Funds, listed).await?;
            let Transaction::Funds(funds) = &tx else {
                continue;
            };
            let involved = funds.from == account || funds.to == account;
            if !(involved || is_beneficiary) {
                continue;
            }
            if !self.validate(header, &tx, listed).await {
                continue;
            }
            apply_funds(funds, is_beneficiary, replay);
        }

        for &listed in &block.config_tx_data {
            let tx = self.fetch_tx(TxKind::Config, listed).await?;
            let Transaction::Config(config) = &tx else {
                continue;
            };
            if !self.validate(header, &tx, listed).await {
                continue;
            }
            if replay.parameters.apply(config) {
                debug!(
                    "[lc-sync] Parameter {} set to {} at height {}",
                    config.id, config.payload, header.height
                );
            }
            if is_beneficiary {
                replay.credit(config.fee);
            }
        }

        if is_beneficiary {
            for &listed in &block.stake_tx_data {
                let tx = self.fetch_tx(TxKind::Stake, listed).await?;
                if self.validate(header, &tx, listed).await {
                    replay.credit(tx.fee());
                }
            }
        }

        Ok(())
    }

    async fn fold_non_verified(&self, replay: &mut Replay) {
        let account = replay.projection.address_hash;
        let pending = match self.node.fetch_non_verified_txs(account).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(
                    "[lc-sync] Non-verified transfers for {} unavailable: {}",
                    short_hex(&account),
                    e
                );
                return;
            }
        };

        for tx in &pending {
            if tx.to == account {
                replay
                    .projection
                    .recent
                    .push(FundsTxView::new(tx, TxStatus::NotVerified));
            }
            if tx.from == account {
                replay.projection.tx_cnt = replay.projection.tx_cnt.saturating_add(1);
            }
        }
    }
}

fn apply_funds(tx: &FundsTx, is_beneficiary: bool, replay: &mut Replay) {
    let account = replay.projection.address_hash;
    if tx.from == account {
        replay.debit(tx.amount.saturating_add(tx.fee));
        replay.projection.tx_cnt = replay.projection.tx_cnt.saturating_add(1);
        replay.touched = true;
    }
    if tx.to == account {
        replay.credit(tx.amount);
        replay
            .projection
            .recent
            .push(FundsTxView::new(tx, TxStatus::Verified));
        replay.touched = true;
    }
    if is_beneficiary {
        replay.credit(tx.fee);
    }
}
