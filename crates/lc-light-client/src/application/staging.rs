//! # Pending-Transaction Stage
//!
//! Unsigned transactions wait here, keyed by canonical hash, until a
//! signature arrives. One mutex guards every per-kind map.
//!
//! ## Finalize
//!
//! | Kind                 | Empty `sig1`                  | `sig1` set                   |
//! |----------------------|-------------------------------|------------------------------|
//! | Funds, IoT           | set `sig1`, send to co-signer | set `sig2`, send to bootstrap |
//! | Acc, Config, Stake   | set `sig`, send to bootstrap  | n/a                          |
//!
//! The entry leaves the stage before the send. Only a successful first
//! signature of a co-signed kind puts it back, waiting for the second.

use std::collections::HashMap;

use lc_types::{
    short_hex, AccTx, ConfigTx, FundsTx, Hash, IotTx, Signature, StakeTx, Transaction,
    EMPTY_SIGNATURE,
};
use parking_lot::Mutex;
use tracing::{info, warn};

use crate::domain::{BroadcastTarget, FinalizeOutcome, LightClientError};
use crate::ports::FullNodeConnection;

#[derive(Default)]
struct StagedMaps {
    acc: HashMap<Hash, AccTx>,
    config: HashMap<Hash, ConfigTx>,
    funds: HashMap<Hash, FundsTx>,
    stake: HashMap<Hash, StakeTx>,
    iot: HashMap<Hash, IotTx>,
}

impl StagedMaps {
    fn insert(&mut self, hash: Hash, tx: Transaction) {
        match tx {
            Transaction::Acc(tx) => {
                self.acc.insert(hash, tx);
            }
            Transaction::Config(tx) => {
                self.config.insert(hash, tx);
            }
            Transaction::Funds(tx) => {
                self.funds.insert(hash, tx);
            }
            Transaction::Stake(tx) => {
                self.stake.insert(hash, tx);
            }
            Transaction::Iot(tx) => {
                self.iot.insert(hash, tx);
            }
        }
    }

    fn remove(&mut self, hash: &Hash) -> Option<Transaction> {
        self.acc
            .remove(hash)
            .map(Transaction::Acc)
            .or_else(|| self.config.remove(hash).map(Transaction::Config))
            .or_else(|| self.funds.remove(hash).map(Transaction::Funds))
            .or_else(|| self.stake.remove(hash).map(Transaction::Stake))
            .or_else(|| self.iot.remove(hash).map(Transaction::Iot))
    }

    fn contains(&self, hash: &Hash) -> bool {
        self.acc.contains_key(hash)
            || self.config.contains_key(hash)
            || self.funds.contains_key(hash)
            || self.stake.contains_key(hash)
            || self.iot.contains_key(hash)
    }

    fn len(&self) -> usize {
        self.acc.len() + self.config.len() + self.funds.len() + self.stake.len() + self.iot.len()
    }
}

/// Attach `signature` to the next empty slot; returns where the result goes.
fn attach_signature(tx: &mut Transaction, signature: Signature) -> BroadcastTarget {
    match tx {
        Transaction::Funds(FundsTx { sig1, sig2, .. })
        | Transaction::Iot(IotTx { sig1, sig2, .. }) => {
            if *sig1 == EMPTY_SIGNATURE {
                *sig1 = signature;
                BroadcastTarget::CoSigner
            } else {
                *sig2 = signature;
                BroadcastTarget::Bootstrap
            }
        }
        Transaction::Acc(AccTx { sig, .. })
        | Transaction::Config(ConfigTx { sig, .. })
        | Transaction::Stake(StakeTx { sig, .. }) => {
            *sig = signature;
            BroadcastTarget::Bootstrap
        }
    }
}

/// Staged transactions awaiting signatures.
#[derive(Default)]
pub struct PendingTxStage {
    maps: Mutex<StagedMaps>,
}

impl PendingTxStage {
    /// Empty stage.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `tx` under its canonical hash, replacing any entry there.
    pub fn stage(&self, tx: Transaction) -> Hash {
        let hash = tx.hash();
        self.maps.lock().insert(hash, tx);
        hash
    }

    /// `true` if `hash` is staged.
    pub fn contains(&self, hash: &Hash) -> bool {
        self.maps.lock().contains(hash)
    }

    /// Number of staged transactions.
    pub fn len(&self) -> usize {
        self.maps.lock().len()
    }

    /// `true` if nothing is staged.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sign the staged transaction and send it on.
    ///
    /// # Errors
    /// - `StaleOrMissingPendingTx` if `hash` is not staged
    /// - The broadcast error; the entry is gone either way
    pub async fn finalize<N: FullNodeConnection + ?Sized>(
        &self,
        node: &N,
        hash: Hash,
        signature: Signature,
    ) -> Result<FinalizeOutcome, LightClientError> {
        let mut tx = self
            .maps
            .lock()
            .remove(&hash)
            .ok_or(LightClientError::StaleOrMissingPendingTx(hash))?;

        let target = attach_signature(&mut tx, signature);
        if let Err(e) = node.broadcast_tx(target, &tx).await {
            warn!(
                "[lc-stage] Broadcast of {:?} tx {} to {:?} failed: {}",
                tx.kind(),
                short_hex(&hash),
                target,
                e
            );
            return Err(e);
        }

        match target {
            BroadcastTarget::CoSigner => {
                info!("[lc-stage] Tx {} sent for co-signing", short_hex(&hash));
                self.maps.lock().insert(hash, tx);
                Ok(FinalizeOutcome::AwaitingCosign)
            }
            BroadcastTarget::Bootstrap => {
                info!("[lc-stage] Tx {} broadcast", short_hex(&hash));
                Ok(FinalizeOutcome::Broadcast)
            }
        }
    }
}
