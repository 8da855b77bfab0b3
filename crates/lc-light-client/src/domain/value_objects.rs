//! # Value Objects
//!
//! Small immutable types passed between components.

use serde::{Deserialize, Serialize};

use super::errors::Hash;

/// Header-chain synchronizer state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncState {
    /// Nothing loaded yet.
    Uninitialized,
    /// Walking back from the network tip.
    Syncing,
    /// Following announced headers.
    UpToDate,
    /// Repairing a divergence; announced headers are not trusted.
    Reconciling,
}

/// Current chain tip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainTip {
    /// Tip block hash.
    pub hash: Hash,
    /// Tip block height.
    pub height: u32,
}

/// Whether a listed transfer is confirmed by a validated Merkle path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    /// Included in a block and validated.
    Verified,
    /// Known to the co-signing service only.
    NotVerified,
}

impl TxStatus {
    /// Display label.
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Verified => "verified",
            TxStatus::NotVerified => "not verified",
        }
    }
}

/// Where a transaction is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BroadcastTarget {
    /// The main bootstrap node.
    Bootstrap,
    /// The co-signing service.
    CoSigner,
}

/// Result of a successful finalize call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// First signature attached and sent to the co-signing service; the
    /// transaction stays staged for the second signature.
    AwaitingCosign,
    /// Fully signed and sent to the bootstrap node; the stage entry is gone.
    Broadcast,
}
