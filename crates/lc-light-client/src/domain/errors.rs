//! # Domain Errors
//!
//! Error kinds raised by the light client core.
//!
//! Network-layer kinds (`ConnectionAborted`, `FetchTimedOut`,
//! `NoPeerAvailable`, `HandshakeFailed`) are recoverable: callers retry with
//! another peer or back off. `AccountNotFound` and input errors are surfaced
//! to the external caller as-is.

use lc_header_store::StoreError;
use lc_types::{short_hex, CodecError};
use thiserror::Error;

pub use lc_types::Hash;

/// Light client error types.
#[derive(Debug, Error)]
pub enum LightClientError {
    /// Short read, reset or other I/O failure on a session.
    #[error("Connection to {peer} aborted: {reason}")]
    ConnectionAborted {
        /// Remote address
        peer: String,
        /// Underlying error text
        reason: String,
    },

    /// Dial failed or the peer did not answer the ping with a pong.
    #[error("Failed to complete network handshake with {peer}: {reason}")]
    HandshakeFailed {
        /// Remote address
        peer: String,
        /// What went wrong
        reason: String,
    },

    /// No response of the expected kind arrived in time.
    #[error("Fetching {kind} timed out")]
    FetchTimedOut {
        /// Response kind that was awaited
        kind: &'static str,
    },

    /// The peer pool is empty.
    #[error("No peer available")]
    NoPeerAvailable,

    /// A Merkle path did not close for a transaction.
    #[error("Merkle validation failed for tx {}", short_hex(.0))]
    ValidationFailed(Hash),

    /// Account is neither known to the network nor touched by the chain.
    #[error("Account {} does not exist", short_hex(.0))]
    AccountNotFound(Hash),

    /// Finalize called for a hash that is not staged.
    #[error("No transaction with hash {} found to sign", short_hex(.0))]
    StaleOrMissingPendingTx(Hash),

    /// The remote node answered NOT_FOUND with this reason.
    #[error("Remote returned not found: {0}")]
    NotFound(String),

    /// Header chain linkage is broken.
    #[error("Invalid header chain: {0}")]
    InvalidHeaderChain(String),

    /// Transaction construction rejected the input.
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// The signing collaborator failed.
    #[error("Signing failed: {0}")]
    Signing(String),

    /// Payload encode/decode failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Header store failure.
    #[error("Header store error: {0}")]
    Store(#[from] StoreError),
}

impl LightClientError {
    /// `true` for network-layer errors that warrant a retry or backoff.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionAborted { .. }
                | Self::HandshakeFailed { .. }
                | Self::FetchTimedOut { .. }
                | Self::NoPeerAvailable
        )
    }
}
