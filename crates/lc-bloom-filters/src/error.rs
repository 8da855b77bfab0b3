//! Error types for block Bloom filters

use thiserror::Error;

/// Errors raised while building or decoding a filter
#[derive(Debug, Error)]
pub enum FilterError {
    /// Filter parameters are unusable (zero bits or zero hash functions).
    #[error("Invalid filter parameters: m={m}, k={k}")]
    InvalidParameters {
        /// Size in bits
        m: usize,
        /// Hash function count
        k: usize,
    },

    /// False positive rate outside (0, 1).
    #[error("Invalid false positive rate: {fpr}")]
    InvalidFpr {
        /// Requested rate
        fpr: f64,
    },

    /// Encoded filter could not be decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}
