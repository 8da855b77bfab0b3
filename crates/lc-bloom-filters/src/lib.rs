//! # LC Bloom Filters
//!
//! Per-block Bloom filters carried in block headers.
//!
//! A full node inserts the address hash of every account touched by a block
//! into that block's filter. The light client tests its watched address hash
//! against each header's filter to decide whether the block must be fetched.
//!
//! ## Invariants
//!
//! - No false negatives: after `insert(x)`, `contains(x)` is always true,
//!   including after an encode/decode round trip.
//! - False positives are possible and must be tolerated by callers.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod domain;
pub mod error;

pub use domain::{
    calculate_fpr, calculate_optimal_parameters, compute_hash_positions, BloomFilter,
    BloomFilterParams, DEFAULT_BLOCK_FPR, MAX_HASH_COUNT,
};
pub use error::FilterError;
