//! # Domain Invariants
//!
//! Rules the header chain must satisfy at all times.

use std::collections::HashSet;

use lc_types::{short_hex, BlockHeader};

use super::errors::LightClientError;

/// Invariant: adjacent headers are hash-linked.
///
/// For every pair `(h[i], h[i+1])`, `h[i+1].prev_hash == h[i].hash`.
pub fn invariant_chain_contiguous(headers: &[BlockHeader]) -> Result<(), LightClientError> {
    for pair in headers.windows(2) {
        if pair[1].prev_hash != pair[0].hash {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "header {} at height {} does not link to {}",
                short_hex(&pair[1].hash),
                pair[1].height,
                short_hex(&pair[0].hash)
            )));
        }
    }
    Ok(())
}

/// Invariant: no hash appears twice.
pub fn invariant_unique_hashes(headers: &[BlockHeader]) -> Result<(), LightClientError> {
    let mut seen = HashSet::with_capacity(headers.len());
    for header in headers {
        if !seen.insert(header.hash) {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "duplicate header {}",
                short_hex(&header.hash)
            )));
        }
    }
    Ok(())
}
