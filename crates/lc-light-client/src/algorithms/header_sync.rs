//! # Header Sync
//!
//! Batch validation and the iterative backward walk used by the
//! synchronizer. The walk holds headers newest-first and never recurses; a
//! depth guard bounds how far it can go on a long unsynced gap.

use std::collections::HashSet;

use lc_types::{short_hex, BlockHeader, Hash};

use crate::domain::{invariant_chain_contiguous, invariant_unique_hashes, LightClientError};

/// Validate a batch of headers ordered oldest to newest.
///
/// # Checks
/// 1. Parent hash continuity
/// 2. No duplicate hashes
pub fn validate_header_batch(headers: &[BlockHeader]) -> Result<(), LightClientError> {
    invariant_chain_contiguous(headers)?;
    invariant_unique_hashes(headers)
}

/// What the walk needs next.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkStep {
    /// Fetch the header with this hash and push it.
    Fetch(Hash),
    /// The oldest header's parent is already known locally.
    Reconnected(Hash),
    /// The oldest header links to genesis.
    ReachedGenesis,
}

/// Backward walk from a starting header towards a known ancestor.
#[derive(Debug)]
pub struct AncestorWalk {
    segment: Vec<BlockHeader>,
    seen: HashSet<Hash>,
    max_depth: usize,
}

impl AncestorWalk {
    /// Start from `start`; at most `max_depth` headers are collected.
    pub fn new(start: BlockHeader, max_depth: usize) -> Self {
        let mut seen = HashSet::new();
        seen.insert(start.hash);
        Self {
            segment: vec![start],
            seen,
            max_depth: max_depth.max(1),
        }
    }

    /// Oldest header collected so far.
    pub fn oldest(&self) -> &BlockHeader {
        // Constructed non-empty and never popped.
        &self.segment[self.segment.len() - 1]
    }

    /// Decide the next step given which hashes are already held.
    pub fn next_step(&self, is_known: impl Fn(&Hash) -> bool) -> WalkStep {
        let oldest = self.oldest();
        if oldest.is_genesis_link() {
            WalkStep::ReachedGenesis
        } else if is_known(&oldest.prev_hash) {
            WalkStep::Reconnected(oldest.prev_hash)
        } else {
            WalkStep::Fetch(oldest.prev_hash)
        }
    }

    /// Add the fetched parent of the current oldest header.
    ///
    /// # Errors
    /// - `InvalidHeaderChain` if the header is not the requested parent,
    ///   repeats a hash already walked, or the depth guard is hit
    pub fn push_ancestor(&mut self, header: BlockHeader) -> Result<(), LightClientError> {
        let expected = self.oldest().prev_hash;
        if header.hash != expected {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "expected ancestor {}, got {}",
                short_hex(&expected),
                short_hex(&header.hash)
            )));
        }
        if self.segment.len() >= self.max_depth {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "ancestor walk exceeded {} headers",
                self.max_depth
            )));
        }
        if !self.seen.insert(header.hash) {
            return Err(LightClientError::InvalidHeaderChain(format!(
                "cycle at {}",
                short_hex(&header.hash)
            )));
        }
        self.segment.push(header);
        Ok(())
    }

    /// Headers collected so far.
    pub fn depth(&self) -> usize {
        self.segment.len()
    }

    /// Collected headers oldest to newest.
    pub fn into_ordered(mut self) -> Vec<BlockHeader> {
        self.segment.reverse();
        self.segment
    }
}
