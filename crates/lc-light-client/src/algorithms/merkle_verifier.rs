//! # Merkle Proof Verification
//!
//! Inclusion proofs over a block's transaction hashes.
//!
//! The tree duplicates the last node of every odd-sized level, so a single
//! leaf has root `H(leaf ‖ leaf)`. A proof travels as a flat list
//! `[sibling_0, parent_0, sibling_1, parent_1, ...]` whose last parent is the
//! root. Sibling order is not carried, so each level accepts either
//! `H(current ‖ sibling)` or `H(sibling ‖ current)`.

use lc_types::{short_hex, Hash, ZERO_HASH};
use sha3::{Digest, Sha3_256};

use crate::domain::LightClientError;

/// Hash two nodes together.
pub fn hash_concat(left: &Hash, right: &Hash) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

fn next_level(level: &[Hash]) -> Vec<Hash> {
    level
        .chunks(2)
        .map(|pair| {
            let left = &pair[0];
            let right = pair.get(1).unwrap_or(left);
            hash_concat(left, right)
        })
        .collect()
}

/// Root over `leaves`. An empty block has the zero root.
pub fn compute_merkle_root(leaves: &[Hash]) -> Hash {
    if leaves.is_empty() {
        return ZERO_HASH;
    }

    let mut level = next_level(leaves);
    while level.len() > 1 {
        level = next_level(&level);
    }
    level[0]
}

/// Proof for the leaf at `index`, in the flat sibling/parent form.
///
/// Returns `None` if `index` is out of range.
pub fn build_merkle_path(leaves: &[Hash], index: usize) -> Option<Vec<Hash>> {
    if index >= leaves.len() {
        return None;
    }

    let mut path = Vec::new();
    let mut level = leaves.to_vec();
    let mut idx = index;

    loop {
        let sibling_idx = if idx % 2 == 0 { idx + 1 } else { idx - 1 };
        let sibling = level.get(sibling_idx).copied().unwrap_or(level[idx]);
        let parents = next_level(&level);

        path.push(sibling);
        path.push(parents[idx / 2]);

        if parents.len() == 1 {
            break;
        }
        level = parents;
        idx /= 2;
    }

    Some(path)
}

/// Recompute a flat proof from `leaf` and check it closes at `root`.
///
/// # Algorithm
///
/// For each `(sibling, parent)` pair, accept if `H(current ‖ sibling)` or
/// `H(sibling ‖ current)` equals `parent`, then continue from `parent`. An
/// odd-length path is malformed. An empty path only proves `leaf == root`.
pub fn verify_merkle_path(leaf: &Hash, path: &[Hash], root: &Hash) -> bool {
    if path.len() % 2 != 0 {
        return false;
    }
    if path.is_empty() {
        return leaf == root;
    }

    let mut current = *leaf;
    for pair in path.chunks_exact(2) {
        let (sibling, parent) = (&pair[0], &pair[1]);
        if hash_concat(&current, sibling) != *parent && hash_concat(sibling, &current) != *parent {
            return false;
        }
        current = *parent;
    }

    current == *root
}

/// Full inclusion check for one transaction.
///
/// `claimed_hash` is the hash listed in the block; `self_hash` is the hash
/// recomputed from the fetched transaction body.
///
/// # Errors
/// - `ValidationFailed` if the hashes differ or the path does not close
pub fn validate_inclusion(
    merkle_root: &Hash,
    claimed_hash: &Hash,
    self_hash: &Hash,
    path: &[Hash],
) -> Result<(), LightClientError> {
    if claimed_hash != self_hash {
        return Err(LightClientError::ValidationFailed(*claimed_hash));
    }
    if !verify_merkle_path(claimed_hash, path, merkle_root) {
        tracing::debug!(
            "[lc-merkle] path of {} nodes does not reduce to root {} for tx {}",
            path.len(),
            short_hex(merkle_root),
            short_hex(claimed_hash)
        );
        return Err(LightClientError::ValidationFailed(*claimed_hash));
    }
    Ok(())
}
