//! # Algorithms Module
//!
//! Pure verification and chain-walking logic, free of I/O.

pub mod header_sync;
pub mod merkle_verifier;
pub mod relevance;

pub use header_sync::{validate_header_batch, AncestorWalk, WalkStep};
pub use merkle_verifier::{
    build_merkle_path, compute_merkle_root, hash_concat, validate_inclusion, verify_merkle_path,
};
pub use relevance::{is_relevant, select_relevant};
