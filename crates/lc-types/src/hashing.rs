//! Canonical hashing

use sha3::{Digest, Sha3_256};

use crate::{Address, Hash};

/// The all-zero hash; a header whose `prev_hash` is zero is the genesis link.
pub const ZERO_HASH: Hash = [0u8; 32];

/// SHA3-256 over the canonical big-endian serialization of a value.
pub fn serialize_hash_content(content: &[u8]) -> Hash {
    let mut hasher = Sha3_256::new();
    hasher.update(content);
    hasher.finalize().into()
}

/// Hash identifying an account in headers and transactions.
pub fn address_hash(address: &Address) -> Hash {
    serialize_hash_content(address)
}

/// First eight bytes of a hash in hex, for log lines.
pub fn short_hex(hash: &Hash) -> String {
    hex::encode(&hash[..8])
}
