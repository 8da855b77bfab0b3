//! Hash positions for block filters
//!
//! MurmurHash3 x64/128 with two seeds, combined by double hashing:
//! `pos(i) = (h1 + i * h2) mod m`.

use std::io::Cursor;

/// Lower 64 bits of MurmurHash3 x64/128 for `element` under `seed`.
pub fn murmur_hash(element: &[u8], seed: u32) -> u64 {
    let mut cursor = Cursor::new(element);
    // Reading from an in-memory cursor cannot fail.
    murmur3::murmur3_x64_128(&mut cursor, seed).unwrap_or(0) as u64
}

/// Compute the `k` bit positions for `element` in a filter of `m` bits.
pub fn compute_hash_positions(element: &[u8], k: usize, m: usize) -> Vec<usize> {
    if m == 0 {
        return Vec::new();
    }

    let h1 = murmur_hash(element, 0);
    let h2 = murmur_hash(element, 1);

    (0..k)
        .map(|i| {
            let hash = h1.wrapping_add((i as u64).wrapping_mul(h2));
            (hash % m as u64) as usize
        })
        .collect()
}
