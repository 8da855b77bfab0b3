//! Filter sizing
//!
//! - m = -n*ln(fpr) / (ln(2)^2)
//! - k = (m/n) * ln(2)

use std::f64::consts::LN_2;

/// Upper bound on the hash function count of any filter, built or decoded.
pub const MAX_HASH_COUNT: usize = 32;

/// Size and hash count chosen for a filter
#[derive(Clone, Debug, PartialEq)]
pub struct BloomFilterParams {
    /// Number of bits in the filter
    pub size_bits: usize,
    /// Number of hash functions
    pub hash_count: usize,
    /// False positive rate expected at `num_elements`
    pub expected_fpr: f64,
}

/// Optimal `(m, k)` for `num_elements` entries at `target_fpr`.
pub fn calculate_optimal_parameters(num_elements: usize, target_fpr: f64) -> BloomFilterParams {
    if num_elements == 0 {
        return BloomFilterParams {
            size_bits: 8,
            hash_count: 1,
            expected_fpr: 0.0,
        };
    }

    let n = num_elements as f64;
    let m = ((-n * target_fpr.ln()) / (LN_2 * LN_2)).ceil().max(8.0) as usize;
    let k = ((m as f64 / n) * LN_2).round().clamp(1.0, MAX_HASH_COUNT as f64) as usize;

    BloomFilterParams {
        size_bits: m,
        hash_count: k,
        expected_fpr: calculate_fpr(m, num_elements, k),
    }
}

/// False positive rate `(1 - e^(-kn/m))^k`.
pub fn calculate_fpr(m: usize, n: usize, k: usize) -> f64 {
    if m == 0 {
        return 1.0;
    }
    let exponent = -(k as f64) * (n as f64) / (m as f64);
    (1.0 - exponent.exp()).powi(k as i32)
}
