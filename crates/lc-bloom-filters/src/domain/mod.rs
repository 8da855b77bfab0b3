//! Filter domain: the bit array, its hash positions and sizing math.

pub mod bloom_filter;
pub mod hash_functions;
pub mod parameters;

pub use bloom_filter::{BloomFilter, DEFAULT_BLOCK_FPR};
pub use hash_functions::compute_hash_positions;
pub use parameters::{
    calculate_fpr, calculate_optimal_parameters, BloomFilterParams, MAX_HASH_COUNT,
};
