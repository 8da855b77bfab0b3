//! Block Bloom filter
//!
//! INVARIANT: no false negatives. If an element was inserted, `contains()`
//! returns true, and keeps doing so after `to_bytes`/`from_bytes`.

use bitvec::prelude::*;
use serde::{Deserialize, Serialize};

use super::hash_functions::compute_hash_positions;
use super::parameters::{calculate_fpr, calculate_optimal_parameters, MAX_HASH_COUNT};
use crate::error::FilterError;

/// False positive rate full nodes target when building a block filter.
pub const DEFAULT_BLOCK_FPR: f64 = 0.01;

/// Probabilistic set of the account hashes touched by one block.
///
/// Decoding goes through [`RawBloomFilter`], so a filter received from a
/// peer always has `bits.len() == m` and `1 <= k <= MAX_HASH_COUNT`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBloomFilter")]
pub struct BloomFilter {
    /// Bit array storing the filter state
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
    /// Number of hash functions (k)
    k: usize,
    /// Size in bits (m)
    m: usize,
    /// Number of elements inserted (n)
    n: usize,
}

/// Wire shape of [`BloomFilter`] before its parameters are checked.
#[derive(Deserialize)]
struct RawBloomFilter {
    #[serde(with = "bitvec_serde")]
    bits: BitVec<u8, Lsb0>,
    k: usize,
    m: usize,
    n: usize,
}

impl TryFrom<RawBloomFilter> for BloomFilter {
    type Error = FilterError;

    fn try_from(raw: RawBloomFilter) -> Result<Self, Self::Error> {
        if raw.m == 0 || raw.k == 0 || raw.k > MAX_HASH_COUNT || raw.bits.len() != raw.m {
            return Err(FilterError::InvalidParameters { m: raw.m, k: raw.k });
        }
        Ok(Self {
            bits: raw.bits,
            k: raw.k,
            m: raw.m,
            n: raw.n,
        })
    }
}

mod bitvec_serde {
    use bitvec::prelude::*;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bits: &BitVec<u8, Lsb0>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (bits.as_raw_slice(), bits.len()).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<BitVec<u8, Lsb0>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let (bytes, len): (Vec<u8>, usize) = Deserialize::deserialize(deserializer)?;
        let mut bits = BitVec::<u8, Lsb0>::from_vec(bytes);
        bits.truncate(len);
        Ok(bits)
    }
}

impl BloomFilter {
    /// Create an empty filter with `m` bits and `k` hash functions.
    pub fn new(m: usize, k: usize) -> Result<Self, FilterError> {
        if m == 0 || k == 0 || k > MAX_HASH_COUNT {
            return Err(FilterError::InvalidParameters { m, k });
        }
        Ok(Self {
            bits: bitvec![u8, Lsb0; 0; m],
            k,
            m,
            n: 0,
        })
    }

    /// Create an empty filter sized for `expected_elements` at `target_fpr`.
    pub fn new_with_fpr(expected_elements: usize, target_fpr: f64) -> Result<Self, FilterError> {
        if !(target_fpr > 0.0 && target_fpr < 1.0) {
            return Err(FilterError::InvalidFpr { fpr: target_fpr });
        }
        let params = calculate_optimal_parameters(expected_elements, target_fpr);
        Self::new(params.size_bits, params.hash_count)
    }

    /// Build the filter a full node would attach to a block touching `elements`.
    pub fn for_block<'a, I>(elements: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = &'a [u8]>,
        I::IntoIter: ExactSizeIterator,
    {
        let elements = elements.into_iter();
        let mut filter = Self::new_with_fpr(elements.len(), DEFAULT_BLOCK_FPR)?;
        for element in elements {
            filter.insert(element);
        }
        Ok(filter)
    }

    /// Insert an element.
    pub fn insert(&mut self, element: &[u8]) {
        for pos in compute_hash_positions(element, self.k, self.m) {
            self.bits.set(pos, true);
        }
        self.n += 1;
    }

    /// `false` means definitely absent; `true` means possibly present.
    pub fn contains(&self, element: &[u8]) -> bool {
        compute_hash_positions(element, self.k, self.m)
            .iter()
            .all(|&pos| self.bits.get(pos).is_some_and(|bit| *bit))
    }

    /// Current false positive rate given the number of inserted elements.
    pub fn false_positive_rate(&self) -> f64 {
        calculate_fpr(self.m, self.n, self.k)
    }

    /// Number of bits set.
    pub fn bits_set(&self) -> usize {
        self.bits.count_ones()
    }

    /// Filter size in bits.
    pub fn size_bits(&self) -> usize {
        self.m
    }

    /// Number of hash functions.
    pub fn hash_count(&self) -> usize {
        self.k
    }

    /// Number of elements inserted.
    pub fn elements_inserted(&self) -> usize {
        self.n
    }

    /// Encode the filter with bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, FilterError> {
        bincode::serialize(self).map_err(|e| FilterError::Serialization(e.to_string()))
    }

    /// Decode a filter, rejecting encodings whose bit array disagrees with `m`.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, FilterError> {
        bincode::deserialize(bytes).map_err(|e| FilterError::Serialization(e.to_string()))
    }
}
