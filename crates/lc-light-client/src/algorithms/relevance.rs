//! Block relevance for one account.
//!
//! A header is relevant if the account is its beneficiary, if it carries
//! config transactions, or if its Bloom filter may contain the account
//! hash. False positives cost an extra block fetch; false negatives cannot
//! happen.

use lc_types::{BlockHeader, Hash};

/// `true` if the block behind `header` must be replayed for `account`.
pub fn is_relevant(header: &BlockHeader, account: &Hash) -> bool {
    header.beneficiary == *account || header.nr_config_tx > 0 || header.bloom_may_contain(account)
}

/// Relevant headers in chain order.
pub fn select_relevant<'a>(headers: &'a [BlockHeader], account: &Hash) -> Vec<&'a BlockHeader> {
    headers.iter().filter(|h| is_relevant(h, account)).collect()
}
