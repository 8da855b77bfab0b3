//! # Light Client Benchmarks
//!
//! Hot paths of account reconstruction and header sync:
//!
//! | Path | Work per call |
//! |------|---------------|
//! | Merkle path verification | one SHA3 pair per level, both orders |
//! | Block relevance | k murmur3 bit lookups in the header's filter |
//! | Header batch validation | one pass over the batch plus a hash set |
//! | Backward walk | one step per fetched header |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use lc_bloom_filters::BloomFilter;
use lc_light_client::algorithms::WalkStep;
use lc_light_client::{
    build_merkle_path, compute_merkle_root, is_relevant, validate_header_batch,
    verify_merkle_path, AncestorWalk,
};
use lc_types::{serialize_hash_content, BlockHeader, Hash, ZERO_HASH};

fn leaf(i: u32) -> Hash {
    serialize_hash_content(&i.to_be_bytes())
}

fn make_chain(len: u32) -> Vec<BlockHeader> {
    let mut prev = ZERO_HASH;
    (1..=len)
        .map(|height| {
            let hash = serialize_hash_content(&[&prev[..], &height.to_be_bytes()[..]].concat());
            let header = BlockHeader::new(hash, prev, height, ZERO_HASH);
            prev = hash;
            header
        })
        .collect()
}

// ============================================================================
// Merkle inclusion
// ============================================================================

fn bench_merkle_verification(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-merkle");
    group.measurement_time(Duration::from_secs(5));

    for size in [16u32, 256, 4096] {
        let leaves: Vec<Hash> = (0..size).map(leaf).collect();
        let root = compute_merkle_root(&leaves);
        let index = (size / 2) as usize;
        let path = build_merkle_path(&leaves, index).unwrap_or_default();
        let target = leaves[index];

        group.bench_with_input(BenchmarkId::new("verify_path", size), &size, |b, _| {
            b.iter(|| black_box(verify_merkle_path(&target, &path, &root)))
        });
    }

    let leaves: Vec<Hash> = (0..1024).map(leaf).collect();
    group.throughput(Throughput::Elements(leaves.len() as u64));
    group.bench_function("compute_root_1024", |b| {
        b.iter(|| black_box(compute_merkle_root(&leaves)))
    });

    group.finish();
}

// ============================================================================
// Block relevance
// ============================================================================

fn bench_relevance(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-relevance");

    let touched: Vec<Hash> = (0..200).map(leaf).collect();
    let mut header = BlockHeader::new([1; 32], ZERO_HASH, 1, ZERO_HASH);
    if let Ok(filter) = BloomFilter::for_block(touched.iter().map(|h| &h[..])) {
        header.bloom_filter = Some(filter);
        header.nr_elements_bf = touched.len() as u16;
    }

    let member = touched[17];
    let stranger = leaf(10_000);
    group.bench_function("member", |b| {
        b.iter(|| black_box(is_relevant(&header, &member)))
    });
    group.bench_function("non_member", |b| {
        b.iter(|| black_box(is_relevant(&header, &stranger)))
    });

    group.finish();
}

// ============================================================================
// Header sync
// ============================================================================

fn bench_header_sync(c: &mut Criterion) {
    let mut group = c.benchmark_group("lc-sync");

    for len in [100u32, 1_000, 10_000] {
        let chain = make_chain(len);
        group.throughput(Throughput::Elements(len as u64));
        group.bench_with_input(BenchmarkId::new("validate_batch", len), &chain, |b, chain| {
            b.iter(|| black_box(validate_header_batch(chain).is_ok()))
        });
    }

    let chain = make_chain(1_000);
    group.bench_function("walk_to_genesis_1000", |b| {
        b.iter(|| {
            let Some(tip) = chain.last() else { return 0 };
            let mut walk = AncestorWalk::new(tip.clone(), 10_000);
            let mut next = chain.len() - 1;
            while let WalkStep::Fetch(_) = walk.next_step(|_| false) {
                next -= 1;
                if walk.push_ancestor(chain[next].clone()).is_err() {
                    break;
                }
            }
            black_box(walk.depth())
        })
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_merkle_verification,
    bench_relevance,
    bench_header_sync
);
criterion_main!(benches);
