//! Benchmarks for Memoizer.
//!
//! Run with: `cargo bench --bench memoizer`

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use criterion::{BatchSize, Criterion, Throughput, criterion_group, criterion_main};
use memokit::builder::MemoizerBuilder;
use rand::Rng;

// ============================================================================
// Hit path (fast path, shard read lock only)
// ============================================================================

fn bench_memo_get_hit_ns(c: &mut Criterion) {
    c.bench_function("memo_get_hit_ns", |b| {
        b.iter_custom(|iters| {
            let keys = 16_384u64;
            let memo = MemoizerBuilder::new()
                .soft_capacity(keys as usize)
                .build(|k: &u64| k.wrapping_mul(31));
            for k in 0..keys {
                memo.get(&k);
            }
            let start = Instant::now();
            for i in 0..iters {
                let _ = std::hint::black_box(memo.get(&(i % keys)));
            }
            start.elapsed()
        })
    });
}

// ============================================================================
// Miss path (claim, compute, publish)
// ============================================================================

fn bench_memo_miss_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("memoizer");
    group.throughput(Throughput::Elements(4096));

    for soft_capacity in [0usize, 1024] {
        group.bench_function(format!("miss_churn_soft_{soft_capacity}"), |b| {
            b.iter_batched(
                || {
                    MemoizerBuilder::new()
                        .soft_capacity(soft_capacity)
                        .build(|k: &u64| k.wrapping_mul(31))
                },
                |memo| {
                    for k in 0..4096u64 {
                        let _ = std::hint::black_box(memo.get(&std::hint::black_box(k)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

// ============================================================================
// Contended hits across threads
// ============================================================================

fn bench_memo_contended_hits(c: &mut Criterion) {
    let mut group = c.benchmark_group("memoizer");
    let threads = 4usize;
    let per_thread = 10_000u64;
    group.throughput(Throughput::Elements(threads as u64 * per_thread));

    for shards in [1usize, 16] {
        group.bench_function(format!("contended_hits_shards_{shards}"), |b| {
            let memo = Arc::new(
                MemoizerBuilder::new()
                    .shards(shards)
                    .soft_capacity(1024)
                    .build(|k: &u64| k.wrapping_mul(31)),
            );
            for k in 0..1024u64 {
                memo.get(&k);
            }
            b.iter(|| {
                let handles: Vec<_> = (0..threads)
                    .map(|_| {
                        let memo = Arc::clone(&memo);
                        thread::spawn(move || {
                            let mut rng = rand::rng();
                            for _ in 0..per_thread {
                                let key = rng.random_range(0..1024u64);
                                let _ = std::hint::black_box(memo.get(&key));
                            }
                        })
                    })
                    .collect();
                for handle in handles {
                    let _ = handle.join();
                }
            })
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_memo_get_hit_ns,
    bench_memo_miss_churn,
    bench_memo_contended_hits
);
criterion_main!(benches);
