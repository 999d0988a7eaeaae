//! # Scalable Bloom Benchmarks
//!
//! | Operation | Store calls |
//! |-----------|-------------|
//! | add | level count, item count, bit write, increment |
//! | add_many | 4 per chunk |
//! | contains | level count + 1 bit read per level |
//!
//! All benchmarks run against the in-memory store, so they measure the
//! filter's own overhead (hashing, key building, encoding).

use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use scalable_bloom::domain::compute_hash_positions;
use scalable_bloom::{FilterConfig, InMemoryFilterStore, ScalableFilter};
use tokio::runtime::Runtime;

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn random_items(count: usize) -> Vec<Vec<u8>> {
    let mut rng = rand::thread_rng();
    (0..count)
        .map(|_| (0..32).map(|_| rng.gen()).collect())
        .collect()
}

fn bench_hash_positions(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash-positions");
    let item = b"benchmark-item-0001";

    for k in [3u32, 7, 14] {
        group.bench_with_input(BenchmarkId::new("k", k), &k, |b, &k| {
            b.iter(|| black_box(compute_hash_positions(item, 9586, k)))
        });
    }
    group.finish();
}

fn bench_add(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("add");
    group.measurement_time(Duration::from_secs(5));

    let store = Arc::new(InMemoryFilterStore::new());
    let filter = rt
        .block_on(ScalableFilter::initialize(
            store,
            "bench-add",
            FilterConfig::default().with_base_capacity(100_000),
        ))
        .unwrap();
    let items = random_items(1024);

    group.throughput(Throughput::Elements(1));
    group.bench_function("single", |b| {
        let mut i = 0usize;
        b.to_async(&rt).iter(|| {
            i = (i + 1) % items.len();
            let item = &items[i];
            let filter = &filter;
            async move { black_box(filter.add(item).await.unwrap()) }
        })
    });

    for size in [10usize, 100, 1000] {
        let batch = random_items(size);
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("many", size), &batch, |b, batch| {
            b.to_async(&rt)
                .iter(|| async { black_box(filter.add_many(batch).await.unwrap()) })
        });
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("contains");
    group.measurement_time(Duration::from_secs(5));

    // Deeper filters answer more slowly: one bit read per level
    for levels in [1u32, 4, 8] {
        let store = Arc::new(InMemoryFilterStore::new());
        let config = FilterConfig::default().with_base_capacity(100);
        let filter = rt
            .block_on(ScalableFilter::initialize(store, "bench-contains", config))
            .unwrap();
        let total: u64 = (0..levels).map(|i| 100 * 2u64.pow(i)).sum();
        let items = random_items(total as usize);
        rt.block_on(filter.add_many(&items)).unwrap();

        let probe = items[0].clone();
        group.bench_with_input(BenchmarkId::new("levels", levels), &probe, |b, probe| {
            b.to_async(&rt)
                .iter(|| async { black_box(filter.contains(probe).await.unwrap()) })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hash_positions, bench_add, bench_contains);
criterion_main!(benches);
