//! Criterion benchmarks for bucket and ring operations.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use genring::{Bucket, Entry, GenerationRing};

fn bench_bucket_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("bucket_insert");
    for size in [1_000u64, 10_000, 100_000] {
        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let bucket: Bucket<u64, u64> = Bucket::new("bench/0");
                for i in 0..size {
                    bucket.insert(black_box(i), Entry::Present(black_box(i * 2)));
                }
                bucket
            });
        });
    }
    group.finish();
}

fn bench_bucket_lookup(c: &mut Criterion) {
    let bucket: Bucket<u64, u64> = Bucket::new("bench/0");
    bucket.insert_many((0..100_000u64).map(|i| (i, Entry::Present(i))));

    let mut group = c.benchmark_group("bucket_lookup");
    group.throughput(Throughput::Elements(1));
    group.bench_function("hit", |b| {
        let mut i = 0u64;
        b.iter(|| {
            i = (i + 1) % 100_000;
            black_box(bucket.lookup(&i))
        });
    });
    group.bench_function("miss", |b| {
        b.iter(|| black_box(bucket.lookup(&u64::MAX)));
    });
    group.finish();
}

fn bench_partition(c: &mut Criterion) {
    let bucket: Bucket<u64, u64> = Bucket::new("bench/0");
    bucket.insert_many((0..100_000u64).filter(|i| i % 2 == 0).map(|i| (i, Entry::Present(i))));

    let mut group = c.benchmark_group("bucket_partition");
    for batch in [16u64, 256, 4_096] {
        group.throughput(Throughput::Elements(batch));
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            let keys: Vec<u64> = (0..batch).collect();
            b.iter(|| {
                let mut found = Vec::new();
                let missing = bucket.partition(black_box(keys.clone()), &mut found);
                black_box((found, missing))
            });
        });
    }
    group.finish();
}

fn bench_rotation(c: &mut Criterion) {
    let mut group = c.benchmark_group("ring_rotate");
    for populated in [0usize, 10_000] {
        group.bench_with_input(
            BenchmarkId::from_parameter(populated),
            &populated,
            |b, &populated| {
                let ring: GenerationRing<u64, u64> = GenerationRing::new("bench", 3).unwrap();
                b.iter(|| {
                    ring.newest()
                        .insert_many((0..populated as u64).map(|i| (i, Entry::Present(i))));
                    black_box(ring.rotate())
                });
            },
        );
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_bucket_insert,
    bench_bucket_lookup,
    bench_partition,
    bench_rotation
);
criterion_main!(benches);
