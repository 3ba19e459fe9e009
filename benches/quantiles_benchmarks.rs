use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tdigest_oxide::common::Mergeable;
use tdigest_oxide::quantiles::{Scaler, TDigest};

/// Benchmark: T-Digest update operations
fn bench_tdigest_update(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_update");

    for compression in [50.0, 100.0, 200.0] {
        group.bench_with_input(
            BenchmarkId::new("update", compression as u64),
            &compression,
            |b, &c| {
                let mut td = TDigest::with_compression(c).unwrap();
                let mut counter = 0.0f64;
                b.iter(|| {
                    td.update(black_box(counter));
                    counter += 1.0;
                });
            },
        );
    }

    group.finish();
}

/// Benchmark: T-Digest quantile operations
fn bench_tdigest_quantile(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_quantile");

    for n in [1000, 10000, 100000] {
        let mut td = TDigest::with_compression(100.0).unwrap();
        for i in 0..n {
            td.update(i as f64);
        }

        group.bench_with_input(BenchmarkId::new("quantile", n), &(), |b, _| {
            b.iter(|| {
                black_box(td.quantile(0.5));
                black_box(td.quantile(0.99));
                black_box(td.quantile(0.999));
            });
        });
    }

    group.finish();
}

/// Benchmark: T-Digest across scale function variants
fn bench_tdigest_scaler_comparison(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_scaler_comparison");
    let n = 10_000;

    for scaler in [
        Scaler::K1,
        Scaler::K1Fast,
        Scaler::K2,
        Scaler::K3,
        Scaler::KQuadratic,
    ] {
        group.bench_function(format!("{:?}", scaler), |b| {
            b.iter(|| {
                let mut td = TDigest::with_scaler(100.0, scaler).unwrap();
                for i in 0..n {
                    td.update(i as f64);
                }
                black_box(td.quantile(0.99))
            });
        });
    }

    group.finish();
}

/// Benchmark: T-Digest merge cost across compression levels
fn bench_tdigest_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("tdigest_merge");

    for compression in [50.0, 100.0, 200.0] {
        let mut source = TDigest::with_compression(compression).unwrap();
        for i in 0..5000 {
            source.update(i as f64);
        }

        group.bench_with_input(
            BenchmarkId::new("merge", compression as u64),
            &source,
            |b, source| {
                b.iter(|| {
                    let mut target = TDigest::with_compression(compression).unwrap();
                    for i in 5000..10000 {
                        target.update(i as f64);
                    }
                    black_box(target.merge(source).unwrap());
                });
            },
        );
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_tdigest_update,
    bench_tdigest_quantile,
    bench_tdigest_scaler_comparison,
    bench_tdigest_merge,
);

criterion_main!(benches);
