//! Benchmarks for the dot product reduction strategies and the accelerator harness

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dotprec::constants::DOT_PRODUCT_KERNEL;
use dotprec::{
    create_strategy, default_accelerator, run_on_accelerator, reduce_tree, DotConfig, KernelId,
    LaunchGeometry, Strategy,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::hint::black_box;
use std::time::Duration;

const SIZES: [usize; 4] = [1_000, 10_000, 100_000, 1_000_000];

/// Seeded test vectors with values in `[0, 1)`
fn generate_vectors(n: usize, seed: u64) -> (Vec<f32>, Vec<f32>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let a = (0..n).map(|_| rng.gen::<f32>()).collect();
    let b = (0..n).map(|_| rng.gen::<f32>()).collect();
    (a, b)
}

fn bench_strategies(c: &mut Criterion) {
    let config = DotConfig::from_env();
    let mut group = c.benchmark_group("reduction_strategies");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(3));

    for n in SIZES {
        let (a, b) = generate_vectors(n, 42);
        group.throughput(Throughput::Elements(n as u64));

        for strategy in Strategy::ALL {
            let reducer = create_strategy(strategy, &config);
            group.bench_with_input(BenchmarkId::new(reducer.name(), n), &n, |bencher, _| {
                bencher.iter(|| reducer.compute(black_box(&a), black_box(&b)));
            });
        }
    }

    group.finish();
}

fn bench_harness(c: &mut Criterion) {
    let backend = default_accelerator();
    let kernel = KernelId::new(DOT_PRODUCT_KERNEL);
    let mut group = c.benchmark_group(format!("harness_{}", backend.name()));
    group.sample_size(20);

    for n in SIZES {
        let (a, b) = generate_vectors(n, 7);
        let geometry = match LaunchGeometry::covering(n, 256) {
            Ok(geometry) => geometry,
            Err(_) => continue,
        };
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("tree_reduce", n), &n, |bencher, _| {
            bencher.iter(|| {
                run_on_accelerator(
                    backend.as_ref(),
                    black_box(&a),
                    black_box(&b),
                    reduce_tree,
                    &geometry,
                    &kernel,
                )
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_harness);
criterion_main!(benches);
