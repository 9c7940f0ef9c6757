//! Scaling benchmark for the SymNMF pipeline stages.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::Array2;
use rand::{rngs::StdRng, Rng, SeedableRng};
use symnmf::{
    factorize, normalized_from_points, random_init, similarity_matrix, FactorizeConfig,
};

fn random_points(n: usize, d: usize, seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((n, d), |_| rng.gen_range(-1.0..1.0))
}

fn bench_pipeline_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("symnmf_pipeline_scaling");

    for n in [32usize, 64, 128, 256] {
        let points = random_points(n, 8, 7);

        group.bench_with_input(BenchmarkId::new("similarity", n), &n, |b, _| {
            b.iter(|| black_box(similarity_matrix(black_box(&points))))
        });

        group.bench_with_input(BenchmarkId::new("normalized", n), &n, |b, _| {
            b.iter(|| black_box(normalized_from_points(black_box(&points))).unwrap())
        });

        let w = normalized_from_points(&points).unwrap();
        let k = 4;
        // Cap iterations so the comparison across n stays about the update
        // cost, not about convergence luck.
        let cfg = FactorizeConfig {
            max_iter: 50,
            ..Default::default()
        };
        group.bench_with_input(BenchmarkId::new("factorize", n), &n, |b, _| {
            b.iter(|| {
                let mut rng = StdRng::seed_from_u64(11);
                let h0 = random_init(&w, k, &mut rng).unwrap();
                black_box(factorize(black_box(&w), h0, &cfg)).unwrap()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_pipeline_scaling);
criterion_main!(benches);
