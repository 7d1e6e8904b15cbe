//! Criterion benchmarks for label encoding, splitting, and scaling.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use kesra_prep::{StandardScaler, StratifiedSplit};

fn make_rows(n_rows: usize, n_features: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<usize>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let rows = (0..n_rows)
        .map(|_| (0..n_features).map(|_| rng.r#gen::<f64>() * 1e5).collect())
        .collect();
    let codes = (0..n_rows).map(|i| i % 3).collect();
    (rows, codes)
}

fn bench_scaler_fit_transform(c: &mut Criterion) {
    let (rows, _) = make_rows(10_000, 4, 42);

    c.bench_function("scaler_fit_transform_10000x4", |b| {
        b.iter(|| {
            let scaler = StandardScaler::fit(&rows).unwrap();
            scaler.transform(&rows).unwrap()
        });
    });
}

fn bench_stratified_split(c: &mut Criterion) {
    let (_, codes) = make_rows(10_000, 4, 42);
    let splitter = StratifiedSplit::new(0.2).unwrap().with_seed(42);

    c.bench_function("stratified_split_10000", |b| {
        b.iter(|| splitter.split(&codes).unwrap());
    });
}

criterion_group!(benches, bench_scaler_fit_transform, bench_stratified_split);
criterion_main!(benches);
