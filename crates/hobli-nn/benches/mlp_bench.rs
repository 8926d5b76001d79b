//! Criterion benchmarks for hobli-nn: regressor training and prediction.

use criterion::{Criterion, criterion_group, criterion_main};
use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use hobli_nn::MlpConfig;

fn make_regression(n_samples: usize, n_features: usize, seed: u64) -> (Vec<Vec<f64>>, Vec<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(n_samples);
    let mut targets = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..n_features).map(|_| rng.r#gen::<f64>()).collect();
        targets.push(row.iter().enumerate().map(|(i, v)| v * (i + 1) as f64).sum());
        features.push(row);
    }
    (features, targets)
}

fn bench_train(c: &mut Criterion) {
    let (features, targets) = make_regression(2000, 6, 42);
    let cfg = MlpConfig::new(6).unwrap();

    c.bench_function("mlp_train_2000x6_20epochs", |b| {
        b.iter(|| cfg.fit(&features, &targets).unwrap());
    });
}

fn bench_predict_batch(c: &mut Criterion) {
    let (features, targets) = make_regression(2000, 6, 42);
    let model = MlpConfig::new(6)
        .unwrap()
        .fit(&features, &targets)
        .unwrap()
        .into_model();

    c.bench_function("mlp_predict_batch_2000x6", |b| {
        b.iter(|| model.predict_batch(&features).unwrap());
    });
}

criterion_group!(benches, bench_train, bench_predict_batch);
criterion_main!(benches);
