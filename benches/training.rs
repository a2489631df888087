use apartment_pricing::estimators::{
    EstimatorSpec, GradientBoostingConfig, RandomForestParams, Regressor,
};
use apartment_pricing::features::FeatureEngineer;
use apartment_pricing::training::{split_features_target, CandidatePipeline};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn create_listings(n_rows: usize) -> DataFrame {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let districts = ["Madinaty", "Fifth Settlement", "Rehab City", "Katameya"];
    let finishing = ["Super Lux", "Lux", "Semi-finished", "Unfinished"];

    let area: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(60.0..300.0)).collect();
    let bedrooms: Vec<i64> = (0..n_rows).map(|i| 2 + (i % 2) as i64).collect();
    let age: Vec<i64> = (0..n_rows).map(|_| rng.gen_range(0..30)).collect();
    let district: Vec<&str> = (0..n_rows).map(|i| districts[i % districts.len()]).collect();
    let finish: Vec<&str> = (0..n_rows).map(|_| finishing[rng.gen_range(0..4)]).collect();
    let auc: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(1.0..20.0)).collect();
    let mall: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.5..10.0)).collect();
    let metro: Vec<f64> = (0..n_rows).map(|_| rng.gen_range(0.5..15.0)).collect();
    let price: Vec<f64> = (0..n_rows)
        .map(|i| area[i] * 25_000.0 - age[i] as f64 * 10_000.0 + rng.gen_range(-5e4..5e4))
        .collect();

    df!(
        "area_sqm" => area,
        "bedrooms" => bedrooms,
        "building_age_years" => age,
        "district" => district,
        "finishing_type" => finish,
        "distance_to_auc_km" => auc,
        "distance_to_mall_km" => mall,
        "distance_to_metro_km" => metro,
        "price_egp" => price,
    )
    .unwrap()
}

fn create_matrix(n_rows: usize, n_features: usize) -> (Array2<f64>, Array1<f64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let x = Array2::from_shape_fn((n_rows, n_features), |_| rng.gen::<f64>() * 10.0);
    let y = x.sum_axis(ndarray::Axis(1)) + Array1::from_shape_fn(n_rows, |_| rng.gen::<f64>() * 0.1);
    (x, y)
}

fn bench_feature_engineering(c: &mut Criterion) {
    let mut group = c.benchmark_group("feature_engineering");
    let engineer = FeatureEngineer::new();

    for n_rows in [1000, 10000].iter() {
        let df = create_listings(*n_rows);
        group.bench_with_input(BenchmarkId::new("engineer", n_rows), &df, |b, df| {
            b.iter(|| engineer.engineer(black_box(df)))
        });
    }

    group.finish();
}

fn bench_estimators(c: &mut Criterion) {
    let mut group = c.benchmark_group("training");
    group.sample_size(10); // Fewer samples for training benchmarks

    let specs = [
        EstimatorSpec::LinearRegression,
        EstimatorSpec::RandomForest(RandomForestParams {
            n_estimators: 50,
            ..Default::default()
        }),
        EstimatorSpec::GradientBoosting(GradientBoostingConfig {
            n_estimators: 100,
            ..Default::default()
        }),
    ];

    for n_rows in [1000, 5000].iter() {
        let (x, y) = create_matrix(*n_rows, 10);
        for spec in &specs {
            group.bench_with_input(BenchmarkId::new(spec.kind(), n_rows), &(&x, &y), |b, (x, y)| {
                b.iter(|| {
                    let mut estimator = spec.build(42);
                    estimator.fit(black_box(x), black_box(y)).unwrap();
                    estimator
                })
            });
        }
    }

    group.finish();
}

fn bench_prediction(c: &mut Criterion) {
    let mut group = c.benchmark_group("prediction");

    // Train once
    let engineered = FeatureEngineer::new().engineer(&create_listings(5000));
    let (features, y) = split_features_target(&engineered, "price_egp", &["price_per_sqm".to_string()]).unwrap();
    let spec = EstimatorSpec::RandomForest(RandomForestParams {
        n_estimators: 50,
        ..Default::default()
    });
    let mut pipeline = CandidatePipeline::new("RandomForest", "price_egp", spec.build(42));
    pipeline.fit(&features, &y).unwrap();

    for batch_size in [1, 100, 1000].iter() {
        let batch = features.head(Some(*batch_size));
        group.bench_with_input(BenchmarkId::new("pipeline", batch_size), &batch, |b, batch| {
            b.iter(|| pipeline.predict(black_box(batch)).unwrap())
        });
    }

    group.finish();
}

criterion_group!(benches, bench_feature_engineering, bench_estimators, bench_prediction);
criterion_main!(benches);
