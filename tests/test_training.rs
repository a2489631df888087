//! Integration test: training pipeline end-to-end

mod common;

use apartment_pricing::config::{GroupStatsMode, PipelineConfig};
use apartment_pricing::data::frame::take_rows;
use apartment_pricing::estimators::{EstimatorSpec, GradientBoostingConfig};
use apartment_pricing::export::ArtifactStore;
use apartment_pricing::features::{FeatureEngineer, GroupMeanEncoder};
use apartment_pricing::inference::Predictor;
use apartment_pricing::training::{drop_null_target, train_test_split, CandidateSpec, Trainer};
use apartment_pricing::PricingError;
use polars::prelude::*;
use std::path::Path;

fn config(models_dir: &Path) -> PipelineConfig {
    PipelineConfig::default()
        .with_models_dir(models_dir)
        .with_candidates(common::small_candidates())
}

fn read_summary(path: &Path) -> DataFrame {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .unwrap()
        .finish()
        .unwrap()
}

#[test]
fn test_three_candidates_three_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let raw = common::listings(150, 42);

    let trainer = Trainer::new(config(dir.path())).unwrap();
    let report = trainer.train(&raw).unwrap();

    assert_eq!(report.outcomes.len(), 3);
    assert_eq!(report.n_succeeded(), 3, "{:?}", report.outcomes);
    assert_eq!(report.n_train + report.n_eval, 100);
    assert_eq!(report.n_eval, 20);

    let artifacts = ArtifactStore::new(dir.path()).list().unwrap();
    assert_eq!(artifacts.len(), 3);

    let summary = read_summary(&report.summary_path);
    assert_eq!(summary.height(), 3);
    assert_eq!(
        summary.get_column_names_str(),
        vec!["Model", "MAE", "RMSE", "R2", "Error"]
    );
    let models: Vec<Option<&str>> = summary.column("Model").unwrap().str().unwrap().into_iter().collect();
    assert_eq!(
        models,
        vec![Some("LinearRegression"), Some("RandomForest"), Some("GradientBoosting")]
    );
    for r2 in summary.column("R2").unwrap().f64().unwrap().into_iter() {
        let r2 = r2.unwrap();
        assert!(r2 <= 1.0, "R² {} above 1", r2);
    }

    // Near-linear synthetic prices: least squares should fit well
    let linear = &report.outcomes[0];
    assert!(linear.metrics.unwrap().r2 > 0.9, "{:?}", linear.metrics);
    assert!(report.best().is_some());
}

#[test]
fn test_artifact_names_and_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let raw = common::listings(120, 1);
    let trainer = Trainer::new(config(dir.path())).unwrap();
    let report = trainer.train(&raw).unwrap();

    for outcome in &report.outcomes {
        let path = outcome.artifact.as_ref().unwrap();
        let metrics = outcome.metrics.unwrap();
        let file = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(file, ArtifactStore::file_name(&outcome.name, metrics.r2));

        let meta = ArtifactStore::read_metadata(path).unwrap();
        assert_eq!(meta.name, outcome.name);
        assert_eq!(meta.run_id, report.run_id);
        assert_eq!(meta.target_name, "price_egp");
        assert_eq!(meta.metrics, metrics);
        assert!(!meta.feature_names.iter().any(|f| f == "price_egp" || f == "price_per_sqm"));
        assert!(meta.feature_names.iter().any(|f| f == "district_avg_price"));
    }
}

#[test]
fn test_failing_candidate_is_isolated() {
    let dir = tempfile::tempdir().unwrap();
    let raw = common::listings(90, 7);

    let candidates = vec![
        CandidateSpec::new("LinearRegression", EstimatorSpec::LinearRegression),
        CandidateSpec::new(
            "BrokenBoosting",
            EstimatorSpec::GradientBoosting(GradientBoostingConfig {
                learning_rate: 0.0,
                ..Default::default()
            }),
        ),
    ];
    let config = PipelineConfig::default()
        .with_models_dir(dir.path())
        .with_candidates(candidates);

    let report = Trainer::new(config).unwrap().train(&raw).unwrap();
    assert_eq!(report.n_succeeded(), 1);
    assert_eq!(report.n_failed(), 1);

    let failed = &report.outcomes[1];
    assert!(failed.metrics.is_none());
    assert!(failed.error.as_deref().unwrap().contains("learning_rate"));

    assert_eq!(ArtifactStore::new(dir.path()).list().unwrap().len(), 1);

    let summary = read_summary(&report.summary_path);
    assert_eq!(summary.height(), 2);
    assert_eq!(summary.column("R2").unwrap().null_count(), 1);
    assert_eq!(summary.column("Error").unwrap().null_count(), 1);
}

#[test]
fn test_retraining_replaces_artifacts() {
    let dir = tempfile::tempdir().unwrap();
    let trainer = Trainer::new(config(dir.path())).unwrap();

    trainer.train(&common::listings(120, 1)).unwrap();
    trainer.train(&common::listings(120, 2)).unwrap();

    assert_eq!(ArtifactStore::new(dir.path()).list().unwrap().len(), 3);
}

#[test]
fn test_failed_retrain_keeps_previous_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let raw = common::listings(120, 5);
    let boosting = |learning_rate: f64| {
        PipelineConfig::default()
            .with_models_dir(dir.path())
            .with_candidates(vec![CandidateSpec::new(
                "GB",
                EstimatorSpec::GradientBoosting(GradientBoostingConfig {
                    n_estimators: 10,
                    learning_rate,
                    ..Default::default()
                }),
            )])
    };

    let good = Trainer::new(boosting(0.1)).unwrap().train(&raw).unwrap();
    let good_path = good.outcomes[0].artifact.clone().unwrap();

    let failed = Trainer::new(boosting(0.0)).unwrap().train(&raw).unwrap();
    assert_eq!(failed.n_failed(), 1);

    let artifacts = ArtifactStore::new(dir.path()).list().unwrap();
    assert_eq!(artifacts, vec![good_path.clone()]);
    assert_eq!(Predictor::best(dir.path()).unwrap().path(), good_path.as_path());
}

#[test]
fn test_train_only_group_stats() {
    let dir = tempfile::tempdir().unwrap();
    let raw = common::listings(150, 42);
    let report = Trainer::new(config(dir.path())).unwrap().train(&raw).unwrap();
    let (pipeline, _) = ArtifactStore::load(report.outcomes[0].artifact.as_ref().unwrap()).unwrap();

    // Same engineering and split as the trainer
    let engineered = FeatureEngineer::with_target("price_egp")
        .without_group_means()
        .engineer(&raw);
    let engineered = drop_null_target(&engineered, "price_egp").unwrap();
    let split = train_test_split(engineered.height(), 0.2, 42).unwrap();
    let train = take_rows(&engineered, &split.train).unwrap();

    let encoder = GroupMeanEncoder::district("price_egp");
    let train_only = encoder.fit(&train).unwrap();
    let full_table = encoder.fit(&engineered).unwrap();

    assert_eq!(pipeline.group_stats()[0], train_only);
    assert_ne!(pipeline.group_stats()[0], full_table);
}

#[test]
fn test_deterministic_for_fixed_seed() {
    let raw = common::listings(120, 11);

    let a = tempfile::tempdir().unwrap();
    let b = tempfile::tempdir().unwrap();
    let first = Trainer::new(config(a.path())).unwrap().train(&raw).unwrap();
    let second = Trainer::new(config(b.path())).unwrap().train(&raw).unwrap();

    for (x, y) in first.outcomes.iter().zip(&second.outcomes) {
        assert_eq!(x.metrics, y.metrics, "{}", x.name);
    }
}

#[test]
fn test_missing_target_aborts_run() {
    let dir = tempfile::tempdir().unwrap();
    let mut raw = common::listings(60, 3);
    raw.drop_in_place("price_egp").unwrap();

    let err = Trainer::new(config(dir.path())).unwrap().train(&raw).unwrap_err();
    assert!(matches!(err, PricingError::MissingTarget(_)));
    assert!(!dir.path().join("model_summary.csv").exists());
}

#[test]
fn test_run_from_csv_full_table_stats() {
    let dir = tempfile::tempdir().unwrap();
    let data_path = dir.path().join("listings.csv");
    common::write_csv(&common::listings(120, 4), &data_path);

    let config = config(&dir.path().join("models"))
        .with_data_path(&data_path)
        .with_group_stats(GroupStatsMode::FullTable);
    let report = Trainer::new(config).unwrap().run().unwrap();
    assert_eq!(report.n_succeeded(), 3);

    let (pipeline, _) = ArtifactStore::load(report.outcomes[0].artifact.as_ref().unwrap()).unwrap();
    let keys: Vec<&str> = pipeline.group_stats().iter().map(|s| s.key.as_str()).collect();
    assert_eq!(keys, vec!["district", "compound_name"]);
}

#[test]
fn test_invalid_config_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let config = config(dir.path()).with_test_size(1.5);
    assert!(matches!(Trainer::new(config), Err(PricingError::ConfigError(_))));

    let config = PipelineConfig::default()
        .with_models_dir(dir.path())
        .with_candidates(Vec::new());
    assert!(Trainer::new(config).is_err());
}
