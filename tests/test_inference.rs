//! Integration test: pricing listings with persisted candidates

mod common;

use apartment_pricing::config::PipelineConfig;
use apartment_pricing::export::ArtifactStore;
use apartment_pricing::inference::{ListingInput, Predictor};
use apartment_pricing::training::{Trainer, TrainingReport};
use apartment_pricing::PricingError;
use polars::prelude::*;
use std::path::Path;

fn train_into(dir: &Path) -> TrainingReport {
    let config = PipelineConfig::default()
        .with_models_dir(dir)
        .with_candidates(common::small_candidates());
    Trainer::new(config)
        .unwrap()
        .train(&common::listings(150, 42))
        .unwrap()
}

#[test]
fn test_best_predictor_matches_report() {
    let dir = tempfile::tempdir().unwrap();
    let report = train_into(dir.path());

    let predictor = Predictor::best(dir.path()).unwrap();
    let best = report.best().unwrap();
    assert_eq!(predictor.model_name(), best.name);
    assert_eq!(predictor.metadata().metrics, best.metrics.unwrap());
}

#[test]
fn test_predict_listing_with_unseen_compound() {
    let dir = tempfile::tempdir().unwrap();
    train_into(dir.path());
    let predictor = Predictor::best(dir.path()).unwrap();

    let listing = ListingInput {
        compound_name: Some("Brand New Compound".to_string()),
        district: "Fifth Settlement".to_string(),
        area_sqm: 180.0,
        ..Default::default()
    };
    let prediction = predictor.predict_listing(&listing).unwrap();
    assert!(prediction.price_egp.is_finite());
    assert!(prediction.price_egp > 0.0, "{}", prediction.price_egp);
    assert!(!prediction.out_of_distribution);
    assert_eq!(prediction.model, predictor.model_name());
}

#[test]
fn test_bigger_apartments_cost_more() {
    let dir = tempfile::tempdir().unwrap();
    let report = train_into(dir.path());
    let linear = Predictor::load(report.outcomes[0].artifact.as_ref().unwrap()).unwrap();

    let small = linear
        .predict_listing(&ListingInput { area_sqm: 80.0, ..Default::default() })
        .unwrap();
    let large = linear
        .predict_listing(&ListingInput { area_sqm: 250.0, ..Default::default() })
        .unwrap();
    assert!(large.price_egp > small.price_egp);
}

#[test]
fn test_predict_frame_keeps_out_of_range_rows() {
    let dir = tempfile::tempdir().unwrap();
    train_into(dir.path());
    let predictor = Predictor::best(dir.path()).unwrap();

    // Bedrooms cycle 2, 3, 1, 3, 2, 4
    let mut raw = common::listings(12, 99);
    raw.drop_in_place("price_egp").unwrap();

    let predictions = predictor.predict_frame(&raw).unwrap();
    assert_eq!(predictions.len(), 12);
    let flags: Vec<bool> = predictions.iter().map(|p| p.out_of_distribution).collect();
    assert_eq!(
        flags,
        vec![false, false, true, false, false, true, false, false, true, false, false, true]
    );
    assert!(predictions.iter().all(|p| p.price_egp.is_finite()));
}

#[test]
fn test_missing_columns_are_filled() {
    let dir = tempfile::tempdir().unwrap();
    train_into(dir.path());
    let predictor = Predictor::best(dir.path()).unwrap();

    let sparse = df!(
        "area_sqm" => &[140.0],
        "bedrooms" => &[2i64],
        "district" => &["Madinaty"],
    )
    .unwrap();
    let predictions = predictor.predict_frame(&sparse).unwrap();
    assert_eq!(predictions.len(), 1);
    assert!(predictions[0].price_egp.is_finite());
}

#[test]
fn test_no_trained_models() {
    let dir = tempfile::tempdir().unwrap();
    let err = Predictor::best(dir.path()).unwrap_err();
    assert!(matches!(err, PricingError::NoTrainedModels(_)));
    assert!(err.to_string().contains("Train a model first"));
}

#[test]
fn test_corrupt_artifact_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let report = train_into(dir.path());
    let path = report.outcomes[0].artifact.clone().unwrap();

    let mut bytes = std::fs::read(&path).unwrap();
    let last = bytes.len() - 20;
    bytes[last] ^= 0xff;
    std::fs::write(&path, &bytes).unwrap();

    assert!(matches!(
        Predictor::load(&path),
        Err(PricingError::CorruptArtifact { .. })
    ));

    // The remaining artifacts still serve predictions
    assert_eq!(ArtifactStore::new(dir.path()).list_metadata().unwrap().len(), 2);
    assert!(Predictor::best(dir.path()).is_ok());
}
