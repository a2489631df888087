//! Feature/target separation and train/evaluation row splits

use crate::data::frame::{drop_if_present, f64_values, has_column};
use crate::error::{PricingError, Result};
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

/// Disjoint row indices
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainTestSplit {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Shuffle rows with a seeded generator and hold out `ceil(n * test_size)` of them.
///
/// The held-out count is clamped so both sides keep at least one row.
pub fn train_test_split(n_rows: usize, test_size: f64, seed: u64) -> Result<TrainTestSplit> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(PricingError::InvalidParameter {
            name: "test_size".to_string(),
            value: test_size.to_string(),
            reason: "must be strictly between 0 and 1".to_string(),
        });
    }
    if n_rows < 2 {
        return Err(PricingError::DataError(format!(
            "Need at least 2 rows to split, got {}",
            n_rows
        )));
    }

    let n_test = ((n_rows as f64 * test_size).ceil() as usize).clamp(1, n_rows - 1);

    let mut indices: Vec<usize> = (0..n_rows).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let mut test = indices[..n_test].to_vec();
    let mut train = indices[n_test..].to_vec();
    test.sort_unstable();
    train.sort_unstable();

    Ok(TrainTestSplit { train, test })
}

/// Remove rows whose target is null
pub fn drop_null_target(df: &DataFrame, target: &str) -> Result<DataFrame> {
    if !has_column(df, target) {
        return Err(PricingError::MissingTarget(target.to_string()));
    }
    let keep: Vec<bool> = f64_values(df, target)?
        .iter()
        .map(|v| v.map_or(false, |v| v.is_finite()))
        .collect();

    let dropped = keep.iter().filter(|k| !**k).count();
    if dropped == 0 {
        return Ok(df.clone());
    }
    warn!(rows = dropped, target, "Dropped rows without a target value");
    let mask: BooleanChunked = keep.into_iter().map(Some).collect();
    Ok(df.filter(&mask)?)
}

/// Separate the target from the features.
///
/// `excluded` columns are removed from the features when present. Rows with a
/// null target are dropped first.
pub fn split_features_target(
    df: &DataFrame,
    target: &str,
    excluded: &[String],
) -> Result<(DataFrame, Array1<f64>)> {
    let df = drop_null_target(df, target)?;

    let y: Array1<f64> = f64_values(&df, target)?
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect();

    let mut features = df;
    drop_if_present(&mut features, target)?;
    for col in excluded {
        drop_if_present(&mut features, col)?;
    }

    Ok((features, y))
}
