//! A named composition of group statistics, preprocessing and an estimator

use crate::error::{PricingError, Result};
use crate::estimators::{Estimator, Regressor};
use crate::features::GroupMeanState;
use crate::data::frame::has_column;
use crate::preprocessing::ColumnTransformer;
use ndarray::Array1;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Fitted candidate, persisted as one artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePipeline {
    name: String,
    target: String,
    /// Group means fitted on the training rows, replayed on new data
    group_stats: Vec<GroupMeanState>,
    preprocessor: ColumnTransformer,
    estimator: Estimator,
}

impl CandidatePipeline {
    /// Unfitted pipeline around an estimator
    pub fn new(name: impl Into<String>, target: impl Into<String>, estimator: Estimator) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            group_stats: Vec::new(),
            preprocessor: ColumnTransformer::new(),
            estimator,
        }
    }

    /// Attach fitted group statistics
    pub fn with_group_stats(mut self, states: Vec<GroupMeanState>) -> Self {
        self.group_stats = states;
        self
    }

    /// Fit preprocessing and the estimator on a feature table
    pub fn fit(&mut self, features: &DataFrame, y: &Array1<f64>) -> Result<&mut Self> {
        if features.height() != y.len() {
            return Err(PricingError::ShapeError {
                expected: format!("{} targets", features.height()),
                actual: format!("{} targets", y.len()),
            });
        }

        let x = self.preprocessor.fit_transform(features)?;
        debug!(
            candidate = %self.name,
            rows = x.nrows(),
            features = x.ncols(),
            "Fitting estimator"
        );
        self.estimator.fit(&x, y)?;
        Ok(self)
    }

    /// Add the stored group-mean columns to an engineered table
    pub fn apply_group_stats(&self, engineered: &DataFrame) -> Result<DataFrame> {
        let mut df = engineered.clone();
        for state in &self.group_stats {
            if has_column(&df, &state.key) {
                df = state.transform(&df)?;
            }
        }
        Ok(df)
    }

    /// Predict from a feature table.
    ///
    /// The table is reindexed to the fitted columns first, so extra columns are
    /// ignored and missing ones are filled.
    pub fn predict(&self, features: &DataFrame) -> Result<Array1<f64>> {
        if !self.estimator.is_fitted() {
            return Err(PricingError::ModelNotFitted);
        }
        let aligned = self.preprocessor.reindex(features)?;
        let x = self.preprocessor.transform(&aligned)?;
        self.estimator.predict(&x)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn estimator(&self) -> &Estimator {
        &self.estimator
    }

    pub fn group_stats(&self) -> &[GroupMeanState] {
        &self.group_stats
    }

    /// Columns the pipeline expects
    pub fn feature_names_in(&self) -> &[String] {
        self.preprocessor.feature_names_in()
    }

    pub fn feature_names_out(&self) -> Vec<String> {
        self.preprocessor.feature_names_out()
    }
}
