//! Gradient Boosting implementation
//!
//! Squared-error gradient boosting over regression trees: each round fits a tree
//! to the current residuals and adds its shrunken output to the ensemble.

use ndarray::{Array1, Array2, Axis};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::decision_tree::DecisionTreeRegressor;
use crate::error::{PricingError, Result};

/// Gradient Boosting configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds (trees)
    pub n_estimators: usize,
    /// Learning rate (shrinkage)
    pub learning_rate: f64,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Minimum samples per leaf
    pub min_samples_leaf: usize,
    /// Subsample ratio for each tree
    pub subsample: f64,
    /// Column subsample ratio
    pub colsample_bytree: f64,
    /// Random seed
    pub random_state: Option<u64>,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 300,
            learning_rate: 0.1,
            max_depth: 6,
            min_samples_leaf: 1,
            subsample: 1.0,
            colsample_bytree: 1.0,
            random_state: Some(42),
        }
    }
}

impl GradientBoostingConfig {
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: String, reason: &str| PricingError::InvalidParameter {
            name: name.to_string(),
            value,
            reason: reason.to_string(),
        };

        if self.n_estimators == 0 {
            return Err(invalid("n_estimators", "0".into(), "at least one boosting round is required"));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(invalid(
                "learning_rate",
                self.learning_rate.to_string(),
                "must be a positive number",
            ));
        }
        if self.max_depth == 0 {
            return Err(invalid("max_depth", "0".into(), "trees need at least one level"));
        }
        for (name, ratio) in [("subsample", self.subsample), ("colsample_bytree", self.colsample_bytree)] {
            if !(ratio > 0.0 && ratio <= 1.0) {
                return Err(invalid(name, ratio.to_string(), "must be in (0, 1]"));
            }
        }
        Ok(())
    }
}

/// Gradient Boosting Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTreeRegressor>,
    col_indices_per_tree: Vec<Vec<usize>>,
    initial_prediction: f64,
}

impl GradientBoostingRegressor {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            col_indices_per_tree: Vec::new(),
            initial_prediction: 0.0,
        }
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }

    /// Fit the gradient boosting model
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        self.config.validate()?;
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PricingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PricingError::TrainingError(
                "Cannot fit gradient boosting on zero samples".to_string(),
            ));
        }

        self.trees.clear();
        self.col_indices_per_tree.clear();
        self.initial_prediction = y.mean().unwrap_or(0.0);
        let mut predictions = Array1::from_elem(n_samples, self.initial_prediction);

        let mut rng = match self.config.random_state {
            Some(seed) => Xoshiro256PlusPlus::seed_from_u64(seed),
            None => Xoshiro256PlusPlus::from_entropy(),
        };

        for _ in 0..self.config.n_estimators {
            let residuals: Array1<f64> = if n_samples > 10000 {
                let preds = &predictions;
                let res: Vec<f64> = (0..n_samples)
                    .into_par_iter()
                    .map(|i| y[i] - preds[i])
                    .collect();
                Array1::from_vec(res)
            } else {
                y - &predictions
            };

            let sample_indices = Self::sample_indices(n_samples, self.config.subsample, &mut rng);
            let col_indices = Self::sample_indices(n_features, self.config.colsample_bytree, &mut rng);

            let x_cols = x.select(Axis(1), &col_indices);
            let x_sub = x_cols.select(Axis(0), &sample_indices);
            let y_sub = residuals.select(Axis(0), &sample_indices);

            let mut tree = DecisionTreeRegressor::new()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf)
                .with_random_state(rng.gen());
            tree.fit(&x_sub, &y_sub)?;

            // Every row moves, including the ones left out of this round's subsample
            let tree_pred = tree.predict(&x_cols)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);

            self.trees.push(tree);
            self.col_indices_per_tree.push(col_indices);
        }

        debug!(
            rounds = self.trees.len(),
            learning_rate = self.config.learning_rate,
            "Fitted gradient boosting"
        );
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(PricingError::ModelNotFitted);
        }

        let mut predictions = Array1::from_elem(x.nrows(), self.initial_prediction);
        for (tree, col_indices) in self.trees.iter().zip(self.col_indices_per_tree.iter()) {
            let x_sub = x.select(Axis(1), col_indices);
            let tree_pred = tree.predict(&x_sub)?;
            predictions.scaled_add(self.config.learning_rate, &tree_pred);
        }

        Ok(predictions)
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn sample_indices(n: usize, ratio: f64, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        let sample_size = ((n as f64) * ratio).ceil() as usize;
        if sample_size >= n {
            return (0..n).collect();
        }
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size.max(1));
        indices.sort_unstable();
        indices
    }
}
