//! Regression estimators
//!
//! Native implementations of the three model families compared by the trainer.
//! [`EstimatorSpec`] is the declarative, configurable description of a model;
//! [`Estimator`] is the fitted (or fittable) model itself.

mod decision_tree;
mod gradient_boosting;
mod linear;
mod random_forest;

pub use decision_tree::{DecisionTreeRegressor, TreeNode};
pub use gradient_boosting::{GradientBoostingConfig, GradientBoostingRegressor};
pub use linear::LinearRegression;
pub use random_forest::{MaxFeatures, RandomForestRegressor};

use crate::error::Result;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// A model that maps a feature matrix to a continuous target
pub trait Regressor {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;
    fn is_fitted(&self) -> bool;
}

/// Random forest hyperparameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestParams {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    pub max_features: MaxFeatures,
    /// Overrides the pipeline seed when set
    pub random_state: Option<u64>,
}

impl Default for RandomForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 200,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: MaxFeatures::All,
            random_state: None,
        }
    }
}

/// Declarative model description
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EstimatorSpec {
    LinearRegression,
    RandomForest(RandomForestParams),
    GradientBoosting(GradientBoostingConfig),
}

impl EstimatorSpec {
    /// Unfitted estimator. `seed` applies where the spec does not pin its own.
    pub fn build(&self, seed: u64) -> Estimator {
        match self {
            EstimatorSpec::LinearRegression => Estimator::Linear(LinearRegression::new()),
            EstimatorSpec::RandomForest(p) => {
                let mut rf = RandomForestRegressor::new(p.n_estimators)
                    .with_min_samples_leaf(p.min_samples_leaf)
                    .with_max_features(p.max_features)
                    .with_random_state(p.random_state.unwrap_or(seed));
                if let Some(d) = p.max_depth {
                    rf = rf.with_max_depth(d);
                }
                Estimator::RandomForest(rf)
            }
            EstimatorSpec::GradientBoosting(config) => {
                let mut config = config.clone();
                config.random_state = config.random_state.or(Some(seed));
                Estimator::GradientBoosting(GradientBoostingRegressor::new(config))
            }
        }
    }

    /// Model family name
    pub fn kind(&self) -> &'static str {
        match self {
            EstimatorSpec::LinearRegression => "linear_regression",
            EstimatorSpec::RandomForest(_) => "random_forest",
            EstimatorSpec::GradientBoosting(_) => "gradient_boosting",
        }
    }
}

/// Any fitted model the pipeline can hold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Estimator {
    Linear(LinearRegression),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Estimator::Linear(_) => "linear_regression",
            Estimator::RandomForest(_) => "random_forest",
            Estimator::GradientBoosting(_) => "gradient_boosting",
        }
    }
}

impl Regressor for Estimator {
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Estimator::Linear(m) => m.fit(x, y).map(|_| ()),
            Estimator::RandomForest(m) => m.fit(x, y).map(|_| ()),
            Estimator::GradientBoosting(m) => m.fit(x, y).map(|_| ()),
        }
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Estimator::Linear(m) => m.predict(x),
            Estimator::RandomForest(m) => m.predict(x),
            Estimator::GradientBoosting(m) => m.predict(x),
        }
    }

    fn is_fitted(&self) -> bool {
        match self {
            Estimator::Linear(m) => m.is_fitted(),
            Estimator::RandomForest(m) => m.n_trees() > 0,
            Estimator::GradientBoosting(m) => m.n_trees() > 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_json_roundtrip() {
        let json = r#"{"type": "RandomForest", "n_estimators": 50}"#;
        let spec: EstimatorSpec = serde_json::from_str(json).unwrap();
        match &spec {
            EstimatorSpec::RandomForest(p) => {
                assert_eq!(p.n_estimators, 50);
                assert_eq!(p.max_features, MaxFeatures::All);
            }
            other => panic!("unexpected spec {:?}", other),
        }

        let linear: EstimatorSpec = serde_json::from_str(r#"{"type": "LinearRegression"}"#).unwrap();
        assert_eq!(linear, EstimatorSpec::LinearRegression);
    }

    #[test]
    fn test_build_applies_seed() {
        let spec = EstimatorSpec::GradientBoosting(GradientBoostingConfig {
            random_state: None,
            ..Default::default()
        });
        match spec.build(7) {
            Estimator::GradientBoosting(m) => assert_eq!(m.config().random_state, Some(7)),
            other => panic!("unexpected estimator {}", other.kind()),
        }
    }

    #[test]
    fn test_estimator_dispatch() {
        let x = Array2::from_shape_fn((30, 2), |(i, j)| (i + j) as f64);
        let y = Array1::from_shape_fn(30, |i| 3.0 * i as f64 + 1.0);

        for spec in [
            EstimatorSpec::LinearRegression,
            EstimatorSpec::RandomForest(RandomForestParams {
                n_estimators: 5,
                ..Default::default()
            }),
            EstimatorSpec::GradientBoosting(GradientBoostingConfig {
                n_estimators: 10,
                ..Default::default()
            }),
        ] {
            let mut est = spec.build(42);
            assert!(!est.is_fitted());
            est.fit(&x, &y).unwrap();
            assert!(est.is_fitted(), "{}", spec.kind());
            assert_eq!(est.predict(&x).unwrap().len(), 30);
        }
    }
}
