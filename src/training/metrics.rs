//! Regression metrics

use crate::error::{PricingError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Evaluation scores for one candidate
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r2: f64,
    pub n_samples: usize,
}

impl RegressionMetrics {
    pub fn compute(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_pred.len() {
            return Err(PricingError::ShapeError {
                expected: format!("{} predictions", y_true.len()),
                actual: format!("{} predictions", y_pred.len()),
            });
        }
        if y_true.is_empty() {
            return Err(PricingError::ComputationError(
                "Cannot score an empty evaluation set".to_string(),
            ));
        }

        let n = y_true.len() as f64;
        let errors = y_true - y_pred;

        let mse = errors.mapv(|e| e * e).sum() / n;
        let mae = errors.mapv(f64::abs).sum() / n;

        let y_mean = y_true.sum() / n;
        let ss_tot: f64 = y_true.iter().map(|y| (y - y_mean).powi(2)).sum();
        let ss_res: f64 = errors.mapv(|e| e * e).sum();

        // Constant target: perfect predictions score 1, anything else 0
        let r2 = if ss_tot > 0.0 {
            1.0 - ss_res / ss_tot
        } else if ss_res == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mae,
            rmse: mse.sqrt(),
            r2,
            n_samples: y_true.len(),
        })
    }
}
