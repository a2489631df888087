//! Ordinary least squares

use crate::error::{PricingError, Result};
use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Relative pivot tolerance below which the normal matrix is treated as singular
const PIVOT_TOLERANCE: f64 = 1e-10;

/// Solve symmetric positive-definite system Ax = b using Cholesky decomposition.
/// Returns None when a pivot falls below the tolerance.
fn cholesky_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    if n != a.ncols() || n != b.len() {
        return None;
    }

    // A = L * L^T
    let mut l = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[[i, k]] * l[[j, k]];
            }

            if i == j {
                let diag = a[[i, i]] - sum;
                if diag <= PIVOT_TOLERANCE * a[[i, i]].abs().max(f64::MIN_POSITIVE) {
                    return None;
                }
                l[[i, j]] = diag.sqrt();
            } else {
                l[[i, j]] = (a[[i, j]] - sum) / l[[j, j]];
            }
        }
    }

    // Forward substitution: L * y = b
    let mut y = Array1::<f64>::zeros(n);
    for i in 0..n {
        let mut sum = 0.0;
        for j in 0..i {
            sum += l[[i, j]] * y[j];
        }
        y[i] = (b[i] - sum) / l[[i, i]];
    }

    // Backward substitution: L^T * x = y
    let mut x = Array1::<f64>::zeros(n);
    for i in (0..n).rev() {
        let mut sum = 0.0;
        for j in (i + 1)..n {
            sum += l[[j, i]] * x[j];
        }
        x[i] = (y[i] - sum) / l[[i, i]];
    }

    Some(x)
}

/// Gauss-Jordan elimination with partial pivoting (fallback)
fn gauss_jordan_solve(a: &Array2<f64>, b: &Array1<f64>) -> Option<Array1<f64>> {
    let n = a.nrows();
    let mut aug = Array2::<f64>::zeros((n, n + 1));
    aug.slice_mut(ndarray::s![.., ..n]).assign(a);
    aug.column_mut(n).assign(b);

    for col in 0..n {
        let pivot_row = (col..n).max_by(|&r1, &r2| {
            aug[[r1, col]].abs().total_cmp(&aug[[r2, col]].abs())
        })?;
        if aug[[pivot_row, col]].abs() < 1e-12 {
            return None;
        }
        if pivot_row != col {
            for j in 0..=n {
                aug.swap([col, j], [pivot_row, j]);
            }
        }

        let pivot = aug[[col, col]];
        aug.row_mut(col).mapv_inplace(|v| v / pivot);

        for row in 0..n {
            if row != col {
                let factor = aug[[row, col]];
                if factor != 0.0 {
                    for j in 0..=n {
                        aug[[row, j]] -= factor * aug[[col, j]];
                    }
                }
            }
        }
    }

    Some(aug.column(n).to_owned())
}

/// Solve (X^T X + ridge I) w = X^T y.
///
/// Tries plain Cholesky first; a rank-deficient system (collinear one-hot columns,
/// constant features) is retried with a small ridge term scaled to the matrix.
fn solve_normal_equations(xtx: &Array2<f64>, xty: &Array1<f64>) -> Result<Array1<f64>> {
    if let Some(w) = cholesky_solve(xtx, xty) {
        return Ok(w);
    }

    let n = xtx.nrows();
    let mean_diag = xtx.diag().iter().map(|v| v.abs()).sum::<f64>() / n.max(1) as f64;
    let ridge = 1e-8 * mean_diag.max(1.0);
    debug!(ridge, "Normal matrix is rank deficient, adding ridge term");

    let mut regularized = xtx.clone();
    for i in 0..n {
        regularized[[i, i]] += ridge;
    }

    cholesky_solve(&regularized, xty)
        .or_else(|| gauss_jordan_solve(&regularized, xty))
        .ok_or_else(|| {
            PricingError::ComputationError(
                "Matrix is singular, cannot solve least squares".to_string(),
            )
        })
}

/// Linear regression model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearRegression {
    /// Fitted coefficients (weights)
    pub coefficients: Option<Array1<f64>>,
    /// Fitted intercept (bias)
    pub intercept: Option<f64>,
}

impl Default for LinearRegression {
    fn default() -> Self {
        Self::new()
    }
}

impl LinearRegression {
    pub fn new() -> Self {
        Self {
            coefficients: None,
            intercept: None,
        }
    }

    /// Fit the model to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        if n_samples != y.len() {
            return Err(PricingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PricingError::TrainingError(
                "Cannot fit a linear model on zero samples".to_string(),
            ));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| PricingError::ComputationError("empty feature matrix".to_string()))?;
        let y_mean = y.mean().unwrap_or(0.0);

        let x_centered = x - &x_mean.view().insert_axis(Axis(0));
        let y_centered = y - y_mean;

        let xtx = x_centered.t().dot(&x_centered);
        let xty = x_centered.t().dot(&y_centered);
        let coefficients = solve_normal_equations(&xtx, &xty)?;
        let intercept = y_mean - coefficients.dot(&x_mean);

        self.coefficients = Some(coefficients);
        self.intercept = Some(intercept);
        Ok(self)
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self
            .coefficients
            .as_ref()
            .ok_or(PricingError::ModelNotFitted)?;
        if x.ncols() != coefficients.len() {
            return Err(PricingError::ShapeError {
                expected: format!("{} features", coefficients.len()),
                actual: format!("{} features", x.ncols()),
            });
        }
        Ok(x.dot(coefficients) + self.intercept.unwrap_or(0.0))
    }

    pub fn is_fitted(&self) -> bool {
        self.coefficients.is_some()
    }
}
