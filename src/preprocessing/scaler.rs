//! Standard scaling of numeric columns

use crate::data::frame::f64_values;
use crate::error::{PricingError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Parameters for one fitted column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    pub column: String,
    pub mean: f64,
    /// Population standard deviation, 1.0 for constant columns
    pub scale: f64,
}

/// Standard scaling (z-score normalization): (x - mean) / std.
///
/// Nulls are imputed with the fitted mean, so they scale to 0.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StandardScaler {
    params: Vec<ScalerParams>,
    is_fitted: bool,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fit the scaler to the given columns
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.params = columns
            .iter()
            .map(|name| Self::compute_params(df, name))
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(self)
    }

    /// Scaled values of one fitted column
    pub fn transform_column(&self, df: &DataFrame, params: &ScalerParams) -> Result<Vec<f64>> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }
        let values = f64_values(df, &params.column)?;
        Ok(values
            .into_iter()
            .map(|v| match v {
                Some(x) if x.is_finite() => (x - params.mean) / params.scale,
                _ => 0.0,
            })
            .collect())
    }

    pub fn params(&self) -> &[ScalerParams] {
        &self.params
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn compute_params(df: &DataFrame, name: &str) -> Result<ScalerParams> {
        let values: Vec<f64> = f64_values(df, name)?
            .into_iter()
            .flatten()
            .filter(|v| v.is_finite())
            .collect();

        if values.is_empty() {
            return Ok(ScalerParams {
                column: name.to_string(),
                mean: 0.0,
                scale: 1.0,
            });
        }

        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std = var.sqrt();

        Ok(ScalerParams {
            column: name.to_string(),
            mean,
            scale: if std > 0.0 { std } else { 1.0 },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_scaler() {
        let df = df!("area" => &[Some(100.0), Some(200.0), Some(300.0), None]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit(&df, &["area".to_string()]).unwrap();

        let params = &scaler.params()[0];
        assert!((params.mean - 200.0).abs() < 1e-9);

        let scaled = scaler.transform_column(&df, params).unwrap();
        assert!((scaled[1]).abs() < 1e-9);
        assert!((scaled[0] + scaled[2]).abs() < 1e-9);
        assert_eq!(scaled[3], 0.0);
    }

    #[test]
    fn test_constant_column() {
        let df = df!("floor" => &[3i64, 3, 3]).unwrap();
        let mut scaler = StandardScaler::new();
        scaler.fit(&df, &["floor".to_string()]).unwrap();
        assert_eq!(scaler.params()[0].scale, 1.0);
        let scaled = scaler.transform_column(&df, &scaler.params()[0]).unwrap();
        assert!(scaled.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_not_fitted() {
        let df = df!("a" => &[1.0]).unwrap();
        let scaler = StandardScaler::new();
        let params = ScalerParams {
            column: "a".into(),
            mean: 0.0,
            scale: 1.0,
        };
        assert!(matches!(
            scaler.transform_column(&df, &params),
            Err(PricingError::ModelNotFitted)
        ));
    }
}
