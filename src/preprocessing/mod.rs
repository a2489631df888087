//! Data preprocessing module
//!
//! Provides the per-candidate preprocessing step:
//! - Standard scaling of numeric columns (nulls imputed with the mean)
//! - One-hot encoding of categorical columns, ignoring unseen categories
//! - Column statistics used by the dataset summary

mod column_transformer;
mod encoder;
mod scaler;

pub use column_transformer::ColumnTransformer;
pub use encoder::{CategoryMapping, OneHotEncoder};
pub use scaler::{ScalerParams, StandardScaler};

use crate::data::frame::{is_numeric_dtype, is_text_dtype};
use crate::error::Result;
use polars::prelude::*;
use serde::{Deserialize, Serialize};

/// Column data type for preprocessing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

impl ColumnType {
    /// Kind of a polars dtype, `None` for types that are never used as features
    pub fn of(dtype: &DataType) -> Option<Self> {
        if is_numeric_dtype(dtype) {
            Some(ColumnType::Numeric)
        } else if is_text_dtype(dtype) {
            Some(ColumnType::Categorical)
        } else {
            None
        }
    }
}

/// Per-column statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureStats {
    pub name: String,
    pub dtype: String,
    pub kind: Option<ColumnType>,
    pub count: usize,
    pub null_count: usize,
    pub unique_count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl FeatureStats {
    /// Compute statistics for one column
    pub fn from_column(column: &Column) -> Result<Self> {
        let series = column.as_materialized_series();
        let kind = ColumnType::of(series.dtype());

        let mut stats = Self {
            name: series.name().to_string(),
            dtype: series.dtype().to_string(),
            kind,
            count: series.len(),
            null_count: series.null_count(),
            unique_count: series.n_unique()?,
            mean: None,
            std: None,
            min: None,
            max: None,
        };

        if kind == Some(ColumnType::Numeric) {
            let casted = series.cast(&DataType::Float64)?;
            let ca = casted.f64()?;
            stats.mean = ca.mean();
            stats.std = ca.std(1);
            stats.min = ca.min();
            stats.max = ca.max();
        }

        Ok(stats)
    }

    /// Statistics for every column of a table
    pub fn for_frame(df: &DataFrame) -> Result<Vec<Self>> {
        df.get_columns().iter().map(Self::from_column).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_stats() {
        let df = df!(
            "area_sqm" => &[Some(100.0), Some(200.0), None],
            "district" => &["Rehab", "Rehab", "Maadi"],
        )
        .unwrap();
        let stats = FeatureStats::for_frame(&df).unwrap();

        assert_eq!(stats[0].kind, Some(ColumnType::Numeric));
        assert_eq!(stats[0].null_count, 1);
        assert_eq!(stats[0].mean, Some(150.0));

        assert_eq!(stats[1].kind, Some(ColumnType::Categorical));
        assert_eq!(stats[1].unique_count, 2);
        assert!(stats[1].mean.is_none());
    }

    #[test]
    fn test_column_type_serialize() {
        let json = serde_json::to_string(&ColumnType::Numeric).unwrap();
        assert_eq!(json, "\"Numeric\"");
    }
}
