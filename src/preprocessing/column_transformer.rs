//! Column-wise preprocessing: numeric columns are standard-scaled and text
//! columns one-hot encoded into a dense feature matrix.

use super::encoder::OneHotEncoder;
use super::scaler::StandardScaler;
use super::ColumnType;
use crate::data::frame::has_column;
use crate::error::{PricingError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Fitted preprocessing for one candidate pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ColumnTransformer {
    feature_names_in: Vec<String>,
    column_types: Vec<ColumnType>,
    scaler: StandardScaler,
    encoder: OneHotEncoder,
    is_fitted: bool,
}

impl ColumnTransformer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect column kinds and fit the scaler and encoder
    pub fn fit(&mut self, df: &DataFrame) -> Result<&mut Self> {
        let mut names = Vec::new();
        let mut types = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let dtype = col.dtype();
            let kind = match dtype {
                DataType::Null => Some(ColumnType::Numeric),
                _ => ColumnType::of(dtype),
            };
            match kind {
                Some(kind) => {
                    names.push(name);
                    types.push(kind);
                }
                None => {
                    warn!(column = %name, dtype = %dtype, "Unsupported column type, not used as a feature")
                }
            }
        }

        if names.is_empty() {
            return Err(PricingError::DataError(
                "No numeric or categorical feature columns to fit".to_string(),
            ));
        }

        let numeric = Self::select(&names, &types, ColumnType::Numeric);
        let categorical = Self::select(&names, &types, ColumnType::Categorical);

        self.scaler = StandardScaler::new();
        self.scaler.fit(df, &numeric)?;
        self.encoder = OneHotEncoder::new();
        self.encoder.fit(df, &categorical)?;

        debug!(
            numeric = numeric.len(),
            categorical = categorical.len(),
            outputs = self.n_features_out(),
            "Fitted column transformer"
        );

        self.feature_names_in = names;
        self.column_types = types;
        self.is_fitted = true;
        Ok(self)
    }

    /// Build the feature matrix: scaled numeric columns, then indicator columns
    pub fn transform(&self, df: &DataFrame) -> Result<Array2<f64>> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }
        if let Some(missing) = self.feature_names_in.iter().find(|c| !has_column(df, c)) {
            return Err(PricingError::MissingColumn(missing.clone()));
        }

        let n_rows = df.height();
        let mut x = Array2::<f64>::zeros((n_rows, self.n_features_out()));
        let mut offset = 0;

        for params in self.scaler.params() {
            let scaled = self.scaler.transform_column(df, params)?;
            for (row, value) in scaled.into_iter().enumerate() {
                x[[row, offset]] = value;
            }
            offset += 1;
        }

        for mapping in self.encoder.mappings() {
            let hot = self.encoder.transform_column(df, mapping)?;
            for (row, idx) in hot.into_iter().enumerate() {
                if let Some(idx) = idx {
                    x[[row, offset + idx]] = 1.0;
                }
            }
            offset += mapping.categories.len();
        }

        Ok(x)
    }

    pub fn fit_transform(&mut self, df: &DataFrame) -> Result<Array2<f64>> {
        self.fit(df)?;
        self.transform(df)
    }

    /// Select exactly the fitted input columns, in fit order.
    ///
    /// Absent numeric columns are filled with 0, absent categorical columns with
    /// nulls (which encode like an unseen category). Extra columns are dropped.
    pub fn reindex(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }

        let n_rows = df.height();
        let mut filled = Vec::new();
        let columns: Vec<Column> = self
            .feature_names_in
            .iter()
            .zip(&self.column_types)
            .map(|(name, kind)| match df.column(name) {
                Ok(col) => col.clone(),
                Err(_) => {
                    filled.push(name.as_str());
                    match kind {
                        ColumnType::Numeric => {
                            Series::new(name.as_str().into(), vec![0.0f64; n_rows]).into_column()
                        }
                        ColumnType::Categorical => {
                            Series::full_null(name.as_str().into(), n_rows, &DataType::String)
                                .into_column()
                        }
                    }
                }
            })
            .collect();

        if !filled.is_empty() {
            debug!(columns = ?filled, "Filled absent feature columns");
        }
        Ok(DataFrame::new(columns)?)
    }

    /// Columns the transformer was fitted on
    pub fn feature_names_in(&self) -> &[String] {
        &self.feature_names_in
    }

    /// Names of the output matrix columns
    pub fn feature_names_out(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .scaler
            .params()
            .iter()
            .map(|p| p.column.clone())
            .collect();
        for mapping in self.encoder.mappings() {
            names.extend(mapping.feature_names());
        }
        names
    }

    pub fn n_features_out(&self) -> usize {
        self.scaler.params().len() + self.encoder.n_outputs()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }

    fn select(names: &[String], types: &[ColumnType], kind: ColumnType) -> Vec<String> {
        names
            .iter()
            .zip(types)
            .filter(|(_, t)| **t == kind)
            .map(|(n, _)| n.clone())
            .collect()
    }
}
