//! One-hot encoding of categorical columns

use crate::data::frame::str_values;
use crate::error::{PricingError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Categories seen for one column during fit, sorted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryMapping {
    pub column: String,
    pub categories: Vec<String>,
}

impl CategoryMapping {
    /// Output feature names, `{column}_{category}`
    pub fn feature_names(&self) -> impl Iterator<Item = String> + '_ {
        self.categories
            .iter()
            .map(move |c| format!("{}_{}", self.column, c))
    }

    fn index_of(&self, value: &str) -> Option<usize> {
        self.categories
            .binary_search_by(|c| c.as_str().cmp(value))
            .ok()
    }
}

/// One-hot encoder that ignores unknown categories.
///
/// A value not seen during fit (or a null) encodes as all-zero indicators.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OneHotEncoder {
    mappings: Vec<CategoryMapping>,
    is_fitted: bool,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learn the categories of each column
    pub fn fit(&mut self, df: &DataFrame, columns: &[String]) -> Result<&mut Self> {
        self.mappings = columns
            .iter()
            .map(|name| {
                let mut categories: Vec<String> =
                    str_values(df, name)?.into_iter().flatten().collect();
                categories.sort();
                categories.dedup();
                Ok::<_, PricingError>(CategoryMapping {
                    column: name.clone(),
                    categories,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        self.is_fitted = true;
        Ok(self)
    }

    /// Index of the hot category per row, `None` for unknown or null values
    pub fn transform_column(
        &self,
        df: &DataFrame,
        mapping: &CategoryMapping,
    ) -> Result<Vec<Option<usize>>> {
        if !self.is_fitted {
            return Err(PricingError::ModelNotFitted);
        }

        let values = str_values(df, &mapping.column)?;
        let mut unknown = 0usize;
        let indices: Vec<Option<usize>> = values
            .iter()
            .map(|v| {
                let idx = v.as_deref().and_then(|v| mapping.index_of(v));
                if idx.is_none() && v.is_some() {
                    unknown += 1;
                }
                idx
            })
            .collect();

        if unknown > 0 {
            warn!(
                column = %mapping.column,
                rows = unknown,
                "Unknown categories encoded as all-zero indicators"
            );
        }
        Ok(indices)
    }

    pub fn mappings(&self) -> &[CategoryMapping] {
        &self.mappings
    }

    /// Total number of indicator columns
    pub fn n_outputs(&self) -> usize {
        self.mappings.iter().map(|m| m.categories.len()).sum()
    }

    pub fn is_fitted(&self) -> bool {
        self.is_fitted
    }
}
