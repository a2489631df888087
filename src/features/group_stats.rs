//! Group-mean target encoding.
//!
//! `district_avg_price` and `compound_quality_score` are the mean sale price of all
//! listings sharing a district or compound. Fitting on the training rows only and
//! applying the stored means to the evaluation rows keeps the evaluation target out
//! of the features.

use crate::data::frame::{f64_values, has_columns, set_column, str_values};
use crate::data::schema::{COMPOUND_NAME, COMPOUND_QUALITY_SCORE, DISTRICT, DISTRICT_AVG_PRICE};
use crate::error::{PricingError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Computes the mean of `target` per value of `key`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupMeanEncoder {
    key: String,
    target: String,
    output: String,
}

impl GroupMeanEncoder {
    pub fn new(key: impl Into<String>, target: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target: target.into(),
            output: output.into(),
        }
    }

    /// Mean price per district
    pub fn district(target: &str) -> Self {
        Self::new(DISTRICT, target, DISTRICT_AVG_PRICE)
    }

    /// Mean price per compound
    pub fn compound(target: &str) -> Self {
        Self::new(COMPOUND_NAME, target, COMPOUND_QUALITY_SCORE)
    }

    /// The two encoders every pipeline uses
    pub fn standard(target: &str) -> Vec<Self> {
        vec![Self::district(target), Self::compound(target)]
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn output(&self) -> &str {
        &self.output
    }

    /// Learn per-group means. Rows with a null key or a null target are skipped.
    pub fn fit(&self, df: &DataFrame) -> Result<GroupMeanState> {
        if !has_columns(df, &[&self.key, &self.target]) {
            let missing = if has_columns(df, &[&self.key]) {
                &self.target
            } else {
                &self.key
            };
            return Err(PricingError::MissingColumn(missing.clone()));
        }

        let keys = str_values(df, &self.key)?;
        let values = f64_values(df, &self.target)?;

        let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
        let mut total = 0.0;
        let mut count = 0usize;

        for (key, value) in keys.into_iter().zip(values) {
            let Some(value) = value else { continue };
            total += value;
            count += 1;
            if let Some(key) = key {
                let entry = sums.entry(key).or_insert((0.0, 0));
                entry.0 += value;
                entry.1 += 1;
            }
        }

        let means: BTreeMap<String, f64> = sums
            .into_iter()
            .map(|(k, (sum, n))| (k, sum / n as f64))
            .collect();
        let fallback = if count > 0 { total / count as f64 } else { 0.0 };

        debug!(
            key = %self.key,
            groups = means.len(),
            fallback,
            "Fitted group means"
        );

        Ok(GroupMeanState {
            key: self.key.clone(),
            output: self.output.clone(),
            means,
            fallback,
        })
    }
}

/// Fitted group means, applied to any table with the key column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMeanState {
    pub key: String,
    pub output: String,
    pub means: BTreeMap<String, f64>,
    /// Used for unseen or missing keys: the mean over all fitted rows.
    ///
    /// A row with a null key gets this value too, including rows of the table the
    /// state was fitted on, so every row carries a finite group mean. It is not the
    /// mean of any single group.
    pub fallback: f64,
}

impl GroupMeanState {
    /// Mean for one key value; `None` and unseen keys get `fallback`
    pub fn mean_for(&self, key: Option<&str>) -> f64 {
        key.and_then(|k| self.means.get(k).copied())
            .unwrap_or(self.fallback)
    }

    /// Add the output column to `df`
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        let keys = str_values(df, &self.key)?;
        let unseen = keys
            .iter()
            .filter(|k| k.as_deref().map_or(true, |k| !self.means.contains_key(k)))
            .count();
        if unseen > 0 {
            debug!(key = %self.key, rows = unseen, "Unseen group keys use the overall mean");
        }

        let values: Vec<f64> = keys.iter().map(|k| self.mean_for(k.as_deref())).collect();

        let mut out = df.clone();
        set_column(&mut out, Series::new(self.output.as_str().into(), values))?;
        Ok(out)
    }
}

/// Fit every encoder whose key column is present and apply it to each table
pub fn fit_and_apply(
    encoders: &[GroupMeanEncoder],
    fit_on: &DataFrame,
    tables: &mut [&mut DataFrame],
) -> Result<Vec<GroupMeanState>> {
    let mut states = Vec::with_capacity(encoders.len());
    for encoder in encoders {
        if !has_columns(fit_on, &[encoder.key(), encoder.target()]) {
            debug!(key = encoder.key(), "Skipping group mean, key or target absent");
            continue;
        }
        let state = encoder.fit(fit_on)?;
        for table in tables.iter_mut() {
            if has_columns(&**table, &[encoder.key()]) {
                let transformed = state.transform(&**table)?;
                **table = transformed;
            }
        }
        states.push(state);
    }
    Ok(states)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::PRICE_EGP;

    fn listings() -> DataFrame {
        df!(
            DISTRICT => &[Some("Rehab"), Some("Rehab"), Some("Maadi"), None],
            PRICE_EGP => &[Some(100.0), Some(200.0), Some(400.0), Some(300.0)],
        )
        .unwrap()
    }

    #[test]
    fn test_fit_means() {
        let state = GroupMeanEncoder::district(PRICE_EGP).fit(&listings()).unwrap();
        assert_eq!(state.means.get("Rehab"), Some(&150.0));
        assert_eq!(state.means.get("Maadi"), Some(&400.0));
        assert_eq!(state.fallback, 250.0);
        assert_eq!(state.mean_for(Some("Zamalek")), 250.0);
        assert_eq!(state.mean_for(None), 250.0);
    }

    #[test]
    fn test_transform_unseen_key() {
        let state = GroupMeanEncoder::district(PRICE_EGP).fit(&listings()).unwrap();
        let eval = df!(DISTRICT => &["Maadi", "New Cairo"]).unwrap();
        let out = state.transform(&eval).unwrap();
        let values = f64_values(&out, DISTRICT_AVG_PRICE).unwrap();
        assert_eq!(values, vec![Some(400.0), Some(250.0)]);
    }

    #[test]
    fn test_null_key_in_fitted_table_gets_overall_mean() {
        let df = listings();
        let out = GroupMeanEncoder::district(PRICE_EGP).fit(&df).unwrap().transform(&df).unwrap();
        let values = f64_values(&out, DISTRICT_AVG_PRICE).unwrap();
        assert_eq!(values, vec![Some(150.0), Some(150.0), Some(400.0), Some(250.0)]);
    }

    #[test]
    fn test_fit_missing_target() {
        let df = df!(DISTRICT => &["Rehab"]).unwrap();
        let result = GroupMeanEncoder::district(PRICE_EGP).fit(&df);
        assert!(matches!(result, Err(PricingError::MissingColumn(c)) if c == PRICE_EGP));
    }

    #[test]
    fn test_null_targets_skipped() {
        let df = df!(
            DISTRICT => &["Rehab", "Rehab"],
            PRICE_EGP => &[Some(100.0), None],
        )
        .unwrap();
        let state = GroupMeanEncoder::district(PRICE_EGP).fit(&df).unwrap();
        assert_eq!(state.means.get("Rehab"), Some(&100.0));
    }
}
