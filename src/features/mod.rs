//! Feature engineering for raw listing tables.
//!
//! The engineer is an ordered list of named [`FeatureStep`]s. A step whose input
//! columns are missing is skipped, so the same engineer runs on full training
//! tables and on single listings submitted for prediction.

pub mod group_stats;
pub mod steps;

pub use group_stats::{GroupMeanEncoder, GroupMeanState};

use crate::data::frame::has_columns;
use crate::data::schema::PRICE_EGP;
use crate::error::Result;
use polars::prelude::*;
use steps::*;
use tracing::{debug, info, warn};

/// Whether the engineer prepares training data or a listing to be priced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineerMode {
    /// Out-of-range rows are removed
    #[default]
    Training,
    /// Every row is kept, out-of-range rows are only reported
    Inference,
}

/// One named transformation of the listing table
pub trait FeatureStep: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    /// Columns that must all be present for the step to run
    fn requires(&self) -> Vec<&str> {
        Vec::new()
    }

    /// Column written by the step, if any
    fn produces(&self) -> Option<&str> {
        None
    }

    /// Whether the step aggregates the target across rows
    fn is_group_statistic(&self) -> bool {
        false
    }

    fn apply(&self, df: &DataFrame, mode: EngineerMode) -> Result<DataFrame>;
}

/// Raw listings → modeling-ready table
#[derive(Debug)]
pub struct FeatureEngineer {
    steps: Vec<Box<dyn FeatureStep>>,
    mode: EngineerMode,
}

impl Default for FeatureEngineer {
    fn default() -> Self {
        Self::new()
    }
}

impl FeatureEngineer {
    /// Full step list for the default `price_egp` target
    pub fn new() -> Self {
        Self::with_target(PRICE_EGP)
    }

    /// Full step list for a custom target column
    pub fn with_target(target: &str) -> Self {
        let steps: Vec<Box<dyn FeatureStep>> = vec![
            Box::new(DropIdentifiers),
            Box::new(FillCompound),
            Box::new(NormalizeFlags),
            Box::new(BedroomFilter),
            Box::new(EncodeFinishing),
            Box::new(PricePerSqm {
                target: target.to_string(),
            }),
            Box::new(ProximityScore),
            Box::new(GroupMean::new(
                "district_avg_price",
                GroupMeanEncoder::district(target),
            )),
            Box::new(GroupMean::new(
                "compound_quality_score",
                GroupMeanEncoder::compound(target),
            )),
        ];
        Self {
            steps,
            mode: EngineerMode::Training,
        }
    }

    /// Switch to inference mode
    pub fn for_inference(mut self) -> Self {
        self.mode = EngineerMode::Inference;
        self
    }

    /// Remove the group-mean steps; the caller fits them separately on the training rows
    pub fn without_group_means(mut self) -> Self {
        self.steps.retain(|s| !s.is_group_statistic());
        self
    }

    pub fn mode(&self) -> EngineerMode {
        self.mode
    }

    /// Names of the steps, in order
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every applicable step.
    ///
    /// Never fails: a step that errors is logged and skipped, leaving the table as it was.
    pub fn engineer(&self, raw: &DataFrame) -> DataFrame {
        let rows_in = raw.height();
        let mut df = raw.clone();

        for step in &self.steps {
            let required = step.requires();
            if !has_columns(&df, &required) {
                debug!(
                    step = step.name(),
                    ?required,
                    output = ?step.produces(),
                    "Skipping feature step, inputs missing"
                );
                continue;
            }
            match step.apply(&df, self.mode) {
                Ok(next) => {
                    debug!(step = step.name(), output = ?step.produces(), "Applied feature step");
                    df = next;
                }
                Err(e) => warn!(step = step.name(), error = %e, "Feature step failed, skipped"),
            }
        }

        info!(
            rows_in,
            rows_out = df.height(),
            columns = df.width(),
            "Engineered features"
        );
        df
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::frame::{f64_values, has_column};
    use crate::data::schema::*;

    fn raw() -> DataFrame {
        df!(
            LISTING_ID => &[1i64, 2, 3],
            BEDROOMS => &[3i64, 2, 4],
            DISTRICT => &["Rehab", "Rehab", "Maadi"],
            PRICE_EGP => &[1_000_000.0, 1_200_000.0, 3_000_000.0],
            AREA_SQM => &[150.0, 160.0, 250.0],
        )
        .unwrap()
    }

    #[test]
    fn test_step_order() {
        let names = FeatureEngineer::new().step_names();
        assert_eq!(names.first(), Some(&"drop_identifiers"));
        assert_eq!(names.last(), Some(&"compound_quality_score"));
        assert_eq!(names.len(), 9);
        assert_eq!(FeatureEngineer::new().without_group_means().step_names().len(), 7);
    }

    #[test]
    fn test_district_mean_over_surviving_rows() {
        let out = FeatureEngineer::new().engineer(&raw());
        assert_eq!(out.height(), 2);
        assert!(!has_column(&out, LISTING_ID));
        assert_eq!(
            f64_values(&out, DISTRICT_AVG_PRICE).unwrap(),
            vec![Some(1_100_000.0), Some(1_100_000.0)]
        );
    }

    #[test]
    fn test_applied_steps_write_their_output() {
        let mut full = raw();
        full.with_column(Column::new(FINISHING_TYPE.into(), &["Lux", "Super Lux", "Lux"])).unwrap();
        full.with_column(Column::new(COMPOUND_NAME.into(), &[Some("B1"), None, Some("Zed")])).unwrap();
        for col in [DISTANCE_TO_AUC_KM, DISTANCE_TO_MALL_KM, DISTANCE_TO_METRO_KM] {
            full.with_column(Column::new(col.into(), &[1.0, 2.0, 3.0])).unwrap();
        }

        let engineer = FeatureEngineer::new();
        let out = engineer.engineer(&full);
        for step in &engineer.steps {
            if let Some(output) = step.produces() {
                assert!(has_column(&out, output), "{} did not write {}", step.name(), output);
            }
        }
    }

    #[test]
    fn test_skips_steps_without_inputs() {
        let df = df!(BEDROOMS => &[2i64]).unwrap();
        let out = FeatureEngineer::new().engineer(&df);
        assert_eq!(out.width(), 1);
        assert!(!has_column(&out, PROXIMITY_SCORE));
    }
}
