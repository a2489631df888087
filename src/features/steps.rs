//! Individual feature engineering steps

use super::group_stats::GroupMeanEncoder;
use super::{EngineerMode, FeatureStep};
use crate::data::frame::{drop_if_present, f64_values, has_column, set_column, str_values};
use crate::data::schema::*;
use crate::error::Result;
use polars::prelude::*;
use tracing::{info, warn};

/// Normalize a yes/no flag: `yes`, `true` or a numeric 1 → 1, anything else → 0.
///
/// Flags already stored as integers or booleans come through the string cast as
/// `"1"` / `"true"`.
pub fn parse_flag(value: Option<&str>) -> i64 {
    match value.map(|v| v.trim().to_ascii_lowercase()) {
        Some(v) if v == "yes" || v == "true" => 1,
        Some(v) if v.parse::<f64>().map(|n| n == 1.0).unwrap_or(false) => 1,
        _ => 0,
    }
}

/// Ordinal finishing level, higher is better. Unknown labels have no level.
pub fn finishing_level(label: &str) -> Option<i64> {
    match label.trim() {
        "Super Lux" => Some(3),
        "Lux" => Some(2),
        "Semi-finished" => Some(1),
        "Unfinished" => Some(0),
        _ => None,
    }
}

/// Whether a bedroom count lies inside the training distribution
pub fn is_supported_bedrooms(bedrooms: Option<f64>) -> bool {
    match bedrooms {
        Some(b) => SUPPORTED_BEDROOMS.iter().any(|&s| b == s as f64),
        None => false,
    }
}

/// Drops listing identifiers and dates
#[derive(Debug)]
pub struct DropIdentifiers;

impl FeatureStep for DropIdentifiers {
    fn name(&self) -> &'static str {
        "drop_identifiers"
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let mut out = df.clone();
        for col in IDENTIFIER_COLUMNS {
            drop_if_present(&mut out, col)?;
        }
        Ok(out)
    }
}

/// Replaces missing compound names with the "Unknown" sentinel
#[derive(Debug)]
pub struct FillCompound;

impl FeatureStep for FillCompound {
    fn name(&self) -> &'static str {
        "fill_compound"
    }

    fn requires(&self) -> Vec<&str> {
        vec![COMPOUND_NAME]
    }

    fn produces(&self) -> Option<&str> {
        Some(COMPOUND_NAME)
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let filled: Vec<String> = str_values(df, COMPOUND_NAME)?
            .into_iter()
            .map(|v| v.unwrap_or_else(|| UNKNOWN_COMPOUND.to_string()))
            .collect();

        let mut out = df.clone();
        set_column(&mut out, Series::new(COMPOUND_NAME.into(), filled))?;
        Ok(out)
    }
}

/// Turns yes/no flag columns into 0/1 integers
#[derive(Debug)]
pub struct NormalizeFlags;

impl FeatureStep for NormalizeFlags {
    fn name(&self) -> &'static str {
        "normalize_flags"
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let mut out = df.clone();
        for col in FLAG_COLUMNS {
            if !has_column(df, col) {
                continue;
            }
            let values: Vec<i64> = str_values(df, col)?
                .iter()
                .map(|v| parse_flag(v.as_deref()))
                .collect();
            set_column(&mut out, Series::new(col.into(), values))?;
        }
        Ok(out)
    }
}

/// Keeps only 2- and 3-bedroom listings.
///
/// The models are trained on this slice of the market only. At inference the row is kept
/// and a warning is logged instead, since a 1-bedroom or 4+-bedroom prediction is
/// an extrapolation.
#[derive(Debug)]
pub struct BedroomFilter;

impl FeatureStep for BedroomFilter {
    fn name(&self) -> &'static str {
        "bedroom_filter"
    }

    fn requires(&self) -> Vec<&str> {
        vec![BEDROOMS]
    }

    fn apply(&self, df: &DataFrame, mode: EngineerMode) -> Result<DataFrame> {
        let bedrooms = f64_values(df, BEDROOMS)?;
        let keep: Vec<bool> = bedrooms.iter().map(|&b| is_supported_bedrooms(b)).collect();
        let dropped = keep.iter().filter(|k| !**k).count();

        if dropped == 0 {
            return Ok(df.clone());
        }

        match mode {
            EngineerMode::Training => {
                let mask: BooleanChunked = keep.into_iter().map(Some).collect();
                let out = df.filter(&mask)?;
                info!(
                    dropped,
                    kept = out.height(),
                    "Filtered listings outside the 2-3 bedroom range"
                );
                Ok(out)
            }
            EngineerMode::Inference => {
                warn!(
                    rows = dropped,
                    "Listing bedroom count is outside the 2-3 bedroom training range; prediction is an extrapolation"
                );
                Ok(df.clone())
            }
        }
    }
}

/// Maps the finishing label to an ordinal level and drops the label
#[derive(Debug)]
pub struct EncodeFinishing;

impl FeatureStep for EncodeFinishing {
    fn name(&self) -> &'static str {
        "encode_finishing"
    }

    fn requires(&self) -> Vec<&str> {
        vec![FINISHING_TYPE]
    }

    fn produces(&self) -> Option<&str> {
        Some(FINISHING_TYPE_ENCODED)
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let labels = str_values(df, FINISHING_TYPE)?;
        let levels: Vec<Option<i64>> = labels
            .iter()
            .map(|v| v.as_deref().and_then(finishing_level))
            .collect();

        let unrecognized = levels.iter().filter(|l| l.is_none()).count();
        if unrecognized > 0 {
            warn!(rows = unrecognized, "Unrecognized finishing type left without a level");
        }

        let mut out = df.clone();
        set_column(&mut out, Series::new(FINISHING_TYPE_ENCODED.into(), levels))?;
        drop_if_present(&mut out, FINISHING_TYPE)?;
        Ok(out)
    }
}

/// Price divided by area. Needs the target, so it only exists at training time.
#[derive(Debug)]
pub struct PricePerSqm {
    pub target: String,
}

impl FeatureStep for PricePerSqm {
    fn name(&self) -> &'static str {
        "price_per_sqm"
    }

    fn requires(&self) -> Vec<&str> {
        vec![self.target.as_str(), AREA_SQM]
    }

    fn produces(&self) -> Option<&str> {
        Some(PRICE_PER_SQM)
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let price = f64_values(df, &self.target)?;
        let area = f64_values(df, AREA_SQM)?;
        let ratio: Vec<Option<f64>> = price
            .iter()
            .zip(area.iter())
            .map(|(p, a)| match (p, a) {
                (Some(p), Some(a)) if *a > 0.0 => Some(p / a),
                _ => None,
            })
            .collect();

        let mut out = df.clone();
        set_column(&mut out, Series::new(PRICE_PER_SQM.into(), ratio))?;
        Ok(out)
    }
}

/// Sum of the distances to the university, the mall and the metro
#[derive(Debug)]
pub struct ProximityScore;

impl FeatureStep for ProximityScore {
    fn name(&self) -> &'static str {
        "proximity_score"
    }

    fn requires(&self) -> Vec<&str> {
        DISTANCE_COLUMNS.to_vec()
    }

    fn produces(&self) -> Option<&str> {
        Some(PROXIMITY_SCORE)
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let columns = DISTANCE_COLUMNS
            .iter()
            .map(|c| f64_values(df, c))
            .collect::<Result<Vec<_>>>()?;

        let score: Vec<Option<f64>> = (0..df.height())
            .map(|row| {
                columns
                    .iter()
                    .map(|col| col[row])
                    .sum::<Option<f64>>()
            })
            .collect();

        let mut out = df.clone();
        set_column(&mut out, Series::new(PROXIMITY_SCORE.into(), score))?;
        Ok(out)
    }
}

/// Broadcasts the mean target of each group back onto its rows, computed over the
/// table being engineered
#[derive(Debug)]
pub struct GroupMean {
    name: &'static str,
    encoder: GroupMeanEncoder,
}

impl GroupMean {
    pub fn new(name: &'static str, encoder: GroupMeanEncoder) -> Self {
        Self { name, encoder }
    }
}

impl FeatureStep for GroupMean {
    fn name(&self) -> &'static str {
        self.name
    }

    fn requires(&self) -> Vec<&str> {
        vec![self.encoder.key(), self.encoder.target()]
    }

    fn produces(&self) -> Option<&str> {
        Some(self.encoder.output())
    }

    fn is_group_statistic(&self) -> bool {
        true
    }

    fn apply(&self, df: &DataFrame, _mode: EngineerMode) -> Result<DataFrame> {
        let state = self.encoder.fit(df)?;
        state.transform(df)
    }
}
