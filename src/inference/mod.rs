//! Price prediction from persisted candidates
//!
//! A [`Predictor`] pairs a loaded [`CandidatePipeline`] with the feature
//! engineer in inference mode: raw listing attributes are engineered, the
//! stored group means are replayed, and the result is reindexed to the columns
//! the pipeline was fitted on before predicting.

mod listing;

pub use listing::ListingInput;

use crate::data::frame::{f64_values, has_column};
use crate::data::schema::BEDROOMS;
use crate::error::{PricingError, Result};
use crate::export::{ArtifactMetadata, ArtifactStore};
use crate::features::steps::is_supported_bedrooms;
use crate::features::FeatureEngineer;
use crate::training::CandidatePipeline;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Estimated price of one listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePrediction {
    pub price_egp: f64,
    /// Candidate that produced the estimate
    pub model: String,
    /// Bedroom count outside the range the models were trained on
    pub out_of_distribution: bool,
}

/// A loaded candidate ready to price listings
#[derive(Debug)]
pub struct Predictor {
    pipeline: CandidatePipeline,
    metadata: ArtifactMetadata,
    path: PathBuf,
    engineer: FeatureEngineer,
}

impl Predictor {
    /// Load one artifact file
    pub fn load(path: &Path) -> Result<Self> {
        let (pipeline, metadata) = ArtifactStore::load(path)?;
        let engineer = FeatureEngineer::with_target(&metadata.target_name)
            .for_inference()
            .without_group_means();

        info!(
            model = %metadata.name,
            r2 = metadata.metrics.r2,
            run_id = %metadata.run_id,
            "Loaded predictor"
        );
        Ok(Self {
            pipeline,
            metadata,
            path: path.to_path_buf(),
            engineer,
        })
    }

    /// Load the highest-scoring artifact in a models directory
    pub fn best(models_dir: &Path) -> Result<Self> {
        let (path, _) = ArtifactStore::new(models_dir).best()?;
        Self::load(&path)
    }

    pub fn metadata(&self) -> &ArtifactMetadata {
        &self.metadata
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn model_name(&self) -> &str {
        self.pipeline.name()
    }

    /// Columns the underlying pipeline expects after engineering
    pub fn feature_names(&self) -> &[String] {
        self.pipeline.feature_names_in()
    }

    /// Price every row of a raw listing table, in row order
    pub fn predict_frame(&self, raw: &DataFrame) -> Result<Vec<PricePrediction>> {
        if raw.height() == 0 {
            return Ok(Vec::new());
        }

        let out_of_distribution = out_of_distribution_flags(raw)?;
        let flagged = out_of_distribution.iter().filter(|f| **f).count();
        if flagged > 0 && !has_column(raw, BEDROOMS) {
            warn!(rows = flagged, "Listings have no bedroom count, estimates may be extrapolated");
        }

        let engineered = self.engineer.engineer(raw);
        if engineered.height() != raw.height() {
            return Err(PricingError::DataError(format!(
                "Feature engineering changed the row count from {} to {}",
                raw.height(),
                engineered.height()
            )));
        }

        let features = self.pipeline.apply_group_stats(&engineered)?;
        let prices = self.pipeline.predict(&features)?;
        if let Some(bad) = prices.iter().position(|p| !p.is_finite()) {
            return Err(PricingError::ComputationError(format!(
                "Model produced a non-finite price for row {}",
                bad
            )));
        }
        debug!(rows = prices.len(), model = self.model_name(), "Priced listings");

        Ok(prices
            .iter()
            .zip(out_of_distribution)
            .map(|(&price_egp, out_of_distribution)| PricePrediction {
                price_egp,
                model: self.metadata.name.clone(),
                out_of_distribution,
            })
            .collect())
    }

    /// Price a single listing
    pub fn predict_listing(&self, listing: &ListingInput) -> Result<PricePrediction> {
        let frame = listing.to_frame()?;
        self.predict_frame(&frame)?
            .into_iter()
            .next()
            .ok_or_else(|| PricingError::ComputationError("No prediction produced".to_string()))
    }
}

/// Rows whose raw bedroom count is missing or unsupported
fn out_of_distribution_flags(raw: &DataFrame) -> Result<Vec<bool>> {
    if !has_column(raw, BEDROOMS) {
        return Ok(vec![true; raw.height()]);
    }
    Ok(f64_values(raw, BEDROOMS)?
        .into_iter()
        .map(|b| !is_supported_bedrooms(b))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_distribution_flags() {
        let df = df!("bedrooms" => &[Some(2i64), Some(4), None, Some(3)]).unwrap();
        assert_eq!(
            out_of_distribution_flags(&df).unwrap(),
            vec![false, true, true, false]
        );

        let df = df!("area_sqm" => &[120.0]).unwrap();
        assert_eq!(out_of_distribution_flags(&df).unwrap(), vec![true]);
    }

    #[test]
    fn test_missing_models_dir() {
        let dir = tempfile::tempdir().unwrap();
        let err = Predictor::best(&dir.path().join("models")).unwrap_err();
        assert!(matches!(err, PricingError::NoTrainedModels(_)));
        assert!(err.to_string().contains("train"));
    }
}
