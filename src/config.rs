//! Pipeline configuration

use crate::data::schema::{PRICE_EGP, PRICE_PER_SQM};
use crate::error::{PricingError, Result};
use crate::training::{CandidateSpec, ModelRegistry};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Where the group-mean features are fitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupStatsMode {
    /// Fit on the training subset only and replay on the evaluation subset
    #[default]
    TrainOnly,
    /// Fit on the whole engineered table before splitting
    FullTable,
}

/// Settings for a training run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Raw listings (CSV or JSON)
    pub data_path: PathBuf,
    /// Directory for artifacts and the summary
    pub models_dir: PathBuf,
    /// Summary file name inside `models_dir`
    pub summary_file: String,
    /// Target column
    pub target: String,
    /// Fraction of rows held out for evaluation
    pub test_size: f64,
    /// Seed for the split and the estimators
    pub seed: u64,
    pub group_stats: GroupStatsMode,
    /// Engineered columns kept out of the feature matrix
    pub excluded_features: Vec<String>,
    /// Candidates to train, in order
    pub candidates: Vec<CandidateSpec>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("data/cairo_real_estate_dataset.csv"),
            models_dir: PathBuf::from("models"),
            summary_file: "model_summary.csv".to_string(),
            target: PRICE_EGP.to_string(),
            test_size: 0.2,
            seed: 42,
            group_stats: GroupStatsMode::TrainOnly,
            excluded_features: vec![PRICE_PER_SQM.to_string()],
            candidates: ModelRegistry::default_candidates(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from a JSON file; absent fields keep their defaults
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            PricingError::ConfigError(format!("Cannot read config {}: {}", path.display(), e))
        })?;
        let config: Self = serde_json::from_str(&text).map_err(|e| {
            PricingError::ConfigError(format!("Invalid config {}: {}", path.display(), e))
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_data_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_path = path.into();
        self
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = dir.into();
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = target.into();
        self
    }

    pub fn with_test_size(mut self, test_size: f64) -> Self {
        self.test_size = test_size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_group_stats(mut self, mode: GroupStatsMode) -> Self {
        self.group_stats = mode;
        self
    }

    pub fn with_excluded_features(mut self, columns: Vec<String>) -> Self {
        self.excluded_features = columns;
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<CandidateSpec>) -> Self {
        self.candidates = candidates;
        self
    }

    /// Full path of the summary table
    pub fn summary_path(&self) -> PathBuf {
        self.models_dir.join(&self.summary_file)
    }

    /// Candidate registry built from the configured entries
    pub fn registry(&self) -> ModelRegistry {
        ModelRegistry::from_candidates(self.candidates.clone())
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PricingError::ConfigError(format!(
                "test_size must be strictly between 0 and 1, got {}",
                self.test_size
            )));
        }
        if self.target.is_empty() {
            return Err(PricingError::ConfigError("target column name is empty".to_string()));
        }
        if self.summary_file.is_empty() {
            return Err(PricingError::ConfigError("summary_file is empty".to_string()));
        }
        if self.excluded_features.contains(&self.target) {
            return Err(PricingError::ConfigError(format!(
                "target '{}' cannot also be an excluded feature",
                self.target
            )));
        }
        self.registry().validate()
    }
}
