//! Apartment price estimation
//!
//! This crate turns raw apartment sale listings into a price model:
//! - Feature engineering on listing tables
//! - Preprocessing (scaling, one-hot encoding)
//! - Candidate training, evaluation and artifact persistence
//! - Prediction from the best persisted candidate
//!
//! # Modules
//!
//! ## Core ML Modules
//! - [`features`] - Ordered feature engineering steps and leakage-free group means
//! - [`preprocessing`] - Standard scaling and one-hot encoding
//! - [`estimators`] - Linear regression, random forest, gradient boosting
//! - [`training`] - Model registry, splitting, candidate pipelines, trainer
//! - [`inference`] - Price prediction from persisted artifacts
//!
//! ## Infrastructure
//! - [`data`] - Dataset loading and column names
//! - [`export`] - Artifact format and store
//! - [`config`] - Pipeline configuration
//!
//! ## Services
//! - [`cli`] - Command-line interface

// Core error handling
pub mod error;

// Core ML modules
pub mod estimators;
pub mod features;
pub mod inference;
pub mod preprocessing;
pub mod training;

// Infrastructure
pub mod config;
pub mod data;
pub mod export;

// Services
pub mod cli;

pub use error::{PricingError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{PricingError, Result};

    // Configuration
    pub use crate::config::{GroupStatsMode, PipelineConfig};

    // Data
    pub use crate::data::DatasetLoader;

    // Features
    pub use crate::features::{EngineerMode, FeatureEngineer, GroupMeanEncoder, GroupMeanState};

    // Preprocessing
    pub use crate::preprocessing::{ColumnTransformer, FeatureStats};

    // Estimators
    pub use crate::estimators::{Estimator, EstimatorSpec, Regressor};

    // Training
    pub use crate::training::{
        CandidatePipeline, CandidateSpec, ModelRegistry, RegressionMetrics, Trainer, TrainingReport,
    };

    // Export
    pub use crate::export::{ArtifactMetadata, ArtifactStore};

    // Inference
    pub use crate::inference::{ListingInput, PricePrediction, Predictor};
}
