//! Error types for the apartment pricing pipeline

use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, PricingError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum PricingError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Target column '{0}' is missing from the table")]
    MissingTarget(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Computation error: {0}")]
    ComputationError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Invalid parameter: {name} = {value}, {reason}")]
    InvalidParameter {
        name: String,
        value: String,
        reason: String,
    },

    #[error("Corrupt artifact {path}: {reason}")]
    CorruptArtifact { path: String, reason: String },

    #[error("No trained models found in '{0}'. Train a model first with `aptprice train`.")]
    NoTrainedModels(String),
}

impl PricingError {
    /// True for errors caused by an absent column (the schema error class)
    pub fn is_schema_error(&self) -> bool {
        matches!(self, PricingError::MissingColumn(_) | PricingError::MissingTarget(_))
    }
}

impl From<polars::error::PolarsError> for PricingError {
    fn from(err: polars::error::PolarsError) -> Self {
        PricingError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for PricingError {
    fn from(err: serde_json::Error) -> Self {
        PricingError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for PricingError {
    fn from(err: bincode::Error) -> Self {
        PricingError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for PricingError {
    fn from(err: ndarray::ShapeError) -> Self {
        PricingError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
