//! Binary artifact format
//!
//! An artifact is a bincode-encoded [`ArtifactEnvelope`]: magic bytes, a format
//! version, human-readable metadata and the bincode payload of the fitted
//! pipeline, protected by an FNV-1a checksum.

use crate::error::{PricingError, Result};
use crate::training::{CandidatePipeline, RegressionMetrics};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Description of a persisted candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Candidate name
    pub name: String,
    /// Estimator family
    pub model_type: String,
    /// Identifier of the training run that produced the artifact
    pub run_id: String,
    /// RFC 3339 timestamp
    pub trained_at: String,
    pub metrics: RegressionMetrics,
    /// Columns the pipeline expects, in order
    pub feature_names: Vec<String>,
    pub target_name: String,
    pub n_train: usize,
    pub hyperparameters: BTreeMap<String, String>,
}

impl ArtifactMetadata {
    pub fn new(pipeline: &CandidatePipeline, metrics: RegressionMetrics) -> Self {
        Self {
            name: pipeline.name().to_string(),
            model_type: pipeline.estimator().kind().to_string(),
            run_id: String::new(),
            trained_at: chrono::Utc::now().to_rfc3339(),
            metrics,
            feature_names: pipeline.feature_names_in().to_vec(),
            target_name: pipeline.target().to_string(),
            n_train: 0,
            hyperparameters: BTreeMap::new(),
        }
    }

    /// Set run id
    pub fn with_run_id(mut self, run_id: impl Into<String>) -> Self {
        self.run_id = run_id.into();
        self
    }

    /// Set the number of training rows
    pub fn with_n_train(mut self, n_train: usize) -> Self {
        self.n_train = n_train;
        self
    }

    /// Add hyperparameter
    pub fn add_hyperparameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.hyperparameters.insert(key.into(), value.into());
        self
    }
}

/// On-disk wrapper around a serialized pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactEnvelope {
    /// Magic bytes for format detection
    pub magic: [u8; 4],
    /// Format version
    pub format_version: u32,
    pub metadata: ArtifactMetadata,
    /// bincode-encoded [`CandidatePipeline`]
    pub payload: Vec<u8>,
    /// Checksum for integrity verification
    pub checksum: u64,
}

impl ArtifactEnvelope {
    /// Magic bytes for apartment pricing artifacts
    pub const MAGIC: [u8; 4] = *b"APRC";
    /// Current format version
    pub const VERSION: u32 = 1;

    /// Wrap a pipeline
    pub fn seal(pipeline: &CandidatePipeline, metadata: ArtifactMetadata) -> Result<Self> {
        let payload = bincode::serialize(pipeline)?;
        let checksum = compute_checksum(&payload);
        Ok(Self {
            magic: Self::MAGIC,
            format_version: Self::VERSION,
            metadata,
            payload,
            checksum,
        })
    }

    /// Encode the envelope itself
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    /// Decode and validate magic, version and checksum
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 4 || bytes[..4] != Self::MAGIC {
            return Err(PricingError::SerializationError(
                "not an apartment pricing artifact (bad magic bytes)".to_string(),
            ));
        }

        let envelope: Self = bincode::deserialize(bytes)?;
        if envelope.format_version != Self::VERSION {
            return Err(PricingError::SerializationError(format!(
                "unsupported artifact format version {} (expected {})",
                envelope.format_version,
                Self::VERSION
            )));
        }
        if !envelope.verify_checksum() {
            return Err(PricingError::SerializationError(
                "checksum verification failed, file may be corrupted".to_string(),
            ));
        }
        Ok(envelope)
    }

    /// Verify checksum
    pub fn verify_checksum(&self) -> bool {
        compute_checksum(&self.payload) == self.checksum
    }

    /// Decode the pipeline
    pub fn open(&self) -> Result<CandidatePipeline> {
        Ok(bincode::deserialize(&self.payload)?)
    }
}

/// FNV-1a hash
fn compute_checksum(data: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 14695981039346656037;
    const FNV_PRIME: u64 = 1099511628211;

    data.iter().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ *byte as u64).wrapping_mul(FNV_PRIME)
    })
}
