//! Directory of persisted candidate pipelines

use super::serializer::{ArtifactEnvelope, ArtifactMetadata};
use crate::error::{PricingError, Result};
use crate::training::CandidatePipeline;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File extension of artifacts
pub const ARTIFACT_EXTENSION: &str = "bin";

/// Reads and writes `{name}_{r2_percent}.bin` artifacts in one directory
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `LinearRegression_84.31.bin`
    pub fn file_name(name: &str, r2: f64) -> String {
        format!("{}_{:.2}.{}", name, r2 * 100.0, ARTIFACT_EXTENSION)
    }

    /// Candidate name encoded in an artifact file name
    pub fn candidate_name(path: &Path) -> Option<&str> {
        let stem = path.file_stem()?.to_str()?;
        let (name, score) = stem.rsplit_once('_')?;
        score.parse::<f64>().ok().map(|_| name)
    }

    /// Write an artifact atomically: a temporary file in the same directory is renamed into place
    pub fn save(&self, pipeline: &CandidatePipeline, metadata: ArtifactMetadata) -> Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;

        let path = self.dir.join(Self::file_name(pipeline.name(), metadata.metrics.r2));
        let tmp = self.dir.join(format!(
            ".{}.tmp",
            path.file_name().and_then(|f| f.to_str()).unwrap_or("artifact")
        ));

        let bytes = ArtifactEnvelope::seal(pipeline, metadata)?.to_bytes()?;
        fs::write(&tmp, &bytes)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        info!(path = %path.display(), bytes = bytes.len(), "Saved model artifact");
        Ok(path)
    }

    /// Load and verify an artifact
    pub fn load(path: &Path) -> Result<(CandidatePipeline, ArtifactMetadata)> {
        let envelope = Self::read_envelope(path)?;
        let pipeline = envelope.open().map_err(|e| corrupt(path, e))?;
        debug!(path = %path.display(), name = %envelope.metadata.name, "Loaded model artifact");
        Ok((pipeline, envelope.metadata))
    }

    /// Verified metadata without decoding the pipeline
    pub fn read_metadata(path: &Path) -> Result<ArtifactMetadata> {
        Ok(Self::read_envelope(path)?.metadata)
    }

    fn read_envelope(path: &Path) -> Result<ArtifactEnvelope> {
        let bytes = fs::read(path)?;
        ArtifactEnvelope::from_bytes(&bytes).map_err(|e| corrupt(path, e))
    }

    /// Artifact paths in the directory, sorted by file name. A missing directory is empty.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.is_file()
                    && p.extension().and_then(|e| e.to_str()) == Some(ARTIFACT_EXTENSION)
                    && !p
                        .file_name()
                        .and_then(|f| f.to_str())
                        .map_or(true, |f| f.starts_with('.'))
            })
            .collect();
        paths.sort();
        Ok(paths)
    }

    /// Metadata for every readable artifact; unreadable files are skipped with a warning
    pub fn list_metadata(&self) -> Result<Vec<(PathBuf, ArtifactMetadata)>> {
        let mut out = Vec::new();
        for path in self.list()? {
            match Self::read_metadata(&path) {
                Ok(meta) => out.push((path, meta)),
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping unreadable artifact"),
            }
        }
        Ok(out)
    }

    /// Artifact with the highest evaluation R²
    pub fn best(&self) -> Result<(PathBuf, ArtifactMetadata)> {
        self.list_metadata()?
            .into_iter()
            .max_by(|a, b| a.1.metrics.r2.total_cmp(&b.1.metrics.r2))
            .ok_or_else(|| PricingError::NoTrainedModels(self.dir.display().to_string()))
    }

    /// Remove a candidate's artifacts other than `keep`, leaving one file per name
    pub fn remove_candidate(&self, name: &str, keep: &Path) -> Result<usize> {
        let mut removed = 0;
        for path in self.list()? {
            if Self::candidate_name(&path) == Some(name) && path != keep {
                fs::remove_file(&path)?;
                removed += 1;
            }
        }
        if removed > 0 {
            debug!(candidate = name, removed, "Removed previous artifacts");
        }
        Ok(removed)
    }
}

fn corrupt(path: &Path, err: PricingError) -> PricingError {
    PricingError::CorruptArtifact {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
