//! Named candidate models compared on every training run

use crate::error::{PricingError, Result};
use crate::estimators::{EstimatorSpec, GradientBoostingConfig, RandomForestParams};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One registry entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSpec {
    /// Display name, also the artifact file prefix
    pub name: String,
    pub estimator: EstimatorSpec,
}

impl CandidateSpec {
    pub fn new(name: impl Into<String>, estimator: EstimatorSpec) -> Self {
        Self {
            name: name.into(),
            estimator,
        }
    }
}

/// Ordered table of candidates
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRegistry {
    entries: Vec<CandidateSpec>,
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self {
            entries: Self::default_candidates(),
        }
    }
}

impl ModelRegistry {
    /// Registry with no candidates
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn from_candidates(entries: Vec<CandidateSpec>) -> Self {
        Self { entries }
    }

    /// Ordinary least squares, a 200-tree forest and 300 boosting rounds
    pub fn default_candidates() -> Vec<CandidateSpec> {
        vec![
            CandidateSpec::new("LinearRegression", EstimatorSpec::LinearRegression),
            CandidateSpec::new(
                "RandomForest",
                EstimatorSpec::RandomForest(RandomForestParams {
                    n_estimators: 200,
                    random_state: Some(42),
                    ..Default::default()
                }),
            ),
            CandidateSpec::new(
                "GradientBoosting",
                EstimatorSpec::GradientBoosting(GradientBoostingConfig {
                    n_estimators: 300,
                    learning_rate: 0.1,
                    max_depth: 6,
                    random_state: Some(42),
                    ..Default::default()
                }),
            ),
        ]
    }

    /// Add a candidate, replacing any entry with the same name in place
    pub fn with_candidate(mut self, candidate: CandidateSpec) -> Self {
        match self.entries.iter_mut().find(|c| c.name == candidate.name) {
            Some(existing) => *existing = candidate,
            None => self.entries.push(candidate),
        }
        self
    }

    /// Keep only the named candidates, in registry order
    pub fn retain_names(mut self, names: &[String]) -> Self {
        self.entries.retain(|c| names.contains(&c.name));
        self
    }

    pub fn get(&self, name: &str) -> Option<&CandidateSpec> {
        self.entries.iter().find(|c| c.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &CandidateSpec> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// At least one candidate, unique names usable as file prefixes
    pub fn validate(&self) -> Result<()> {
        if self.entries.is_empty() {
            return Err(PricingError::ConfigError(
                "At least one candidate model is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for candidate in &self.entries {
            let name = &candidate.name;
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                return Err(PricingError::ConfigError(format!(
                    "Candidate name '{}' must be non-empty and use only letters, digits, '_' or '-'",
                    name
                )));
            }
            if !seen.insert(name.as_str()) {
                return Err(PricingError::ConfigError(format!(
                    "Duplicate candidate name '{}'",
                    name
                )));
            }
        }
        Ok(())
    }
}
