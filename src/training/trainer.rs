//! Train every registry candidate on one split and record how each scores

use super::metrics::RegressionMetrics;
use super::pipeline::CandidatePipeline;
use super::registry::{CandidateSpec, ModelRegistry};
use super::split::{drop_null_target, split_features_target, train_test_split};
use crate::config::{GroupStatsMode, PipelineConfig};
use crate::data::frame::take_rows;
use crate::data::DatasetLoader;
use crate::error::{PricingError, Result};
use crate::estimators::EstimatorSpec;
use crate::export::{ArtifactMetadata, ArtifactStore};
use crate::features::group_stats::fit_and_apply;
use crate::features::{FeatureEngineer, GroupMeanEncoder, GroupMeanState};
use ndarray::Array1;
use polars::prelude::*;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Result of one candidate
#[derive(Debug, Clone)]
pub struct CandidateOutcome {
    pub name: String,
    pub model_type: String,
    /// Evaluation scores, absent when the candidate failed
    pub metrics: Option<RegressionMetrics>,
    pub artifact: Option<PathBuf>,
    pub error: Option<String>,
    pub elapsed: Duration,
}

impl CandidateOutcome {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Everything a training run produced
#[derive(Debug, Clone)]
pub struct TrainingReport {
    /// UTC timestamp shared by every artifact of the run
    pub run_id: String,
    /// One entry per candidate, in registry order
    pub outcomes: Vec<CandidateOutcome>,
    pub summary_path: PathBuf,
    pub n_train: usize,
    pub n_eval: usize,
    pub n_features: usize,
}

impl TrainingReport {
    /// Successful candidate with the highest R²
    pub fn best(&self) -> Option<&CandidateOutcome> {
        self.outcomes
            .iter()
            .filter_map(|o| o.metrics.map(|m| (o, m.r2)))
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(o, _)| o)
    }

    pub fn n_succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn n_failed(&self) -> usize {
        self.outcomes.len() - self.n_succeeded()
    }
}

/// Feature tables and targets for both sides of the split
struct PreparedData {
    x_train: DataFrame,
    y_train: Array1<f64>,
    x_eval: DataFrame,
    y_eval: Array1<f64>,
    group_stats: Vec<GroupMeanState>,
}

/// Runs the registry against a dataset and persists the fitted candidates
#[derive(Debug, Clone)]
pub struct Trainer {
    config: PipelineConfig,
    registry: ModelRegistry,
    store: ArtifactStore,
}

impl Trainer {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            registry: config.registry(),
            store: ArtifactStore::new(&config.models_dir),
            config,
        })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Load the configured dataset and train on it
    pub fn run(&self) -> Result<TrainingReport> {
        let raw = DatasetLoader::new().load(&self.config.data_path)?;
        self.train(&raw)
    }

    /// Engineer, split, then fit, score and persist each candidate.
    ///
    /// A failing candidate is recorded in the report and the summary; only
    /// errors before the first candidate, or while writing the summary, abort the run.
    pub fn train(&self, raw: &DataFrame) -> Result<TrainingReport> {
        let run_id = chrono::Utc::now().format("%Y%m%dT%H%M%SZ").to_string();
        let data = self.prepare(raw)?;

        info!(
            run_id = %run_id,
            candidates = self.registry.len(),
            train_rows = data.y_train.len(),
            eval_rows = data.y_eval.len(),
            group_stats = ?self.config.group_stats,
            "Starting training run"
        );

        let outcomes: Vec<CandidateOutcome> = self
            .registry
            .iter()
            .map(|candidate| self.run_candidate(candidate, &data, &run_id))
            .collect();

        let summary_path = self.config.summary_path();
        write_summary(&outcomes, &summary_path)?;

        let report = TrainingReport {
            run_id,
            outcomes,
            summary_path,
            n_train: data.y_train.len(),
            n_eval: data.y_eval.len(),
            n_features: data.x_train.width(),
        };

        match report.best() {
            Some(best) => info!(
                model = %best.name,
                r2 = best.metrics.map(|m| m.r2),
                failed = report.n_failed(),
                "Training run finished"
            ),
            None => warn!("Training run finished without a successful candidate"),
        }
        Ok(report)
    }

    fn prepare(&self, raw: &DataFrame) -> Result<PreparedData> {
        let target = self.config.target.as_str();
        let engineered = FeatureEngineer::with_target(target)
            .without_group_means()
            .engineer(raw);
        let engineered = drop_null_target(&engineered, target)?;

        let split = train_test_split(engineered.height(), self.config.test_size, self.config.seed)?;
        let encoders = GroupMeanEncoder::standard(target);

        let (train, eval, group_stats) = match self.config.group_stats {
            GroupStatsMode::TrainOnly => {
                let mut train = take_rows(&engineered, &split.train)?;
                let mut eval = take_rows(&engineered, &split.test)?;
                let fit_on = train.clone();
                let states = fit_and_apply(&encoders, &fit_on, &mut [&mut train, &mut eval])?;
                (train, eval, states)
            }
            GroupStatsMode::FullTable => {
                let mut full = engineered.clone();
                let states = fit_and_apply(&encoders, &engineered, &mut [&mut full])?;
                (take_rows(&full, &split.train)?, take_rows(&full, &split.test)?, states)
            }
        };

        let excluded = &self.config.excluded_features;
        let (x_train, y_train) = split_features_target(&train, target, excluded)?;
        let (x_eval, y_eval) = split_features_target(&eval, target, excluded)?;

        Ok(PreparedData {
            x_train,
            y_train,
            x_eval,
            y_eval,
            group_stats,
        })
    }

    fn run_candidate(
        &self,
        candidate: &CandidateSpec,
        data: &PreparedData,
        run_id: &str,
    ) -> CandidateOutcome {
        let start = Instant::now();
        let result = self.fit_candidate(candidate, data, run_id);
        let elapsed = start.elapsed();

        match result {
            Ok((metrics, path)) => {
                info!(
                    model = %candidate.name,
                    mae = metrics.mae,
                    rmse = metrics.rmse,
                    r2 = metrics.r2,
                    secs = elapsed.as_secs_f64(),
                    "Candidate trained"
                );
                CandidateOutcome {
                    name: candidate.name.clone(),
                    model_type: candidate.estimator.kind().to_string(),
                    metrics: Some(metrics),
                    artifact: Some(path),
                    error: None,
                    elapsed,
                }
            }
            Err(e) => {
                error!(model = %candidate.name, error = %e, "Candidate failed");
                CandidateOutcome {
                    name: candidate.name.clone(),
                    model_type: candidate.estimator.kind().to_string(),
                    metrics: None,
                    artifact: None,
                    error: Some(e.to_string()),
                    elapsed,
                }
            }
        }
    }

    fn fit_candidate(
        &self,
        candidate: &CandidateSpec,
        data: &PreparedData,
        run_id: &str,
    ) -> Result<(RegressionMetrics, PathBuf)> {
        let estimator = candidate.estimator.build(self.config.seed);
        let mut pipeline = CandidatePipeline::new(&candidate.name, &self.config.target, estimator)
            .with_group_stats(data.group_stats.clone());
        pipeline.fit(&data.x_train, &data.y_train)?;

        let predictions = pipeline.predict(&data.x_eval)?;
        if let Some(bad) = predictions.iter().position(|p| !p.is_finite()) {
            return Err(PricingError::TrainingError(format!(
                "non-finite prediction {} for evaluation row {}",
                predictions[bad], bad
            )));
        }

        let metrics = RegressionMetrics::compute(&data.y_eval, &predictions)?;
        let metadata = hyperparameters(&candidate.estimator).into_iter().fold(
            ArtifactMetadata::new(&pipeline, metrics)
                .with_run_id(run_id)
                .with_n_train(data.y_train.len()),
            |meta, (k, v)| meta.add_hyperparameter(k, v),
        );

        let path = self.store.save(&pipeline, metadata)?;
        // Older artifacts go only once the new one is in place
        self.store.remove_candidate(&candidate.name, &path)?;
        Ok((metrics, path))
    }
}

/// Flatten an estimator spec into printable key/value pairs
fn hyperparameters(spec: &EstimatorSpec) -> BTreeMap<String, String> {
    match serde_json::to_value(spec) {
        Ok(serde_json::Value::Object(map)) => map
            .into_iter()
            .filter(|(k, _)| k != "type")
            .map(|(k, v)| (k, v.to_string()))
            .collect(),
        _ => BTreeMap::new(),
    }
}

/// Write the `Model, MAE, RMSE, R2, Error` table, one row per candidate
pub fn write_summary(outcomes: &[CandidateOutcome], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
    let maes: Vec<Option<f64>> = outcomes.iter().map(|o| o.metrics.map(|m| m.mae)).collect();
    let rmses: Vec<Option<f64>> = outcomes.iter().map(|o| o.metrics.map(|m| m.rmse)).collect();
    let r2s: Vec<Option<f64>> = outcomes.iter().map(|o| o.metrics.map(|m| m.r2)).collect();
    let errors: Vec<Option<&str>> = outcomes.iter().map(|o| o.error.as_deref()).collect();

    let mut summary = df!(
        "Model" => names,
        "MAE" => maes,
        "RMSE" => rmses,
        "R2" => r2s,
        "Error" => errors,
    )?;

    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut summary)?;

    info!(path = %path.display(), rows = summary.height(), "Wrote model summary");
    Ok(())
}
