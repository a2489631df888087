//! Model training
//!
//! - [`ModelRegistry`]: the named candidates compared on each run
//! - [`train_test_split`] and [`split_features_target`]: row and column splits
//! - [`CandidatePipeline`]: group statistics, preprocessing and an estimator as one unit
//! - [`Trainer`]: fits, scores and persists every candidate and writes the summary

mod metrics;
mod pipeline;
mod registry;
mod split;
mod trainer;

pub use metrics::RegressionMetrics;
pub use pipeline::CandidatePipeline;
pub use registry::{CandidateSpec, ModelRegistry};
pub use split::{drop_null_target, split_features_target, train_test_split, TrainTestSplit};
pub use trainer::{write_summary, CandidateOutcome, Trainer, TrainingReport};
