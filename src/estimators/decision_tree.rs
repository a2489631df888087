//! CART regression tree

use crate::error::{PricingError, Result};
use ndarray::{Array1, Array2, ArrayView1};
use rand::seq::index;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Decision tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    /// Leaf node with prediction value
    Leaf { value: f64, n_samples: usize },
    /// Internal node with split
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
        impurity: f64,
    },
}

/// Regression tree split on mean squared error
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    root: Option<TreeNode>,
    /// Maximum depth
    pub max_depth: Option<usize>,
    /// Minimum samples to split
    pub min_samples_split: usize,
    /// Minimum samples in leaf
    pub min_samples_leaf: usize,
    /// Features drawn at random per node (all when None)
    pub max_features: Option<usize>,
    /// Seed for the per-node feature draw
    pub random_state: Option<u64>,
    n_features: usize,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self::new()
    }
}

/// Best split found for one node
struct SplitCandidate {
    feature_idx: usize,
    threshold: f64,
    gain: f64,
}

impl DecisionTreeRegressor {
    pub fn new() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
            random_state: None,
            n_features: 0,
        }
    }

    /// Set maximum depth
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    /// Set minimum samples to split
    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples.max(2);
        self
    }

    /// Set minimum samples in leaf
    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples.max(1);
        self
    }

    /// Set the number of features drawn per node
    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features.max(1));
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    /// Fit the tree to training data
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(PricingError::ShapeError {
                expected: format!("y length = {}", n_samples),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples == 0 {
            return Err(PricingError::TrainingError(
                "Cannot fit a tree on zero samples".to_string(),
            ));
        }

        self.n_features = n_features;
        let mut rng = ChaCha8Rng::seed_from_u64(self.random_state.unwrap_or(0));

        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0, &mut rng));

        Ok(self)
    }

    fn build_tree(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        depth: usize,
        rng: &mut ChaCha8Rng,
    ) -> TreeNode {
        let n_samples = indices.len();
        let value = indices.iter().map(|&i| y[i]).sum::<f64>() / n_samples as f64;
        let impurity = indices.iter().map(|&i| (y[i] - value).powi(2)).sum::<f64>()
            / n_samples as f64;

        let should_stop = n_samples < self.min_samples_split
            || n_samples < 2 * self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || impurity <= f64::EPSILON * value.abs().max(1.0);

        if should_stop {
            return TreeNode::Leaf { value, n_samples };
        }

        let Some(split) = self.find_best_split(x, y, indices, rng) else {
            return TreeNode::Leaf { value, n_samples };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, split.feature_idx]] <= split.threshold);

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1, rng));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1, rng));

        TreeNode::Split {
            feature_idx: split.feature_idx,
            threshold: split.threshold,
            left,
            right,
            n_samples,
            impurity,
        }
    }

    /// Scan each candidate feature once in sorted order, tracking left/right sums
    fn find_best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        indices: &[usize],
        rng: &mut ChaCha8Rng,
    ) -> Option<SplitCandidate> {
        let n_features = x.ncols();
        let n_try = self.max_features.unwrap_or(n_features).min(n_features);
        let features: Vec<usize> = if n_try < n_features {
            index::sample(rng, n_features, n_try).into_vec()
        } else {
            (0..n_features).collect()
        };

        let n = indices.len();
        let min_leaf = self.min_samples_leaf;
        // Centering keeps the running sums small for large targets
        let mean = indices.iter().map(|&i| y[i]).sum::<f64>() / n as f64;
        let total_sum: f64 = indices.iter().map(|&i| y[i] - mean).sum();
        let total_sq: f64 = indices.iter().map(|&i| (y[i] - mean).powi(2)).sum();
        let parent_sse = total_sq - total_sum * total_sum / n as f64;

        features
            .into_par_iter()
            .filter_map(|feature_idx| {
                let mut pairs: Vec<(f64, f64)> = indices
                    .iter()
                    .map(|&i| (x[[i, feature_idx]], y[i] - mean))
                    .collect();
                pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

                let mut left_sum = 0.0;
                let mut left_sq = 0.0;
                let mut best: Option<(f64, f64)> = None;

                for i in 0..n - 1 {
                    let (xi, yi) = pairs[i];
                    left_sum += yi;
                    left_sq += yi * yi;

                    let left_count = i + 1;
                    let right_count = n - left_count;
                    if left_count < min_leaf || right_count < min_leaf {
                        continue;
                    }
                    let next = pairs[i + 1].0;
                    if next <= xi {
                        continue;
                    }

                    let right_sum = total_sum - left_sum;
                    let right_sq = total_sq - left_sq;
                    let sse = (left_sq - left_sum * left_sum / left_count as f64)
                        + (right_sq - right_sum * right_sum / right_count as f64);
                    let gain = (parent_sse - sse) / n as f64;

                    if gain > best.map_or(0.0, |b| b.1) {
                        best = Some(((xi + next) / 2.0, gain));
                    }
                }

                best.map(|(threshold, gain)| SplitCandidate {
                    feature_idx,
                    threshold,
                    gain,
                })
            })
            .max_by(|a, b| {
                a.gain
                    .total_cmp(&b.gain)
                    .then_with(|| b.feature_idx.cmp(&a.feature_idx))
            })
    }

    /// Make predictions
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(PricingError::ModelNotFitted)?;
        if x.ncols() != self.n_features {
            return Err(PricingError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        Ok(x.rows()
            .into_iter()
            .map(|row| Self::predict_row(root, row))
            .collect())
    }

    fn predict_row(node: &TreeNode, row: ArrayView1<f64>) -> f64 {
        let mut node = node;
        loop {
            match node {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split {
                    feature_idx,
                    threshold,
                    left,
                    right,
                    ..
                } => {
                    node = if row[*feature_idx] <= *threshold {
                        left
                    } else {
                        right
                    };
                }
            }
        }
    }

    /// Get tree depth
    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }

    /// Get number of leaves
    pub fn n_leaves(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => count(left) + count(right),
            }
        }
        self.root.as_ref().map_or(0, count)
    }
}
