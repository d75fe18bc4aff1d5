//! Gradient-boosted regression trees over lagged features.
//!
//! Squared loss, constant learning rate, depth-limited greedy trees fit to
//! residuals. Fully deterministic: features are scanned in order and split
//! ties resolve first-seen. This family skips hyperparameter tuning: it
//! runs with a fixed, externally supplied parameter set, and a validation
//! partition is only monitored, never used for early stopping.

use log::{debug, info};

use crate::error::{ForecastError, Result};
use crate::features::{FeatureTable, FeatureVector};
use crate::split::score;

/// Hyperparameters for the boosted-tree family.
#[derive(Debug, Clone, PartialEq)]
pub struct GradientBoostParams {
    /// Number of boosting rounds
    pub rounds: usize,
    /// Maximum tree depth
    pub max_depth: usize,
    /// Shrinkage applied to each tree's contribution
    pub learning_rate: f64,
    /// Minimum rows per leaf
    pub min_samples_leaf: usize,
}

impl Default for GradientBoostParams {
    fn default() -> Self {
        Self {
            rounds: 100,
            max_depth: 3,
            learning_rate: 0.1,
            min_samples_leaf: 2,
        }
    }
}

/// Gradient-boosting model ready to fit
#[derive(Debug, Clone)]
pub struct GradientBoostModel {
    name: String,
    params: GradientBoostParams,
}

/// Trained gradient-boosting model
#[derive(Debug, Clone)]
pub struct TrainedGradientBoost {
    name: String,
    base: f64,
    learning_rate: f64,
    trees: Vec<TreeNode>,
    lag_depth: usize,
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, lags: &[f64]) -> f64 {
        match self {
            TreeNode::Leaf { value } => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if lags[*feature] <= *threshold {
                    left.predict(lags)
                } else {
                    right.predict(lags)
                }
            }
        }
    }
}

impl GradientBoostModel {
    /// Create a new gradient-boosting model, validating the parameter set.
    pub fn new(params: GradientBoostParams) -> Result<Self> {
        if params.rounds == 0 {
            return Err(ForecastError::InvalidParameter(
                "rounds must be positive".to_string(),
            ));
        }
        if params.max_depth == 0 {
            return Err(ForecastError::InvalidParameter(
                "max_depth must be positive".to_string(),
            ));
        }
        if params.learning_rate <= 0.0 || params.learning_rate > 1.0 {
            return Err(ForecastError::InvalidParameter(
                "learning_rate must lie in (0, 1]".to_string(),
            ));
        }
        if params.min_samples_leaf == 0 {
            return Err(ForecastError::InvalidParameter(
                "min_samples_leaf must be positive".to_string(),
            ));
        }

        Ok(Self {
            name: format!(
                "Gradient Boost (rounds={}, depth={}, lr={})",
                params.rounds, params.max_depth, params.learning_rate
            ),
            params,
        })
    }

    /// Fit boosted trees on the table; `validation` rows are only monitored.
    pub fn fit(
        &self,
        table: &FeatureTable,
        validation: Option<&FeatureTable>,
    ) -> Result<TrainedGradientBoost> {
        let rows = table.rows();
        if rows.is_empty() {
            return Err(ForecastError::InsufficientHistory(
                "Gradient boost fit needs a non-empty training table".to_string(),
            ));
        }

        let features: Vec<&[f64]> = rows.iter().map(|r| r.lags.as_slice()).collect();
        let labels: Vec<f64> = rows.iter().map(|r| r.label).collect();
        let n = labels.len();

        let base = labels.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base; n];
        let mut trees = Vec::with_capacity(self.params.rounds);

        let all_indices: Vec<usize> = (0..n).collect();
        for round in 0..self.params.rounds {
            let residuals: Vec<f64> = labels
                .iter()
                .zip(predictions.iter())
                .map(|(&y, &p)| y - p)
                .collect();

            let tree = grow_tree(&features, &residuals, &all_indices, 0, &self.params);
            for (i, pred) in predictions.iter_mut().enumerate() {
                *pred += self.params.learning_rate * tree.predict(features[i]);
            }
            trees.push(tree);

            if let Some(val) = validation {
                if (round + 1) % 10 == 0 || round + 1 == self.params.rounds {
                    let partial = TrainedGradientBoost {
                        name: self.name.clone(),
                        base,
                        learning_rate: self.params.learning_rate,
                        trees: trees.clone(),
                        lag_depth: table.lag_depth(),
                    };
                    if let Ok(preds) = partial.predict(&val.feature_vectors()) {
                        if let Ok(acc) = score(&val.labels(), &preds) {
                            debug!("round {}: validation {}", round + 1, acc);
                        }
                    }
                }
            }
        }

        let trained = TrainedGradientBoost {
            name: self.name.clone(),
            base,
            learning_rate: self.params.learning_rate,
            trees,
            lag_depth: table.lag_depth(),
        };

        if let Some(val) = validation {
            if !val.is_empty() {
                let preds = trained.predict(&val.feature_vectors())?;
                let acc = score(&val.labels(), &preds)?;
                info!("{}: final validation {}", trained.name, acc);
            }
        }

        Ok(trained)
    }

    /// Name of the model
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl TrainedGradientBoost {
    /// Predict one value per input lag vector; dates are ignored by this family.
    pub fn predict(&self, inputs: &[FeatureVector]) -> Result<Vec<f64>> {
        for fv in inputs {
            if fv.lags.len() != self.lag_depth {
                return Err(ForecastError::ValidationError(format!(
                    "Expected {} lag features, got {}",
                    self.lag_depth,
                    fv.lags.len()
                )));
            }
        }

        Ok(inputs
            .iter()
            .map(|fv| {
                let boost: f64 = self.trees.iter().map(|t| t.predict(&fv.lags)).sum();
                self.base + self.learning_rate * boost
            })
            .collect())
    }

    /// Name of the model
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn leaf(residuals: &[f64], indices: &[usize]) -> TreeNode {
    let mean = indices.iter().map(|&i| residuals[i]).sum::<f64>() / indices.len() as f64;
    TreeNode::Leaf { value: mean }
}

fn grow_tree(
    features: &[&[f64]],
    residuals: &[f64],
    indices: &[usize],
    depth: usize,
    params: &GradientBoostParams,
) -> TreeNode {
    if depth >= params.max_depth || indices.len() < 2 * params.min_samples_leaf {
        return leaf(residuals, indices);
    }

    match best_split(features, residuals, indices, params.min_samples_leaf) {
        None => leaf(residuals, indices),
        Some((feature, threshold)) => {
            let (left, right): (Vec<usize>, Vec<usize>) = indices
                .iter()
                .copied()
                .partition(|&i| features[i][feature] <= threshold);
            TreeNode::Split {
                feature,
                threshold,
                left: Box::new(grow_tree(features, residuals, &left, depth + 1, params)),
                right: Box::new(grow_tree(features, residuals, &right, depth + 1, params)),
            }
        }
    }
}

/// Greedy best split by summed squared error, strict improvement only.
fn best_split(
    features: &[&[f64]],
    residuals: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let total: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let total_sq: f64 = indices.iter().map(|&i| residuals[i].powi(2)).sum();
    let parent_sse = total_sq - total.powi(2) / n as f64;

    let lag_depth = features[indices[0]].len();
    let mut best: Option<(usize, f64)> = None;
    let mut best_sse = parent_sse;

    for feature in 0..lag_depth {
        let mut ordered: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (features[i][feature], residuals[i]))
            .collect();
        ordered.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        let mut left_sq = 0.0;
        for pos in 0..n - 1 {
            left_sum += ordered[pos].1;
            left_sq += ordered[pos].1.powi(2);

            let left_n = pos + 1;
            let right_n = n - left_n;
            if left_n < min_leaf || right_n < min_leaf {
                continue;
            }
            // No split between equal feature values.
            if ordered[pos].0 == ordered[pos + 1].0 {
                continue;
            }

            let right_sum = total - left_sum;
            let right_sq = total_sq - left_sq;
            let sse = (left_sq - left_sum.powi(2) / left_n as f64)
                + (right_sq - right_sum.powi(2) / right_n as f64);

            if sse < best_sse {
                best_sse = sse;
                best = Some((feature, (ordered[pos].0 + ordered[pos + 1].0) / 2.0));
            }
        }
    }

    best
}
