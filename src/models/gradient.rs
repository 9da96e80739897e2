//! Gradient boosting classifier (logistic loss, shrinkage, row subsampling).

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub subsample: f64,
    pub max_depth: usize,
    pub seed: u64,
    init_score: f64,
    trees: Vec<RegressionNode>,
    fitted: bool,
}

impl GradientBoostingClassifier {
    pub fn new(n_estimators: usize, learning_rate: f64, subsample: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            subsample,
            max_depth: 3,
            seed: 42,
            init_score: 0.0,
            trees: Vec::new(),
            fitted: false,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            bail!("cannot fit gradient boosting on zero samples");
        }
        if !(0.0 < self.subsample && self.subsample <= 1.0) {
            bail!("subsample must be in (0, 1], got {}", self.subsample);
        }

        let positive_rate = (y.sum() / n as f64).clamp(1e-6, 1.0 - 1e-6);
        self.init_score = (positive_rate / (1.0 - positive_rate)).ln();
        self.trees.clear();

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut scores = Array1::<f64>::from_elem(n, self.init_score);
        let sample_size = ((n as f64 * self.subsample).round() as usize).clamp(1, n);

        for _ in 0..self.n_estimators {
            let probabilities = scores.mapv(sigmoid);
            let residuals = &y - &probabilities;
            let hessians = probabilities.mapv(|p| p * (1.0 - p));

            let mut indices: Vec<usize> = (0..n).collect();
            indices.shuffle(&mut rng);
            indices.truncate(sample_size);

            let tree = grow_regression_tree(
                x,
                residuals.view(),
                hessians.view(),
                indices,
                self.max_depth,
            );
            for (i, score) in scores.iter_mut().enumerate() {
                *score += self.learning_rate * predict_value(&tree, x.row(i));
            }
            self.trees.push(tree);
        }
        self.fitted = true;
        Ok(())
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        Ok(self
            .decision_scores(x)?
            .mapv(|s| if sigmoid(s) >= 0.5 { 1.0 } else { 0.0 }))
    }

    fn decision_scores(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            bail!("gradient boosting model is not fitted");
        }
        let mut scores = Array1::<f64>::from_elem(x.nrows(), self.init_score);
        for tree in &self.trees {
            for (i, row) in x.rows().into_iter().enumerate() {
                scores[i] += self.learning_rate * predict_value(tree, row);
            }
        }
        Ok(scores)
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Regression tree over residuals; leaves carry the Newton step
/// `Σ residual / Σ hessian` for the logistic loss.
#[derive(Debug, Clone, Serialize, Deserialize)]
enum RegressionNode {
    Leaf {
        value: f64,
    },
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<RegressionNode>,
        right: Box<RegressionNode>,
    },
}

fn grow_regression_tree(
    x: ArrayView2<f64>,
    residuals: ArrayView1<f64>,
    hessians: ArrayView1<f64>,
    indices: Vec<usize>,
    remaining_depth: usize,
) -> RegressionNode {
    let n = indices.len();
    if remaining_depth == 0 || n < 2 {
        return leaf_value(residuals, hessians, &indices);
    }

    let Some((feature, threshold)) = best_variance_split(x, residuals, &indices) else {
        return leaf_value(residuals, hessians, &indices);
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
        indices.into_iter().partition(|&i| x[[i, feature]] <= threshold);
    if left_idx.is_empty() || right_idx.is_empty() {
        let merged: Vec<usize> = left_idx.into_iter().chain(right_idx).collect();
        return leaf_value(residuals, hessians, &merged);
    }

    RegressionNode::Internal {
        feature,
        threshold,
        left: Box::new(grow_regression_tree(
            x,
            residuals,
            hessians,
            left_idx,
            remaining_depth - 1,
        )),
        right: Box::new(grow_regression_tree(
            x,
            residuals,
            hessians,
            right_idx,
            remaining_depth - 1,
        )),
    }
}

fn leaf_value(
    residuals: ArrayView1<f64>,
    hessians: ArrayView1<f64>,
    indices: &[usize],
) -> RegressionNode {
    let residual_sum: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let hessian_sum: f64 = indices.iter().map(|&i| hessians[i]).sum();
    RegressionNode::Leaf {
        value: residual_sum / (hessian_sum + 1e-12),
    }
}

/// Best split by squared-error reduction on the residuals.
fn best_variance_split(
    x: ArrayView2<f64>,
    residuals: ArrayView1<f64>,
    indices: &[usize],
) -> Option<(usize, f64)> {
    let n = indices.len() as f64;
    let total: f64 = indices.iter().map(|&i| residuals[i]).sum();
    let mut best: Option<(usize, f64)> = None;
    let mut best_score = 1e-12;

    for feature in 0..x.ncols() {
        let mut samples: Vec<(f64, f64)> = indices
            .iter()
            .map(|&i| (x[[i, feature]], residuals[i]))
            .collect();
        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mut left_sum = 0.0;
        for (i, window) in samples.windows(2).enumerate() {
            left_sum += window[0].1;
            if window[0].0 == window[1].0 {
                continue;
            }
            let left_n = (i + 1) as f64;
            let right_n = n - left_n;
            let right_sum = total - left_sum;
            // Variance reduction up to constants: Σ²_L/n_L + Σ²_R/n_R.
            let score = left_sum * left_sum / left_n + right_sum * right_sum / right_n
                - total * total / n;
            if score > best_score {
                best_score = score;
                best = Some((feature, (window[0].0 + window[1].0) / 2.0));
            }
        }
    }
    best
}

fn predict_value(node: &RegressionNode, row: ArrayView1<f64>) -> f64 {
    match node {
        RegressionNode::Leaf { value } => *value,
        RegressionNode::Internal {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] <= *threshold {
                predict_value(left, row)
            } else {
                predict_value(right, row)
            }
        }
    }
}
