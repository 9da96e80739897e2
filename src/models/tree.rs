//! CART decision tree classifier.

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Split quality criterion. `log_loss` is the same measure as `entropy`,
/// kept as a distinct grid value for parity with the candidate grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitCriterion {
    Gini,
    Entropy,
    LogLoss,
}

impl SplitCriterion {
    pub fn from_name(name: &str) -> Self {
        match name {
            "entropy" => Self::Entropy,
            "log_loss" => Self::LogLoss,
            _ => Self::Gini,
        }
    }

    fn impurity(&self, positive_fraction: f64) -> f64 {
        let p = positive_fraction;
        match self {
            Self::Gini => 2.0 * p * (1.0 - p),
            Self::Entropy | Self::LogLoss => {
                let mut h = 0.0;
                for q in [p, 1.0 - p] {
                    if q > 0.0 {
                        h -= q * q.ln();
                    }
                }
                h
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf {
        prediction: f64,
        probability: f64,
    },
    Internal {
        feature: usize,
        threshold: f64,
        left: Box<Node>,
        right: Box<Node>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTreeClassifier {
    pub criterion: SplitCriterion,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Number of features considered per split; `None` means all.
    pub max_features: Option<usize>,
    pub seed: u64,
    root: Option<Node>,
}

impl DecisionTreeClassifier {
    pub fn new(criterion: SplitCriterion) -> Self {
        Self {
            criterion,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            seed: 42,
            root: None,
        }
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_features(mut self, max_features: Option<usize>) -> Self {
        self.max_features = max_features;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let indices: Vec<usize> = (0..x.nrows()).collect();
        self.fit_on(x, y, indices)
    }

    /// Fit on an explicit row subset (possibly with repeats) so ensembles
    /// can bootstrap without copying the matrix.
    pub(crate) fn fit_on(
        &mut self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        indices: Vec<usize>,
    ) -> Result<()> {
        if indices.is_empty() {
            bail!("cannot fit a decision tree on zero samples");
        }
        if x.nrows() != y.len() {
            bail!("feature rows ({}) != target length ({})", x.nrows(), y.len());
        }
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.root = Some(self.grow(x, y, indices, 0, &mut rng));
        Ok(())
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let Some(root) = &self.root else {
            bail!("decision tree is not fitted");
        };
        Ok(Array1::from_iter(
            x.rows().into_iter().map(|row| predict_row(root, row)),
        ))
    }

    fn grow(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        indices: Vec<usize>,
        depth: usize,
        rng: &mut StdRng,
    ) -> Node {
        let n = indices.len();
        let positives = indices.iter().filter(|&&i| y[i] == 1.0).count();
        let probability = positives as f64 / n as f64;
        let node_impurity = self.criterion.impurity(probability);

        let depth_exhausted = self.max_depth.is_some_and(|d| depth >= d);
        if depth_exhausted || n < self.min_samples_split || node_impurity == 0.0 {
            return leaf(probability);
        }

        let Some((feature, threshold)) = self.best_split(x, y, &indices, node_impurity, rng)
        else {
            return leaf(probability);
        };

        let (left_idx, right_idx): (Vec<usize>, Vec<usize>) =
            indices.into_iter().partition(|&i| x[[i, feature]] <= threshold);
        if left_idx.is_empty() || right_idx.is_empty() {
            return leaf(probability);
        }

        Node::Internal {
            feature,
            threshold,
            left: Box::new(self.grow(x, y, left_idx, depth + 1, rng)),
            right: Box::new(self.grow(x, y, right_idx, depth + 1, rng)),
        }
    }

    fn best_split(
        &self,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
        indices: &[usize],
        node_impurity: f64,
        rng: &mut StdRng,
    ) -> Option<(usize, f64)> {
        let n = indices.len() as f64;
        let mut features: Vec<usize> = (0..x.ncols()).collect();
        if let Some(k) = self.max_features {
            features.shuffle(rng);
            features.truncate(k.max(1).min(features.len()));
        }

        let mut best: Option<(usize, f64)> = None;
        let mut best_gain = 1e-12;

        for &feature in &features {
            let mut samples: Vec<(f64, f64)> = indices
                .iter()
                .map(|&i| (x[[i, feature]], y[i]))
                .collect();
            samples
                .sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let total_pos: f64 = samples.iter().map(|(_, label)| label).sum();
            let mut left_pos = 0.0;
            for (i, window) in samples.windows(2).enumerate() {
                left_pos += window[0].1;
                if window[0].0 == window[1].0 {
                    continue;
                }
                let left_n = (i + 1) as f64;
                let right_n = n - left_n;
                let left_imp = self.criterion.impurity(left_pos / left_n);
                let right_imp = self.criterion.impurity((total_pos - left_pos) / right_n);
                let weighted = (left_n / n) * left_imp + (right_n / n) * right_imp;
                let gain = node_impurity - weighted;
                if gain > best_gain {
                    best_gain = gain;
                    best = Some((feature, (window[0].0 + window[1].0) / 2.0));
                }
            }
        }
        best
    }
}

fn leaf(probability: f64) -> Node {
    Node::Leaf {
        prediction: if probability >= 0.5 { 1.0 } else { 0.0 },
        probability,
    }
}

fn predict_row(node: &Node, row: ArrayView1<f64>) -> f64 {
    match node {
        Node::Leaf { prediction, .. } => *prediction,
        Node::Internal {
            feature,
            threshold,
            left,
            right,
        } => {
            if row[*feature] <= *threshold {
                predict_row(left, row)
            } else {
                predict_row(right, row)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_axis_aligned_split() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0], [12.0]];
        let y = array![0.0, 0.0, 0.0, 1.0, 1.0, 1.0];
        let mut tree = DecisionTreeClassifier::new(SplitCriterion::Gini);
        tree.fit(x.view(), y.view()).unwrap();
        let preds = tree.predict(x.view()).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_entropy_criterion_learns_xorish_data() {
        let x = array![
            [0.0, 0.0],
            [0.0, 1.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.1, 0.1],
            [0.9, 0.9],
        ];
        let y = array![0.0, 1.0, 1.0, 0.0, 0.0, 0.0];
        let mut tree = DecisionTreeClassifier::new(SplitCriterion::Entropy);
        tree.fit(x.view(), y.view()).unwrap();
        let preds = tree.predict(x.view()).unwrap();
        assert_eq!(preds, y);
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let tree = DecisionTreeClassifier::new(SplitCriterion::Gini);
        assert!(tree.predict(array![[1.0]].view()).is_err());
    }

    #[test]
    fn test_criterion_names() {
        assert_eq!(SplitCriterion::from_name("gini"), SplitCriterion::Gini);
        assert_eq!(SplitCriterion::from_name("entropy"), SplitCriterion::Entropy);
        assert_eq!(SplitCriterion::from_name("log_loss"), SplitCriterion::LogLoss);
    }
}
