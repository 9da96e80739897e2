//! Classification metrics for trained models.

use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

/// Precision/recall/F1 bundle attached to the trainer artifact.
/// The positive class is label `1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub precision: f64,
    pub recall: f64,
    pub f1_score: f64,
}

impl ClassificationMetrics {
    pub fn from_predictions(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Self {
        let mut tp = 0usize;
        let mut fp = 0usize;
        let mut fn_ = 0usize;
        for (&truth, &pred) in y_true.iter().zip(y_pred.iter()) {
            let truth_pos = truth == 1.0;
            let pred_pos = pred == 1.0;
            match (truth_pos, pred_pos) {
                (true, true) => tp += 1,
                (false, true) => fp += 1,
                (true, false) => fn_ += 1,
                (false, false) => {}
            }
        }

        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1_score = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            precision,
            recall,
            f1_score,
        }
    }
}

/// Fraction of matching labels.
pub fn accuracy(y_true: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let hits = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    hits as f64 / y_true.len() as f64
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_predictions() {
        let y = array![0.0, 1.0, 1.0, 0.0];
        let m = ClassificationMetrics::from_predictions(y.view(), y.view());
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1_score, 1.0);
        assert_eq!(accuracy(y.view(), y.view()), 1.0);
    }

    #[test]
    fn test_mixed_predictions() {
        let truth = array![1.0, 1.0, 0.0, 0.0];
        let pred = array![1.0, 0.0, 1.0, 0.0];
        let m = ClassificationMetrics::from_predictions(truth.view(), pred.view());
        assert_eq!(m.precision, 0.5);
        assert_eq!(m.recall, 0.5);
        assert_eq!(m.f1_score, 0.5);
        assert_eq!(accuracy(truth.view(), pred.view()), 0.5);
    }

    #[test]
    fn test_no_positive_predictions() {
        let truth = array![1.0, 1.0];
        let pred = array![0.0, 0.0];
        let m = ClassificationMetrics::from_predictions(truth.view(), pred.view());
        assert_eq!(m.precision, 0.0);
        assert_eq!(m.recall, 0.0);
        assert_eq!(m.f1_score, 0.0);
    }
}
