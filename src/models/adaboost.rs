//! AdaBoost classifier: discrete SAMME over weighted decision stumps.

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

/// A depth-one weak learner. `polarity` = 1 predicts positive on the right
/// side of the threshold, -1 on the left.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Stump {
    feature: usize,
    threshold: f64,
    polarity: i8,
    alpha: f64,
}

impl Stump {
    /// Signed prediction in {-1, +1}.
    fn decide(&self, row: ArrayView1<f64>) -> f64 {
        let right = row[self.feature] > self.threshold;
        let positive = if self.polarity > 0 { right } else { !right };
        if positive { 1.0 } else { -1.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdaBoostClassifier {
    pub n_estimators: usize,
    pub learning_rate: f64,
    stumps: Vec<Stump>,
    fitted: bool,
}

impl AdaBoostClassifier {
    pub fn new(n_estimators: usize, learning_rate: f64) -> Self {
        Self {
            n_estimators,
            learning_rate,
            stumps: Vec::new(),
            fitted: false,
        }
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            bail!("cannot fit AdaBoost on zero samples");
        }

        // Internal labels in {-1, +1}.
        let signed: Array1<f64> = y.mapv(|v| if v == 1.0 { 1.0 } else { -1.0 });
        let mut weights = Array1::<f64>::from_elem(n, 1.0 / n as f64);
        self.stumps.clear();

        for _ in 0..self.n_estimators {
            let Some((stump, error)) = best_stump(x, signed.view(), weights.view()) else {
                break;
            };
            if error >= 0.5 {
                break;
            }
            let bounded = error.max(1e-10);
            let alpha = self.learning_rate * 0.5 * ((1.0 - bounded) / bounded).ln();
            let stump = Stump { alpha, ..stump };

            for i in 0..n {
                let margin = signed[i] * stump.decide(x.row(i));
                weights[i] *= (-alpha * margin).exp();
            }
            let total = weights.sum();
            weights.mapv_inplace(|w| w / total);

            let stop = error < 1e-10;
            self.stumps.push(stump);
            if stop {
                break;
            }
        }
        self.fitted = true;
        Ok(())
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            bail!("AdaBoost model is not fitted");
        }
        Ok(Array1::from_iter(x.rows().into_iter().map(|row| {
            let score: f64 = self.stumps.iter().map(|s| s.alpha * s.decide(row)).sum();
            if score >= 0.0 { 1.0 } else { 0.0 }
        })))
    }
}

/// Exhaustive weighted-error search over (feature, threshold, polarity).
fn best_stump(
    x: ArrayView2<f64>,
    signed: ArrayView1<f64>,
    weights: ArrayView1<f64>,
) -> Option<(Stump, f64)> {
    let n = x.nrows();
    let total_positive_weight: f64 = (0..n)
        .filter(|&i| signed[i] > 0.0)
        .map(|i| weights[i])
        .sum();

    let mut best: Option<(Stump, f64)> = None;
    for feature in 0..x.ncols() {
        let mut samples: Vec<(f64, f64, f64)> = (0..n)
            .map(|i| (x[[i, feature]], signed[i], weights[i]))
            .collect();
        samples.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        // Prefix weight sums up to each candidate cut.
        let mut left_positive = 0.0;
        let mut left_weight = 0.0;
        for (i, window) in samples.windows(2).enumerate() {
            let (value, label, weight) = samples[i];
            left_weight += weight;
            if label > 0.0 {
                left_positive += weight;
            }
            if value == window[1].0 {
                continue;
            }

            // polarity +1: predict positive strictly right of the threshold.
            let error_right = left_positive + (1.0 - left_weight - (total_positive_weight - left_positive));
            let error_left = 1.0 - error_right;
            let threshold = (value + window[1].0) / 2.0;

            for (polarity, error) in [(1i8, error_right), (-1i8, error_left)] {
                if best.as_ref().is_none_or(|(_, e)| error < *e) {
                    best = Some((
                        Stump {
                            feature,
                            threshold,
                            polarity,
                            alpha: 0.0,
                        },
                        error,
                    ));
                }
            }
        }
    }
    best
}
