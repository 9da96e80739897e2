//! L2-regularized logistic regression trained by gradient descent on
//! standardized features.

use anyhow::{Result, bail};
use ndarray::{Array1, ArrayView1, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegressionClassifier {
    pub learning_rate: f64,
    pub max_iter: usize,
    pub l2: f64,
    weights: Vec<f64>,
    intercept: f64,
    feature_means: Vec<f64>,
    feature_stds: Vec<f64>,
    fitted: bool,
}

impl Default for LogisticRegressionClassifier {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            max_iter: 300,
            l2: 1e-4,
            weights: Vec::new(),
            intercept: 0.0,
            feature_means: Vec::new(),
            feature_stds: Vec::new(),
            fitted: false,
        }
    }
}

impl LogisticRegressionClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let (n, p) = (x.nrows(), x.ncols());
        if n == 0 || p == 0 {
            bail!("cannot fit logistic regression on an empty matrix");
        }

        self.feature_means = (0..p).map(|j| x.column(j).mean().unwrap_or(0.0)).collect();
        self.feature_stds = (0..p)
            .map(|j| {
                let mean = self.feature_means[j];
                let var =
                    x.column(j).iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n as f64;
                let std = var.sqrt();
                if std > 0.0 { std } else { 1.0 }
            })
            .collect();

        let standardized = self.standardize(x);
        let mut weights = vec![0.0; p];
        let mut intercept = 0.0;

        for _ in 0..self.max_iter {
            let mut weight_grad = vec![0.0; p];
            let mut intercept_grad = 0.0;
            for (i, row) in standardized.rows().into_iter().enumerate() {
                let z = intercept
                    + row
                        .iter()
                        .zip(weights.iter())
                        .map(|(v, w)| v * w)
                        .sum::<f64>();
                let error = sigmoid(z) - y[i];
                for (g, v) in weight_grad.iter_mut().zip(row.iter()) {
                    *g += error * v;
                }
                intercept_grad += error;
            }
            let scale = self.learning_rate / n as f64;
            for (w, g) in weights.iter_mut().zip(weight_grad.iter()) {
                *w -= scale * (g + self.l2 * *w * n as f64);
            }
            intercept -= scale * intercept_grad;
        }

        self.weights = weights;
        self.intercept = intercept;
        self.fitted = true;
        Ok(())
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if !self.fitted {
            bail!("logistic regression model is not fitted");
        }
        let standardized = self.standardize(x);
        Ok(Array1::from_iter(standardized.rows().into_iter().map(
            |row| {
                let z = self.intercept
                    + row
                        .iter()
                        .zip(self.weights.iter())
                        .map(|(v, w)| v * w)
                        .sum::<f64>();
                if sigmoid(z) >= 0.5 { 1.0 } else { 0.0 }
            },
        )))
    }

    fn standardize(&self, x: ArrayView2<f64>) -> ndarray::Array2<f64> {
        let mut out = x.to_owned();
        for (j, mut column) in out.columns_mut().into_iter().enumerate() {
            let (mean, std) = (self.feature_means[j], self.feature_stds[j]);
            column.mapv_inplace(|v| (v - mean) / std);
        }
        out
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_learns_linearly_separable_data() {
        let x = array![
            [0.0, 0.1],
            [0.2, 0.0],
            [0.1, 0.2],
            [0.3, 0.1],
            [3.0, 3.1],
            [3.2, 3.0],
            [3.1, 3.2],
            [3.3, 3.1],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        let mut model = LogisticRegressionClassifier::new();
        model.fit(x.view(), y.view()).unwrap();
        assert_eq!(model.predict(x.view()).unwrap(), y);
    }

    #[test]
    fn test_constant_feature_does_not_blow_up() {
        let x = array![[1.0, 0.0], [1.0, 1.0], [1.0, 2.0], [1.0, 3.0]];
        let y = array![0.0, 0.0, 1.0, 1.0];
        let mut model = LogisticRegressionClassifier::new();
        model.fit(x.view(), y.view()).unwrap();
        let preds = model.predict(x.view()).unwrap();
        assert!(preds.iter().all(|p| p.is_finite()));
        assert_eq!(preds, y);
    }

    #[test]
    fn test_unfitted_predict_fails() {
        let model = LogisticRegressionClassifier::new();
        assert!(model.predict(array![[1.0]].view()).is_err());
    }
}
