//! Grid search with k-fold cross-validation.

use crate::metrics::accuracy;
use crate::models::{CandidateModel, ParamSet};
use anyhow::Result;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use serde_json::Value;

/// Expand a grid into every parameter assignment (Cartesian product).
/// An empty grid yields the single empty assignment.
pub fn expand_grid(grid: &[(&'static str, Vec<Value>)]) -> Vec<ParamSet> {
    let mut configs: Vec<ParamSet> = vec![ParamSet::new()];
    for (key, values) in grid {
        let mut expanded = Vec::with_capacity(configs.len() * values.len());
        for config in &configs {
            for value in values {
                let mut next = config.clone();
                next.insert(key.to_string(), value.clone());
                expanded.push(next);
            }
        }
        configs = expanded;
    }
    configs
}

/// K-fold grid search scored by mean validation accuracy.
pub struct GridSearch {
    pub folds: usize,
}

impl GridSearch {
    pub fn new(folds: usize) -> Self {
        Self { folds }
    }

    /// Return the best parameter assignment and its mean CV score.
    pub fn search(
        &self,
        candidate: &CandidateModel,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<(ParamSet, f64)> {
        let mut best_params = ParamSet::new();
        let mut best_score = f64::NEG_INFINITY;
        for params in expand_grid(&candidate.grid) {
            let score = self.cross_validate(candidate, &params, x, y)?;
            if score > best_score {
                best_score = score;
                best_params = params;
            }
        }
        Ok((best_params, best_score))
    }

    fn cross_validate(
        &self,
        candidate: &CandidateModel,
        params: &ParamSet,
        x: ArrayView2<f64>,
        y: ArrayView1<f64>,
    ) -> Result<f64> {
        let n = x.nrows();
        let folds = self.folds.min(n).max(1);
        let mut scores = Vec::with_capacity(folds);

        for fold in 0..folds {
            let start = fold * n / folds;
            let end = (fold + 1) * n / folds;
            if start == end {
                continue;
            }
            let holdout: Vec<usize> = (start..end).collect();
            let rest: Vec<usize> = (0..start).chain(end..n).collect();
            if rest.is_empty() {
                continue;
            }

            let train_x: Array2<f64> = x.select(Axis(0), &rest);
            let train_y: Array1<f64> = y.select(Axis(0), &rest);
            let valid_x: Array2<f64> = x.select(Axis(0), &holdout);
            let valid_y: Array1<f64> = y.select(Axis(0), &holdout);

            let mut model = (candidate.build)(params);
            model.fit(train_x.view(), train_y.view())?;
            let predictions = model.predict(valid_x.view())?;
            scores.push(accuracy(valid_y.view(), predictions.view()));
        }

        if scores.is_empty() {
            return Ok(0.0);
        }
        Ok(scores.iter().sum::<f64>() / scores.len() as f64)
    }
}
