//! K-nearest-neighbors missing-value imputer.
//!
//! Fit stores the training matrix; transform fills each missing cell from
//! the nearest training rows under the nan-aware Euclidean distance,
//! considering only donors that observed the cell's column. Columns with no
//! usable donor fall back to the column mean.

use crate::config::ImputerWeights;
use anyhow::{Result, bail};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnImputer {
    pub n_neighbors: usize,
    pub weights: ImputerWeights,
    train: Option<Array2<f64>>,
    column_means: Vec<f64>,
}

impl KnnImputer {
    pub fn new(n_neighbors: usize, weights: ImputerWeights) -> Self {
        Self {
            n_neighbors,
            weights,
            train: None,
            column_means: Vec::new(),
        }
    }

    /// Fit on training features only; no information flows back from any
    /// later transform input.
    pub fn fit(&mut self, x: ArrayView2<f64>) -> Result<()> {
        if x.nrows() == 0 || x.ncols() == 0 {
            bail!("cannot fit imputer on an empty matrix");
        }
        if self.n_neighbors == 0 {
            bail!("n_neighbors must be positive");
        }

        self.column_means = (0..x.ncols())
            .map(|j| {
                let observed: Vec<f64> =
                    x.column(j).iter().copied().filter(|v| v.is_finite()).collect();
                if observed.is_empty() {
                    0.0
                } else {
                    observed.iter().sum::<f64>() / observed.len() as f64
                }
            })
            .collect();
        self.train = Some(x.to_owned());
        Ok(())
    }

    pub fn transform(&self, x: ArrayView2<f64>) -> Result<Array2<f64>> {
        let Some(train) = &self.train else {
            bail!("imputer is not fitted");
        };
        if x.ncols() != train.ncols() {
            bail!(
                "imputer was fitted on {} columns, input has {}",
                train.ncols(),
                x.ncols()
            );
        }

        let mut out = x.to_owned();
        for mut row in out.rows_mut() {
            let missing: Vec<usize> = row
                .iter()
                .enumerate()
                .filter(|(_, v)| !v.is_finite())
                .map(|(j, _)| j)
                .collect();
            if missing.is_empty() {
                continue;
            }

            let distances: Vec<(usize, f64)> = train
                .rows()
                .into_iter()
                .enumerate()
                .filter_map(|(i, candidate)| {
                    nan_euclidean(row.view(), candidate).map(|d| (i, d))
                })
                .collect();

            for &j in &missing {
                row[j] = self.impute_cell(train, &distances, j);
            }
        }
        Ok(out)
    }

    fn impute_cell(&self, train: &Array2<f64>, distances: &[(usize, f64)], column: usize) -> f64 {
        // Donors must have observed the target column.
        let mut donors: Vec<(f64, f64)> = distances
            .iter()
            .filter(|(i, _)| train[[*i, column]].is_finite())
            .map(|&(i, d)| (d, train[[i, column]]))
            .collect();
        if donors.is_empty() {
            return self.column_means[column];
        }
        donors.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        donors.truncate(self.n_neighbors);

        match self.weights {
            ImputerWeights::Uniform => {
                donors.iter().map(|(_, v)| v).sum::<f64>() / donors.len() as f64
            }
            ImputerWeights::Distance => {
                // An exact match dominates; average exact matches if several.
                let exact: Vec<f64> = donors
                    .iter()
                    .filter(|(d, _)| *d == 0.0)
                    .map(|(_, v)| *v)
                    .collect();
                if !exact.is_empty() {
                    return exact.iter().sum::<f64>() / exact.len() as f64;
                }
                let mut weighted = 0.0;
                let mut total = 0.0;
                for (d, v) in &donors {
                    let w = 1.0 / d;
                    weighted += w * v;
                    total += w;
                }
                weighted / total
            }
        }
    }
}

/// Euclidean distance over mutually observed coordinates, scaled up by the
/// fraction of coordinates used. `None` when no coordinate is shared.
fn nan_euclidean(a: ndarray::ArrayView1<f64>, b: ndarray::ArrayView1<f64>) -> Option<f64> {
    let total = a.len();
    let mut observed = 0usize;
    let mut sum_sq = 0.0;
    for (&va, &vb) in a.iter().zip(b.iter()) {
        if va.is_finite() && vb.is_finite() {
            observed += 1;
            sum_sq += (va - vb) * (va - vb);
        }
    }
    if observed == 0 {
        return None;
    }
    Some((total as f64 / observed as f64 * sum_sq).sqrt())
}
