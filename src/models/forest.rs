//! Random forest: bagged CART trees with per-split feature subsampling.

use crate::models::tree::{DecisionTreeClassifier, SplitCriterion};
use anyhow::{Result, bail};
use ndarray::{Array1, ArrayView1, ArrayView2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForestClassifier {
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub seed: u64,
    trees: Vec<DecisionTreeClassifier>,
}

impl RandomForestClassifier {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            n_estimators,
            max_depth: None,
            seed: 42,
            trees: Vec::new(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn fit(&mut self, x: ArrayView2<f64>, y: ArrayView1<f64>) -> Result<()> {
        let n = x.nrows();
        if n == 0 {
            bail!("cannot fit a random forest on zero samples");
        }
        if self.n_estimators == 0 {
            bail!("n_estimators must be positive");
        }

        let max_features = (x.ncols() as f64).sqrt().round().max(1.0) as usize;
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.trees = Vec::with_capacity(self.n_estimators);
        for _ in 0..self.n_estimators {
            let bootstrap: Vec<usize> = (0..n).map(|_| rng.gen_range(0..n)).collect();
            let mut tree = DecisionTreeClassifier::new(SplitCriterion::Gini)
                .with_max_depth(self.max_depth)
                .with_max_features(Some(max_features))
                .with_seed(rng.r#gen());
            tree.fit_on(x, y, bootstrap)?;
            self.trees.push(tree);
        }
        Ok(())
    }

    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            bail!("random forest is not fitted");
        }
        let mut votes = Array1::<f64>::zeros(x.nrows());
        for tree in &self.trees {
            votes += &tree.predict(x)?;
        }
        let half = self.trees.len() as f64 / 2.0;
        Ok(votes.mapv(|v| if v >= half { 1.0 } else { 0.0 }))
    }
}
