//! The composite predictor served after training: the fitted imputer
//! chained with the winning classifier.

use crate::models::{KnnImputer, TrainedClassifier};
use anyhow::Result;
use ndarray::{Array1, ArrayView2};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompositePredictor {
    imputer: KnnImputer,
    model: TrainedClassifier,
}

impl CompositePredictor {
    pub fn new(imputer: KnnImputer, model: TrainedClassifier) -> Self {
        Self { imputer, model }
    }

    /// Transform-then-predict: raw feature rows in, labels out.
    pub fn predict(&self, x: ArrayView2<f64>) -> Result<Array1<f64>> {
        let transformed = self.imputer.transform(x)?;
        self.model.predict(transformed.view())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        crate::data::io::save_object(path, self)
    }

    pub fn load(path: &Path) -> Result<Self> {
        crate::data::io::load_object(path)
    }
}
