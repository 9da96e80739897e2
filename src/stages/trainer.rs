//! Model trainer: grid search over the candidate catalog, test-set
//! selection, and persistence of the composite predictor.

use crate::artifacts::{DataTransformationArtifact, ModelTrainerArtifact};
use crate::config::ModelTrainerConfig;
use crate::data::io;
use crate::error::{PipelineError, Result, Stage, StageContext};
use crate::metrics::{ClassificationMetrics, accuracy};
use crate::models::{KnnImputer, ParamSet, TrainedClassifier, model_catalog};
use crate::predictor::CompositePredictor;
use crate::search::GridSearch;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, s};

const CV_FOLDS: usize = 5;

pub struct ModelTrainer {
    config: ModelTrainerConfig,
    transformation_artifact: DataTransformationArtifact,
}

impl ModelTrainer {
    pub fn new(
        config: ModelTrainerConfig,
        transformation_artifact: DataTransformationArtifact,
    ) -> Self {
        Self {
            config,
            transformation_artifact,
        }
    }

    pub fn initiate(&self) -> Result<ModelTrainerArtifact> {
        tracing::info!("starting model training");

        let train = io::load_matrix(&self.transformation_artifact.transformed_train_file_path)
            .in_stage(Stage::Training)?;
        let test = io::load_matrix(&self.transformation_artifact.transformed_test_file_path)
            .in_stage(Stage::Training)?;

        let (x_train, y_train) = split_features_target(&train)?;
        let (x_test, y_test) = split_features_target(&test)?;
        self.train_model(
            x_train.view(),
            y_train.view(),
            x_test.view(),
            y_test.view(),
        )
    }

    fn train_model(
        &self,
        x_train: ArrayView2<f64>,
        y_train: ArrayView1<f64>,
        x_test: ArrayView2<f64>,
        y_test: ArrayView1<f64>,
    ) -> Result<ModelTrainerArtifact> {
        let catalog = model_catalog();
        let search = GridSearch::new(CV_FOLDS);
        let mut report: Vec<(String, f64)> = Vec::with_capacity(catalog.len());
        let mut fitted: Vec<TrainedClassifier> = Vec::with_capacity(catalog.len());

        for candidate in &catalog {
            let params = if candidate.grid.is_empty() {
                ParamSet::new()
            } else {
                let (best_params, cv_score) = search
                    .search(candidate, x_train, y_train)
                    .in_stage(Stage::Training)?;
                tracing::debug!(model = candidate.name, cv_score, "grid search finished");
                best_params
            };

            let mut model = (candidate.build)(&params);
            model.fit(x_train, y_train).in_stage(Stage::Training)?;
            let predictions = model.predict(x_test).in_stage(Stage::Training)?;
            let test_score = accuracy(y_test, predictions.view());
            tracing::info!(model = candidate.name, test_score, "scored candidate");

            report.push((candidate.name.to_string(), test_score));
            fitted.push(model);
        }

        let best_index = select_best(&report).ok_or_else(|| {
            PipelineError::new(Stage::Training, "candidate catalog produced no models")
        })?;
        let (best_name, best_score) = &report[best_index];
        let best_model = fitted.swap_remove(best_index);
        tracing::info!(model = %best_name, score = best_score, "selected best model");

        if *best_score < self.config.expected_accuracy {
            tracing::warn!(
                score = best_score,
                expected = self.config.expected_accuracy,
                "best model scored below the expected accuracy"
            );
        }

        let train_predictions = best_model.predict(x_train).in_stage(Stage::Training)?;
        let test_predictions = best_model.predict(x_test).in_stage(Stage::Training)?;
        let train_metric =
            ClassificationMetrics::from_predictions(y_train, train_predictions.view());
        let test_metric =
            ClassificationMetrics::from_predictions(y_test, test_predictions.view());

        let train_accuracy = accuracy(y_train, train_predictions.view());
        if (train_accuracy - best_score).abs() > self.config.overfitting_underfitting_threshold {
            tracing::warn!(
                train_accuracy,
                test_accuracy = best_score,
                threshold = self.config.overfitting_underfitting_threshold,
                "train/test accuracy gap exceeds the over/underfit threshold"
            );
        }

        let imputer: KnnImputer =
            io::load_object(&self.transformation_artifact.transformed_object_file_path)
                .in_stage(Stage::Training)?;
        let predictor = CompositePredictor::new(imputer, best_model);
        predictor
            .save(&self.config.trained_model_file_path)
            .in_stage(Stage::Training)?;

        Ok(ModelTrainerArtifact {
            trained_model_file_path: self.config.trained_model_file_path.clone(),
            train_metric_artifact: train_metric,
            test_metric_artifact: test_metric,
        })
    }
}

/// The target is the last matrix column; everything before it is a feature.
fn split_features_target(matrix: &Array2<f64>) -> Result<(Array2<f64>, Array1<f64>)> {
    let columns = matrix.ncols();
    if columns < 2 {
        return Err(PipelineError::new(
            Stage::Training,
            format!("transformed matrix needs features and a target, got {columns} column(s)"),
        ));
    }
    let x = matrix.slice(s![.., ..columns - 1]).to_owned();
    let y = matrix.column(columns - 1).to_owned();
    Ok((x, y))
}

/// Index of the maximum score; ties resolve to the first (catalog order).
pub fn select_best(report: &[(String, f64)]) -> Option<usize> {
    let mut best: Option<usize> = None;
    for (index, (_, score)) in report.iter().enumerate() {
        match best {
            Some(current) if report[current].1 >= *score => {}
            _ => best = Some(index),
        }
    }
    best
}
