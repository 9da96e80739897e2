//! Data transformation: target recode plus KNN imputation of the features.

use crate::artifacts::{DataTransformationArtifact, DataValidationArtifact};
use crate::config::{DataTransformationConfig, TARGET_COLUMN};
use crate::data::frame::value_to_f64;
use crate::data::{DataFrame, io};
use crate::error::{PipelineError, Result, Stage, StageContext};
use crate::models::KnnImputer;
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis, concatenate};

pub struct DataTransformation {
    config: DataTransformationConfig,
    validation_artifact: DataValidationArtifact,
}

impl DataTransformation {
    pub fn new(
        config: DataTransformationConfig,
        validation_artifact: DataValidationArtifact,
    ) -> Self {
        Self {
            config,
            validation_artifact,
        }
    }

    pub fn initiate(&self) -> Result<DataTransformationArtifact> {
        tracing::info!("starting data transformation");

        let train = io::read_csv(&self.validation_artifact.valid_train_file_path)
            .in_stage(Stage::Transformation)?;
        let test = io::read_csv(&self.validation_artifact.valid_test_file_path)
            .in_stage(Stage::Transformation)?;

        let (train_features, train_target) = separate_target(train)?;
        let (test_features, test_target) = separate_target(test)?;

        let mut imputer =
            KnnImputer::new(self.config.knn_neighbors, self.config.knn_weights);
        imputer
            .fit(train_features.view())
            .in_stage(Stage::Transformation)?;
        let transformed_train = imputer
            .transform(train_features.view())
            .in_stage(Stage::Transformation)?;
        let transformed_test = imputer
            .transform(test_features.view())
            .in_stage(Stage::Transformation)?;

        let train_matrix = append_target(transformed_train.view(), train_target.view())?;
        let test_matrix = append_target(transformed_test.view(), test_target.view())?;

        io::save_matrix(&self.config.transformed_train_file_path, &train_matrix)
            .in_stage(Stage::Transformation)?;
        io::save_matrix(&self.config.transformed_test_file_path, &test_matrix)
            .in_stage(Stage::Transformation)?;
        io::save_object(&self.config.transformed_object_file_path, &imputer)
            .in_stage(Stage::Transformation)?;
        tracing::info!(
            train_shape = ?train_matrix.dim(),
            test_shape = ?test_matrix.dim(),
            "persisted transformed matrices and fitted imputer"
        );

        Ok(DataTransformationArtifact {
            transformed_train_file_path: self.config.transformed_train_file_path.clone(),
            transformed_test_file_path: self.config.transformed_test_file_path.clone(),
            transformed_object_file_path: self.config.transformed_object_file_path.clone(),
        })
    }
}

/// Split off the target column as a recoded label vector.
fn separate_target(mut frame: DataFrame) -> Result<(Array2<f64>, Array1<f64>)> {
    let target = frame.take_column(TARGET_COLUMN).ok_or_else(|| {
        PipelineError::new(
            Stage::Transformation,
            format!("target column {TARGET_COLUMN:?} is missing"),
        )
    })?;
    let labels = Array1::from_iter(target.iter().map(|v| recode_label(value_to_f64(v))));
    Ok((frame.to_matrix(), labels))
}

/// Binary recode: label -1 maps to 0, everything else passes through.
pub fn recode_label(value: f64) -> f64 {
    if value == -1.0 { 0.0 } else { value }
}

fn append_target<'a>(features: ArrayView2<'a, f64>, target: ArrayView1<'a, f64>) -> Result<Array2<f64>> {
    let column = target.insert_axis(Axis(1));
    concatenate(Axis(1), &[features, column])
        .map_err(|e| PipelineError::wrap(Stage::Transformation, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataValidationConfig, TrainingPipelineConfig};
    use crate::data::io::write_csv;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    #[test]
    fn test_recode_label_values() {
        assert_eq!(recode_label(-1.0), 0.0);
        assert_eq!(recode_label(0.0), 0.0);
        assert_eq!(recode_label(1.0), 1.0);
    }

    fn split_frame(rows: Vec<Vec<Value>>) -> DataFrame {
        DataFrame::new(vec!["f1".into(), "f2".into(), "Result".into()], rows)
    }

    #[test]
    fn test_transformation_imputes_and_appends_target() {
        let dir = TempDir::new().unwrap();
        let pipeline = TrainingPipelineConfig::rooted(dir.path(), chrono::Utc::now());
        let validation_config = DataValidationConfig::new(&pipeline);

        let train = split_frame(vec![
            vec![json!(1.0), json!(10.0), json!(-1)],
            vec![json!(2.0), json!(20.0), json!(1)],
            vec![json!(3.0), json!(30.0), json!(1)],
            vec![Value::Null, json!(21.0), json!(-1)],
        ]);
        let test = split_frame(vec![vec![json!(1.5), Value::Null, json!(1)]]);
        write_csv(&validation_config.valid_train_file_path, &train).unwrap();
        write_csv(&validation_config.valid_test_file_path, &test).unwrap();

        let config = crate::config::DataTransformationConfig::new(&pipeline);
        let transformation = DataTransformation::new(
            config.clone(),
            DataValidationArtifact {
                validation_status: true,
                valid_train_file_path: validation_config.valid_train_file_path.clone(),
                valid_test_file_path: validation_config.valid_test_file_path.clone(),
                invalid_train_file_path: None,
                invalid_test_file_path: None,
                drift_report_file_path: validation_config.drift_report_file_path.clone(),
            },
        );
        let artifact = transformation.initiate().unwrap();

        let train_matrix = io::load_matrix(&artifact.transformed_train_file_path).unwrap();
        assert_eq!(train_matrix.dim(), (4, 3));
        // No NaN survives imputation; the target is the last column, recoded.
        assert!(train_matrix.iter().all(|v| v.is_finite()));
        assert_eq!(train_matrix[[0, 2]], 0.0);
        assert_eq!(train_matrix[[1, 2]], 1.0);

        let test_matrix = io::load_matrix(&artifact.transformed_test_file_path).unwrap();
        assert_eq!(test_matrix.dim(), (1, 3));
        assert!(test_matrix.iter().all(|v| v.is_finite()));

        // The fitted imputer is persisted once, at the transformer path.
        let imputer: KnnImputer =
            io::load_object(&artifact.transformed_object_file_path).unwrap();
        assert_eq!(imputer.n_neighbors, config.knn_neighbors);
    }

    #[test]
    fn test_missing_target_column_fails() {
        let dir = TempDir::new().unwrap();
        let pipeline = TrainingPipelineConfig::rooted(dir.path(), chrono::Utc::now());
        let validation_config = DataValidationConfig::new(&pipeline);

        let headless = DataFrame::new(
            vec!["f1".into()],
            vec![vec![json!(1.0)], vec![json!(2.0)]],
        );
        write_csv(&validation_config.valid_train_file_path, &headless).unwrap();
        write_csv(&validation_config.valid_test_file_path, &headless).unwrap();

        let transformation = DataTransformation::new(
            crate::config::DataTransformationConfig::new(&pipeline),
            DataValidationArtifact {
                validation_status: true,
                valid_train_file_path: validation_config.valid_train_file_path.clone(),
                valid_test_file_path: validation_config.valid_test_file_path.clone(),
                invalid_train_file_path: None,
                invalid_test_file_path: None,
                drift_report_file_path: validation_config.drift_report_file_path.clone(),
            },
        );
        let err = transformation.initiate().unwrap_err();
        assert_eq!(err.stage, Stage::Transformation);
        assert!(err.message.contains("target column"));
    }
}
