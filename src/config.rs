//! Configuration for the training pipeline.
//!
//! One [`TrainingPipelineConfig`] is built per run, keyed by a formatted
//! timestamp so that concurrent runs write to disjoint artifact trees. Each
//! stage derives its own immutable config (paths + parameters) from it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const PIPELINE_NAME: &str = "phishnet";
pub const TARGET_COLUMN: &str = "Result";
pub const ARTIFACT_DIR: &str = "artifacts";
pub const MODEL_DIR: &str = "saved_models";
pub const TIMESTAMP_FORMAT: &str = "%m_%d_%Y_%H_%M_%S";

pub const RAW_FILE_NAME: &str = "phishing_data.csv";
pub const TRAIN_FILE_NAME: &str = "train.csv";
pub const TEST_FILE_NAME: &str = "test.csv";
pub const SCHEMA_FILE_PATH: &str = "schema/schema.yaml";

pub const INGESTION_DIR_NAME: &str = "data_ingestion";
pub const INGESTION_FEATURE_STORE_DIR: &str = "feature_store";
pub const INGESTION_INGESTED_DIR: &str = "ingested";
pub const INGESTION_DATABASE_NAME: &str = "phishnet";
pub const INGESTION_COLLECTION_NAME: &str = "network_data";
pub const INGESTION_TRAIN_TEST_SPLIT_RATIO: f64 = 0.2;

pub const VALIDATION_DIR_NAME: &str = "data_validation";
pub const VALIDATION_VALID_DIR: &str = "validated";
pub const VALIDATION_INVALID_DIR: &str = "invalid";
pub const VALIDATION_DRIFT_REPORT_DIR: &str = "drift_report";
pub const VALIDATION_DRIFT_REPORT_FILE_NAME: &str = "report.yaml";
pub const VALIDATION_DRIFT_THRESHOLD: f64 = 0.05;

pub const TRANSFORMATION_DIR_NAME: &str = "data_transformation";
pub const TRANSFORMATION_DATA_DIR: &str = "transformed";
pub const TRANSFORMATION_OBJECT_DIR: &str = "transformer";
pub const TRANSFORMATION_TRAIN_FILE_NAME: &str = "train.bin";
pub const TRANSFORMATION_TEST_FILE_NAME: &str = "test.bin";
pub const TRANSFORMATION_IMPUTER_FILE_NAME: &str = "imputer.bin";
pub const TRANSFORMATION_KNN_NEIGHBORS: usize = 3;

pub const TRAINER_DIR_NAME: &str = "model_trainer";
pub const TRAINER_TRAINED_MODEL_DIR: &str = "trained_model";
pub const TRAINER_MODEL_FILE_NAME: &str = "model.bin";
pub const TRAINER_EXPECTED_ACCURACY: f64 = 0.6;
pub const TRAINER_OVERFIT_UNDERFIT_THRESHOLD: f64 = 0.05;

/// Per-run pipeline configuration. Never mutated after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    pub artifact_dir: PathBuf,
    pub model_dir: PathBuf,
    pub timestamp: String,
}

impl TrainingPipelineConfig {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::rooted(Path::new("."), now)
    }

    /// Root the artifact and model trees under an explicit directory.
    pub fn rooted(root: &Path, now: DateTime<Utc>) -> Self {
        let timestamp = now.format(TIMESTAMP_FORMAT).to_string();
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: root.join(ARTIFACT_DIR).join(&timestamp),
            model_dir: root.join(MODEL_DIR),
            timestamp,
        }
    }

    /// Final path of the composite predictor served after a run.
    pub fn saved_model_path(&self) -> PathBuf {
        self.model_dir.join(TRAINER_MODEL_FILE_NAME)
    }
}

impl Default for TrainingPipelineConfig {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

/// Data ingestion paths and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub feature_store_file_path: PathBuf,
    pub training_file_path: PathBuf,
    pub testing_file_path: PathBuf,
    pub train_test_split_ratio: f64,
    pub database_name: String,
    pub collection_name: String,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_ingestion_dir = pipeline.artifact_dir.join(INGESTION_DIR_NAME);
        Self {
            feature_store_file_path: data_ingestion_dir
                .join(INGESTION_FEATURE_STORE_DIR)
                .join(RAW_FILE_NAME),
            training_file_path: data_ingestion_dir
                .join(INGESTION_INGESTED_DIR)
                .join(TRAIN_FILE_NAME),
            testing_file_path: data_ingestion_dir
                .join(INGESTION_INGESTED_DIR)
                .join(TEST_FILE_NAME),
            train_test_split_ratio: INGESTION_TRAIN_TEST_SPLIT_RATIO,
            database_name: INGESTION_DATABASE_NAME.to_string(),
            collection_name: INGESTION_COLLECTION_NAME.to_string(),
            data_ingestion_dir,
        }
    }
}

/// Data validation paths and parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub invalid_train_file_path: PathBuf,
    pub invalid_test_file_path: PathBuf,
    pub drift_report_file_path: PathBuf,
    pub schema_file_path: PathBuf,
    pub drift_threshold: f64,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_validation_dir = pipeline.artifact_dir.join(VALIDATION_DIR_NAME);
        let valid_dir = data_validation_dir.join(VALIDATION_VALID_DIR);
        let invalid_dir = data_validation_dir.join(VALIDATION_INVALID_DIR);
        Self {
            valid_train_file_path: valid_dir.join(TRAIN_FILE_NAME),
            valid_test_file_path: valid_dir.join(TEST_FILE_NAME),
            invalid_train_file_path: invalid_dir.join(TRAIN_FILE_NAME),
            invalid_test_file_path: invalid_dir.join(TEST_FILE_NAME),
            drift_report_file_path: data_validation_dir
                .join(VALIDATION_DRIFT_REPORT_DIR)
                .join(VALIDATION_DRIFT_REPORT_FILE_NAME),
            schema_file_path: PathBuf::from(SCHEMA_FILE_PATH),
            drift_threshold: VALIDATION_DRIFT_THRESHOLD,
            data_validation_dir,
        }
    }
}

/// How neighbor contributions are combined during imputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputerWeights {
    Uniform,
    Distance,
}

/// Data transformation paths and imputer parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationConfig {
    pub data_transformation_dir: PathBuf,
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
    pub knn_neighbors: usize,
    pub knn_weights: ImputerWeights,
}

impl DataTransformationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_transformation_dir = pipeline.artifact_dir.join(TRANSFORMATION_DIR_NAME);
        Self {
            transformed_train_file_path: data_transformation_dir
                .join(TRANSFORMATION_DATA_DIR)
                .join(TRANSFORMATION_TRAIN_FILE_NAME),
            transformed_test_file_path: data_transformation_dir
                .join(TRANSFORMATION_DATA_DIR)
                .join(TRANSFORMATION_TEST_FILE_NAME),
            transformed_object_file_path: data_transformation_dir
                .join(TRANSFORMATION_OBJECT_DIR)
                .join(TRANSFORMATION_IMPUTER_FILE_NAME),
            knn_neighbors: TRANSFORMATION_KNN_NEIGHBORS,
            knn_weights: ImputerWeights::Uniform,
            data_transformation_dir,
        }
    }
}

/// Model trainer paths and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainerConfig {
    pub model_trainer_dir: PathBuf,
    pub trained_model_file_path: PathBuf,
    pub expected_accuracy: f64,
    pub overfitting_underfitting_threshold: f64,
}

impl ModelTrainerConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let model_trainer_dir = pipeline.artifact_dir.join(TRAINER_DIR_NAME);
        Self {
            trained_model_file_path: model_trainer_dir
                .join(TRAINER_TRAINED_MODEL_DIR)
                .join(TRAINER_MODEL_FILE_NAME),
            expected_accuracy: TRAINER_EXPECTED_ACCURACY,
            overfitting_underfitting_threshold: TRAINER_OVERFIT_UNDERFIT_THRESHOLD,
            model_trainer_dir,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:30:45Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_pipeline_config_timestamped_dir() {
        let cfg = TrainingPipelineConfig::new(fixed_now());
        assert_eq!(cfg.timestamp, "03_01_2025_12_30_45");
        assert_eq!(
            cfg.artifact_dir,
            PathBuf::from("./artifacts/03_01_2025_12_30_45")
        );
        assert_eq!(cfg.saved_model_path(), PathBuf::from("./saved_models/model.bin"));
    }

    #[test]
    fn test_stage_configs_derive_from_pipeline() {
        let root = Path::new("/tmp/run");
        let cfg = TrainingPipelineConfig::rooted(root, fixed_now());

        let ingestion = DataIngestionConfig::new(&cfg);
        assert!(ingestion
            .feature_store_file_path
            .starts_with(&cfg.artifact_dir));
        assert!(ingestion.training_file_path.ends_with("ingested/train.csv"));
        assert_eq!(ingestion.train_test_split_ratio, 0.2);

        let validation = DataValidationConfig::new(&cfg);
        assert!(validation
            .drift_report_file_path
            .ends_with("drift_report/report.yaml"));
        assert_eq!(validation.drift_threshold, 0.05);

        let transformation = DataTransformationConfig::new(&cfg);
        assert!(transformation
            .transformed_object_file_path
            .ends_with("transformer/imputer.bin"));
        assert_eq!(transformation.knn_neighbors, 3);

        let trainer = ModelTrainerConfig::new(&cfg);
        assert!(trainer
            .trained_model_file_path
            .ends_with("trained_model/model.bin"));
        assert_eq!(trainer.expected_accuracy, 0.6);
    }
}
