//! Artifact hand-off types produced by each pipeline stage.
//!
//! Each artifact is an immutable record of file paths (and, for the trainer,
//! metrics) owned by the producing stage until handed to the next one.

use crate::metrics::ClassificationMetrics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output of data ingestion: the persisted train/test splits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub trained_file_path: PathBuf,
    pub test_file_path: PathBuf,
}

/// Output of data validation.
///
/// `validation_status` reflects the drift check over both splits. The
/// invalid paths are always `None`: no routing of divergent data exists,
/// the fields only mirror the artifact shape consumers expect.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub valid_train_file_path: PathBuf,
    pub valid_test_file_path: PathBuf,
    pub invalid_train_file_path: Option<PathBuf>,
    pub invalid_test_file_path: Option<PathBuf>,
    pub drift_report_file_path: PathBuf,
}

/// Output of data transformation: numeric matrices plus the fitted imputer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataTransformationArtifact {
    pub transformed_train_file_path: PathBuf,
    pub transformed_test_file_path: PathBuf,
    pub transformed_object_file_path: PathBuf,
}

/// Terminal artifact of the pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelTrainerArtifact {
    pub trained_model_file_path: PathBuf,
    pub train_metric_artifact: ClassificationMetrics,
    pub test_metric_artifact: ClassificationMetrics,
}
