//! Data validation: structural schema check and train/test drift detection.

use crate::artifacts::{DataIngestionArtifact, DataValidationArtifact};
use crate::config::DataValidationConfig;
use crate::data::{DataFrame, DatasetSchema, io};
use crate::error::{Result, Stage, StageContext};
use crate::stats::ks_2samp;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-column entry of the persisted drift report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriftEntry {
    pub p_value: f64,
    pub drift_status: bool,
}

pub type DriftReport = BTreeMap<String, DriftEntry>;

pub struct DataValidation {
    config: DataValidationConfig,
    ingestion_artifact: DataIngestionArtifact,
    schema: DatasetSchema,
}

impl DataValidation {
    /// The schema is external static configuration, loaded once per run.
    pub fn new(
        config: DataValidationConfig,
        ingestion_artifact: DataIngestionArtifact,
    ) -> Result<Self> {
        let schema =
            DatasetSchema::load(&config.schema_file_path).in_stage(Stage::Validation)?;
        Ok(Self {
            config,
            ingestion_artifact,
            schema,
        })
    }

    pub fn initiate(&self) -> Result<DataValidationArtifact> {
        tracing::info!("starting data validation");

        let train =
            io::read_csv(&self.ingestion_artifact.trained_file_path).in_stage(Stage::Validation)?;
        let test =
            io::read_csv(&self.ingestion_artifact.test_file_path).in_stage(Stage::Validation)?;

        // The column-count check reports but does not currently gate the
        // run or route rows to the invalid paths.
        if !self.validate_column_count(&train) {
            tracing::warn!(
                found = train.column_count(),
                expected = self.schema.expected_column_count(),
                "training split column count does not match schema"
            );
        }
        if !self.validate_column_count(&test) {
            tracing::warn!(
                found = test.column_count(),
                expected = self.schema.expected_column_count(),
                "testing split column count does not match schema"
            );
        }

        let validation_status = self.detect_dataset_drift(&train, &test)?;

        io::write_csv(&self.config.valid_train_file_path, &train)
            .in_stage(Stage::Validation)?;
        io::write_csv(&self.config.valid_test_file_path, &test).in_stage(Stage::Validation)?;

        Ok(DataValidationArtifact {
            validation_status,
            valid_train_file_path: self.config.valid_train_file_path.clone(),
            valid_test_file_path: self.config.valid_test_file_path.clone(),
            invalid_train_file_path: None,
            invalid_test_file_path: None,
            drift_report_file_path: self.config.drift_report_file_path.clone(),
        })
    }

    fn validate_column_count(&self, frame: &DataFrame) -> bool {
        frame.column_count() == self.schema.expected_column_count()
    }

    /// Run the two-sample KS test on every column shared by both splits,
    /// persist the report, and return the overall no-drift status.
    fn detect_dataset_drift(&self, train: &DataFrame, test: &DataFrame) -> Result<bool> {
        let mut report = DriftReport::new();
        let mut status = true;

        for (train_idx, column) in train.columns.iter().enumerate() {
            let Some(test_idx) = test.column_index(column) else {
                continue;
            };
            let train_values: Vec<f64> = train
                .numeric_column(train_idx)
                .into_iter()
                .filter(|v| v.is_finite())
                .collect();
            let test_values: Vec<f64> = test
                .numeric_column(test_idx)
                .into_iter()
                .filter(|v| v.is_finite())
                .collect();

            let Some(result) = ks_2samp(&train_values, &test_values) else {
                tracing::debug!(column = %column, "skipping drift check, no numeric values");
                continue;
            };

            let drifted = result.p_value < self.config.drift_threshold;
            if drifted {
                status = false;
            }
            report.insert(
                column.clone(),
                DriftEntry {
                    p_value: result.p_value,
                    drift_status: drifted,
                },
            );
        }

        io::write_yaml(&self.config.drift_report_file_path, &report)
            .in_stage(Stage::Validation)?;
        tracing::info!(
            columns = report.len(),
            drift_free = status,
            "persisted drift report"
        );
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DataIngestionConfig, TrainingPipelineConfig};
    use crate::data::io::write_csv;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn schema_fixture(dir: &Path, columns: &[&str]) -> std::path::PathBuf {
        let path = dir.join("schema.yaml");
        let schema = DatasetSchema {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            target_column: None,
        };
        crate::data::io::write_yaml(&path, &schema).unwrap();
        path
    }

    fn frame_of(column: &str, values: Vec<f64>) -> DataFrame {
        DataFrame::new(
            vec![column.into()],
            values.into_iter().map(|v| vec![json!(v)]).collect(),
        )
    }

    fn validation_for(
        dir: &TempDir,
        train: &DataFrame,
        test: &DataFrame,
        schema_columns: &[&str],
    ) -> DataValidation {
        let pipeline = TrainingPipelineConfig::rooted(dir.path(), chrono::Utc::now());
        let ingestion_config = DataIngestionConfig::new(&pipeline);
        write_csv(&ingestion_config.training_file_path, train).unwrap();
        write_csv(&ingestion_config.testing_file_path, test).unwrap();

        let mut config = DataValidationConfig::new(&pipeline);
        config.schema_file_path = schema_fixture(dir.path(), schema_columns);

        DataValidation::new(
            config,
            DataIngestionArtifact {
                trained_file_path: ingestion_config.training_file_path,
                test_file_path: ingestion_config.testing_file_path,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_identical_distributions_pass() {
        let dir = TempDir::new().unwrap();
        let values: Vec<f64> = (0..200).map(|i| (i % 13) as f64).collect();
        let train = frame_of("web_traffic", values.clone());
        let test = frame_of("web_traffic", values);

        let validation = validation_for(&dir, &train, &test, &["web_traffic"]);
        let artifact = validation.initiate().unwrap();
        assert!(artifact.validation_status);
        assert!(artifact.invalid_train_file_path.is_none());

        let report: DriftReport =
            crate::data::io::read_yaml(&artifact.drift_report_file_path).unwrap();
        let entry = report["web_traffic"];
        assert!(entry.p_value >= 0.05);
        assert!(!entry.drift_status);
    }

    #[test]
    fn test_disjoint_distributions_flag_drift() {
        let dir = TempDir::new().unwrap();
        let train = frame_of("web_traffic", (0..150).map(|i| i as f64 / 150.0).collect());
        let test = frame_of(
            "web_traffic",
            (0..150).map(|i| 100.0 + i as f64 / 150.0).collect(),
        );

        let validation = validation_for(&dir, &train, &test, &["web_traffic"]);
        let artifact = validation.initiate().unwrap();
        assert!(!artifact.validation_status);

        let report: DriftReport =
            crate::data::io::read_yaml(&artifact.drift_report_file_path).unwrap();
        let entry = report["web_traffic"];
        assert!(entry.p_value < 0.05);
        assert!(entry.drift_status);
    }

    #[test]
    fn test_column_count_mismatch_does_not_gate_the_run() {
        let dir = TempDir::new().unwrap();
        let values: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let train = frame_of("web_traffic", values.clone());
        let test = frame_of("web_traffic", values);

        // Schema expects two columns; the splits carry one.
        let validation = validation_for(&dir, &train, &test, &["web_traffic", "Page_Rank"]);
        let artifact = validation.initiate().unwrap();
        assert!(artifact.validation_status);
        assert!(artifact.valid_train_file_path.exists());
    }

    #[test]
    fn test_missing_split_fails_in_validation_stage() {
        let dir = TempDir::new().unwrap();
        let pipeline = TrainingPipelineConfig::rooted(dir.path(), chrono::Utc::now());
        let mut config = DataValidationConfig::new(&pipeline);
        config.schema_file_path = schema_fixture(dir.path(), &["web_traffic"]);

        let validation = DataValidation::new(
            config,
            DataIngestionArtifact {
                trained_file_path: dir.path().join("absent").join("train.csv"),
                test_file_path: dir.path().join("absent").join("test.csv"),
            },
        )
        .unwrap();
        let err = validation.initiate().unwrap_err();
        assert_eq!(err.stage, Stage::Validation);
    }
}
