//! Training pipeline orchestrator: a linear state machine over the four
//! stages, threading each artifact into the next stage.

use crate::artifacts::ModelTrainerArtifact;
use crate::config::{
    DataIngestionConfig, DataTransformationConfig, DataValidationConfig, ModelTrainerConfig,
    TrainingPipelineConfig,
};
use crate::data::DocumentStore;
use crate::error::{Result, Stage, StageContext};
use crate::stages::{DataIngestion, DataTransformation, DataValidation, ModelTrainer};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Run state. Transitions are linear; any stage error moves the run
/// directly to `Failed`. There is no resume or retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Ingesting,
    Validating,
    Transforming,
    Training,
    Done,
    Failed,
}

pub struct TrainingPipeline {
    config: TrainingPipelineConfig,
    store: Arc<dyn DocumentStore>,
    state: PipelineState,
}

impl TrainingPipeline {
    pub fn new(config: TrainingPipelineConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            store,
            state: PipelineState::Ingesting,
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn config(&self) -> &TrainingPipelineConfig {
        &self.config
    }

    /// Execute the full run. Blocking; returns the terminal artifact.
    pub fn run_pipeline(&mut self) -> Result<ModelTrainerArtifact> {
        tracing::info!(
            pipeline = %self.config.pipeline_name,
            run = %self.config.timestamp,
            "starting training pipeline run"
        );
        match self.execute() {
            Ok(artifact) => {
                self.state = PipelineState::Done;
                tracing::info!(
                    model = %artifact.trained_model_file_path.display(),
                    "training pipeline run finished"
                );
                Ok(artifact)
            }
            Err(error) => {
                self.state = PipelineState::Failed;
                tracing::error!(%error, "training pipeline run failed");
                Err(error)
            }
        }
    }

    fn execute(&mut self) -> Result<ModelTrainerArtifact> {
        self.state = PipelineState::Ingesting;
        let ingestion = DataIngestion::new(
            DataIngestionConfig::new(&self.config),
            Arc::clone(&self.store),
        );
        let ingestion_artifact = ingestion.initiate()?;

        self.state = PipelineState::Validating;
        let validation =
            DataValidation::new(DataValidationConfig::new(&self.config), ingestion_artifact)?;
        let validation_artifact = validation.initiate()?;

        self.state = PipelineState::Transforming;
        let transformation = DataTransformation::new(
            DataTransformationConfig::new(&self.config),
            validation_artifact,
        );
        let transformation_artifact = transformation.initiate()?;

        self.state = PipelineState::Training;
        let trainer = ModelTrainer::new(
            ModelTrainerConfig::new(&self.config),
            transformation_artifact,
        );
        let trainer_artifact = trainer.initiate()?;

        // Publish the composite predictor at the stable serving path.
        let saved_model_path = self.config.saved_model_path();
        if let Some(parent) = saved_model_path.parent() {
            std::fs::create_dir_all(parent).in_stage(Stage::Training)?;
        }
        std::fs::copy(&trainer_artifact.trained_model_file_path, &saved_model_path)
            .in_stage(Stage::Training)?;

        Ok(trainer_artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use serde_json::{Map, Value};

    struct FailingStore;

    impl DocumentStore for FailingStore {
        fn fetch_all(
            &self,
            _database: &str,
            _collection: &str,
        ) -> anyhow::Result<Vec<Map<String, Value>>> {
            bail!("connection refused")
        }
    }

    #[test]
    fn test_failed_run_transitions_to_failed() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = TrainingPipelineConfig::rooted(dir.path(), chrono::Utc::now());
        let mut pipeline = TrainingPipeline::new(config, Arc::new(FailingStore));
        assert_eq!(pipeline.state(), PipelineState::Ingesting);

        let err = pipeline.run_pipeline().unwrap_err();
        assert_eq!(err.stage, Stage::Ingestion);
        assert_eq!(pipeline.state(), PipelineState::Failed);
    }
}
