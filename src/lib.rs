//! # phishnet: phishing-detection training and serving pipeline
//!
//! Pulls tabular network-traffic records from a document store, validates
//! and cleans them, imputes missing values, trains a catalog of classifier
//! candidates, selects the best performer, and serves predictions over HTTP.
//!
//! Data flows strictly forward through four stages, each handing a typed
//! artifact to the next:
//!
//! ```text
//! ingestion → validation → transformation → training
//! ```
//!
//! [`pipeline::TrainingPipeline`] sequences the stages;
//! [`predictor::CompositePredictor`] is the persisted serving unit.

// Foundation
pub mod config;
pub mod error;

// Data layer
pub mod data;
pub mod stats;

// Models & training
pub mod metrics;
pub mod models;
pub mod search;

// Pipeline
pub mod artifacts;
pub mod pipeline;
pub mod predictor;
pub mod stages;

// Serving boundary
pub mod serve;

// Re-exports
pub use artifacts::{
    DataIngestionArtifact, DataTransformationArtifact, DataValidationArtifact,
    ModelTrainerArtifact,
};
pub use config::TrainingPipelineConfig;
pub use error::{PipelineError, Stage};
pub use pipeline::{PipelineState, TrainingPipeline};
pub use predictor::CompositePredictor;
