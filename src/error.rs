//! Error type for the phishnet pipeline.
//!
//! Every failure in the system (storage, connectivity, schema, statistics,
//! model fitting) is wrapped into the single [`PipelineError`] kind, tagged
//! with the stage it originated from and the raise site captured through
//! `#[track_caller]`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::panic::Location;
use thiserror::Error;

/// The pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Ingestion,
    Validation,
    Transformation,
    Training,
    Serving,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Ingestion => "data ingestion",
            Stage::Validation => "data validation",
            Stage::Transformation => "data transformation",
            Stage::Training => "model training",
            Stage::Serving => "serving",
        };
        f.write_str(name)
    }
}

/// The single error kind used throughout the pipeline.
#[derive(Debug, Error)]
#[error("{stage} failed at {}:{}: {message}", .location.file(), .location.line())]
pub struct PipelineError {
    pub stage: Stage,
    pub message: String,
    pub location: &'static Location<'static>,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl PipelineError {
    /// Build an error from a plain message.
    #[track_caller]
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        Self {
            stage,
            message: message.into(),
            location: Location::caller(),
            source: None,
        }
    }

    /// Wrap an underlying cause, keeping it as the error source.
    #[track_caller]
    pub fn wrap<E>(stage: Stage, source: E) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let source = source.into();
        Self {
            stage,
            message: source.to_string(),
            location: Location::caller(),
            source: Some(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;

/// Extension for wrapping leaf errors into [`PipelineError`] at stage
/// boundaries.
pub trait StageContext<T> {
    fn in_stage(self, stage: Stage) -> Result<T>;
}

impl<T, E> StageContext<T> for std::result::Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    #[track_caller]
    fn in_stage(self, stage: Stage) -> Result<T> {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Err(PipelineError::wrap(stage, e)),
        }
    }
}
