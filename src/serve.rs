//! HTTP serving boundary: re-run training, or predict over uploaded rows.
//!
//! Both handlers delegate to the pipeline and the persisted composite
//! predictor; failures surface as generic 500s.

use crate::config::{TARGET_COLUMN, TrainingPipelineConfig};
use crate::data::{SqliteDocumentStore, io};
use crate::pipeline::TrainingPipeline;
use crate::predictor::CompositePredictor;
use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    /// Root for artifact trees and the saved model directory.
    pub workspace_root: PathBuf,
    /// Root of the SQLite document store.
    pub store_root: PathBuf,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/train", get(train_handler))
        .route("/predict", post(predict_handler))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, state: AppState) -> Result<()> {
    let app = router(Arc::new(state));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("bind {addr}"))?;
    tracing::info!(%addr, "serving training and prediction endpoints");
    axum::serve(listener, app).await.context("serve")?;
    Ok(())
}

async fn train_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let workspace = state.workspace_root.clone();
    let store_root = state.store_root.clone();
    let outcome = tokio::task::spawn_blocking(move || {
        let config = TrainingPipelineConfig::rooted(&workspace, chrono::Utc::now());
        let store = Arc::new(SqliteDocumentStore::new(store_root));
        TrainingPipeline::new(config, store).run_pipeline()
    })
    .await;

    match outcome {
        Ok(Ok(_artifact)) => (StatusCode::OK, "Training successful").into_response(),
        Ok(Err(error)) => {
            tracing::error!(%error, "training run failed");
            internal_error()
        }
        Err(error) => {
            tracing::error!(%error, "training task panicked");
            internal_error()
        }
    }
}

async fn predict_handler(
    State(state): State<Arc<AppState>>,
    body: String,
) -> impl IntoResponse {
    let model_path = TrainingPipelineConfig::rooted(&state.workspace_root, chrono::Utc::now())
        .saved_model_path();
    match predict_table(&model_path, &body) {
        Ok(table) => Json(table).into_response(),
        Err(error) => {
            tracing::error!(%error, "prediction failed");
            internal_error()
        }
    }
}

/// Predict over a CSV document and render the table with a
/// `predicted_column` appended.
pub fn predict_table(model_path: &Path, csv_text: &str) -> Result<Value> {
    let mut frame = io::read_csv_str(csv_text)?;
    frame.drop_column(TARGET_COLUMN);

    let predictor = CompositePredictor::load(model_path)?;
    let matrix = frame.to_matrix();
    let predictions = predictor.predict(matrix.view())?;

    let mut columns = frame.columns.clone();
    columns.push("predicted_column".to_string());
    let rows: Vec<Vec<Value>> = frame
        .rows
        .iter()
        .zip(predictions.iter())
        .map(|(row, prediction)| {
            let mut out = row.clone();
            out.push(json!(prediction));
            out
        })
        .collect();

    Ok(json!({ "columns": columns, "rows": rows }))
}

fn internal_error() -> axum::response::Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
}
