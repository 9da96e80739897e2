//! phishnet CLI: run the training pipeline, serve predictions, or seed the
//! document store from a CSV file.

use anyhow::{Context, Result};
use clap::Parser;
use phishnet::config::{INGESTION_COLLECTION_NAME, INGESTION_DATABASE_NAME};
use phishnet::data::{SqliteDocumentStore, io};
use phishnet::serve::{AppState, serve};
use phishnet::{TrainingPipeline, TrainingPipelineConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Phishing-detection training and serving pipeline
#[derive(Parser, Debug)]
#[command(name = "phishnet", version, about, long_about = None)]
struct Cli {
    /// Root directory for artifact trees and saved models
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Document store root (defaults to $PHISHNET_STORE_ROOT, then ./store)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the full training pipeline once
    Train,
    /// Serve the training and prediction endpoints
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Load a CSV file (header row required) into the document store
    Push {
        file: PathBuf,
        #[arg(long, default_value = INGESTION_DATABASE_NAME)]
        database: String,
        #[arg(long, default_value = INGESTION_COLLECTION_NAME)]
        collection: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let store_root = cli.store.clone().unwrap_or_else(|| {
        std::env::var("PHISHNET_STORE_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("store"))
    });

    match cli.command {
        Commands::Train => {
            let workspace = cli.workspace.clone();
            let artifact = tokio::task::spawn_blocking(move || {
                let config = TrainingPipelineConfig::rooted(&workspace, chrono::Utc::now());
                let store = Arc::new(SqliteDocumentStore::new(store_root));
                TrainingPipeline::new(config, store).run_pipeline()
            })
            .await
            .context("training task")??;

            println!(
                "trained model: {}",
                artifact.trained_model_file_path.display()
            );
            println!(
                "test metrics: precision {:.4}, recall {:.4}, f1 {:.4}",
                artifact.test_metric_artifact.precision,
                artifact.test_metric_artifact.recall,
                artifact.test_metric_artifact.f1_score,
            );
        }
        Commands::Serve { host, port } => {
            let addr: SocketAddr = format!("{host}:{port}")
                .parse()
                .with_context(|| format!("invalid listen address {host}:{port}"))?;
            serve(
                addr,
                AppState {
                    workspace_root: cli.workspace.clone(),
                    store_root,
                },
            )
            .await?;
        }
        Commands::Push {
            file,
            database,
            collection,
        } => {
            let frame = io::read_csv(&file)?;
            let documents: Vec<serde_json::Map<String, serde_json::Value>> = frame
                .rows
                .iter()
                .map(|row| {
                    frame
                        .columns
                        .iter()
                        .cloned()
                        .zip(row.iter().cloned())
                        .collect()
                })
                .collect();
            let store = SqliteDocumentStore::new(store_root);
            let inserted = store.insert_many(&database, &collection, &documents)?;
            println!("inserted {inserted} documents into {database}.{collection}");
        }
    }
    Ok(())
}
