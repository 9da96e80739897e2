//! Data ingestion: document store → feature store snapshot → train/test split.

use crate::artifacts::DataIngestionArtifact;
use crate::config::DataIngestionConfig;
use crate::data::{DataFrame, DocumentStore, io};
use crate::error::{PipelineError, Result, Stage, StageContext};
use rand::Rng;
use rand::seq::SliceRandom;
use std::sync::Arc;

pub struct DataIngestion {
    config: DataIngestionConfig,
    store: Arc<dyn DocumentStore>,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self { config, store }
    }

    pub fn initiate(&self) -> Result<DataIngestionArtifact> {
        tracing::info!(
            database = %self.config.database_name,
            collection = %self.config.collection_name,
            "starting data ingestion"
        );

        let ratio = self.config.train_test_split_ratio;
        if !(0.0..1.0).contains(&ratio) || ratio == 0.0 {
            return Err(PipelineError::new(
                Stage::Ingestion,
                format!("train/test split ratio must be in (0, 1), got {ratio}"),
            ));
        }

        let frame = self.export_collection_as_frame()?;
        io::write_csv(&self.config.feature_store_file_path, &frame)
            .in_stage(Stage::Ingestion)?;
        tracing::info!(
            rows = frame.row_count(),
            columns = frame.column_count(),
            "persisted feature store snapshot"
        );

        let (train, test) = split_train_test(frame, ratio, &mut rand::thread_rng());
        io::write_csv(&self.config.training_file_path, &train).in_stage(Stage::Ingestion)?;
        io::write_csv(&self.config.testing_file_path, &test).in_stage(Stage::Ingestion)?;
        tracing::info!(
            train_rows = train.row_count(),
            test_rows = test.row_count(),
            "exported train/test split"
        );

        Ok(DataIngestionArtifact {
            trained_file_path: self.config.training_file_path.clone(),
            test_file_path: self.config.testing_file_path.clone(),
        })
    }

    fn export_collection_as_frame(&self) -> Result<DataFrame> {
        let documents = self
            .store
            .fetch_all(&self.config.database_name, &self.config.collection_name)
            .in_stage(Stage::Ingestion)?;
        if documents.is_empty() {
            return Err(PipelineError::new(
                Stage::Ingestion,
                format!(
                    "collection {}.{} returned no documents",
                    self.config.database_name, self.config.collection_name
                ),
            ));
        }

        let mut frame = DataFrame::from_documents(documents);
        frame.drop_column("_id");
        frame.null_out_literal("na");
        Ok(frame)
    }
}

/// Random row split; the test side gets `ceil(n * test_fraction)` rows.
pub fn split_train_test(
    frame: DataFrame,
    test_fraction: f64,
    rng: &mut impl Rng,
) -> (DataFrame, DataFrame) {
    let n = frame.row_count();
    let test_count = ((n as f64 * test_fraction).ceil() as usize).min(n);

    let mut indices: Vec<usize> = (0..n).collect();
    indices.shuffle(rng);

    let mut test_rows = Vec::with_capacity(test_count);
    let mut train_rows = Vec::with_capacity(n - test_count);
    for (position, &row_index) in indices.iter().enumerate() {
        if position < test_count {
            test_rows.push(frame.rows[row_index].clone());
        } else {
            train_rows.push(frame.rows[row_index].clone());
        }
    }

    (
        DataFrame::new(frame.columns.clone(), train_rows),
        DataFrame::new(frame.columns, test_rows),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use serde_json::{Map, Value, json};

    struct InMemoryStore {
        documents: Vec<Map<String, Value>>,
    }

    impl DocumentStore for InMemoryStore {
        fn fetch_all(
            &self,
            _database: &str,
            _collection: &str,
        ) -> anyhow::Result<Vec<Map<String, Value>>> {
            if self.documents.is_empty() {
                bail!("connection refused");
            }
            Ok(self.documents.clone())
        }
    }

    fn doc(id: i64, url_length: Value, result: i64) -> Map<String, Value> {
        let mut m = Map::new();
        m.insert("_id".into(), json!(id));
        m.insert("URL_Length".into(), url_length);
        m.insert("Result".into(), json!(result));
        m
    }

    #[test]
    fn test_split_counts_for_various_ratios() {
        let columns = vec!["x".into()];
        for ratio in [0.1, 0.2, 0.33, 0.5, 0.9] {
            let rows: Vec<Vec<Value>> = (0..1000).map(|i| vec![json!(i)]).collect();
            let frame = DataFrame::new(columns.clone(), rows);
            let mut rng = StdRng::seed_from_u64(99);
            let (train, test) = split_train_test(frame, ratio, &mut rng);

            let expected_test = (1000.0_f64 * ratio).ceil() as usize;
            assert_eq!(test.row_count(), expected_test);
            assert_eq!(train.row_count() + test.row_count(), 1000);
        }
    }

    #[test]
    fn test_split_is_a_partition() {
        let rows: Vec<Vec<Value>> = (0..50).map(|i| vec![json!(i)]).collect();
        let frame = DataFrame::new(vec!["x".into()], rows);
        let mut rng = StdRng::seed_from_u64(5);
        let (train, test) = split_train_test(frame, 0.2, &mut rng);

        let mut seen: Vec<i64> = train
            .rows
            .iter()
            .chain(test.rows.iter())
            .map(|r| r[0].as_i64().unwrap())
            .collect();
        seen.sort_unstable();
        assert_eq!(seen, (0..50).collect::<Vec<i64>>());
    }

    #[test]
    fn test_export_drops_id_and_normalizes_na() {
        let store = InMemoryStore {
            documents: vec![doc(1, json!("na"), -1), doc(2, json!(40), 1)],
        };
        let pipeline = crate::config::TrainingPipelineConfig::rooted(
            std::path::Path::new("/tmp/unused"),
            chrono::Utc::now(),
        );
        let ingestion = DataIngestion::new(
            crate::config::DataIngestionConfig::new(&pipeline),
            Arc::new(store),
        );
        let frame = ingestion.export_collection_as_frame().unwrap();
        assert!(frame.column_index("_id").is_none());
        let url_idx = frame.column_index("URL_Length").unwrap();
        assert_eq!(frame.rows[0][url_idx], Value::Null);
        assert_eq!(frame.rows[1][url_idx], json!(40));
    }

    #[test]
    fn test_store_failure_maps_to_ingestion_stage() {
        let store = InMemoryStore { documents: vec![] };
        let pipeline = crate::config::TrainingPipelineConfig::rooted(
            std::path::Path::new("/tmp/unused"),
            chrono::Utc::now(),
        );
        let ingestion = DataIngestion::new(
            crate::config::DataIngestionConfig::new(&pipeline),
            Arc::new(store),
        );
        let err = ingestion.initiate().unwrap_err();
        assert_eq!(err.stage, Stage::Ingestion);
    }
}
