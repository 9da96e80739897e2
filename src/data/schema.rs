//! Dataset schema: the externally configured list of expected columns.

use crate::data::io;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Expected columns of the ingested dataset, loaded once per validation run.
/// Only the column count participates in validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetSchema {
    pub columns: Vec<String>,
    #[serde(default)]
    pub target_column: Option<String>,
}

impl DatasetSchema {
    pub fn load(path: &Path) -> Result<Self> {
        io::read_yaml(path)
    }

    pub fn expected_column_count(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_schema_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(
            &path,
            "columns:\n  - URL_Length\n  - SSLfinal_State\n  - Result\ntarget_column: Result\n",
        )
        .unwrap();

        let schema = DatasetSchema::load(&path).unwrap();
        assert_eq!(schema.expected_column_count(), 3);
        assert_eq!(schema.target_column.as_deref(), Some("Result"));
    }

    #[test]
    fn test_load_missing_schema_fails() {
        let dir = TempDir::new().unwrap();
        assert!(DatasetSchema::load(&dir.path().join("absent.yaml")).is_err());
    }

    #[test]
    fn test_repo_schema_has_target_last() {
        let schema = DatasetSchema::load(Path::new("schema/schema.yaml")).unwrap();
        assert_eq!(schema.expected_column_count(), 31);
        assert_eq!(schema.columns.last().map(String::as_str), Some("Result"));
    }
}
