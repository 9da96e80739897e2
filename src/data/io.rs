//! Storage primitives for the four artifact kinds: delimited text for data
//! splits, a binary array format for transformed matrices, an opaque
//! serialized-object format for fitted models, and structured key-value
//! text for reports.

use crate::data::frame::DataFrame;
use anyhow::{Context, Result, bail};
use ndarray::Array2;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Parse a CSV document (header row required) into a frame.
pub fn read_csv_str(content: &str) -> Result<DataFrame> {
    let mut lines = content.lines();
    let columns: Vec<String> = lines
        .next()
        .context("empty CSV document")?
        .split(',')
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    let mut rows = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        let row: Vec<Value> = line.split(',').map(parse_cell).collect();
        rows.push(row);
    }
    Ok(DataFrame::new(columns, rows))
}

pub fn read_csv(path: &Path) -> Result<DataFrame> {
    let content =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    read_csv_str(&content)
}

/// Write a frame as headered CSV, creating parent directories.
pub fn write_csv(path: &Path, frame: &DataFrame) -> Result<()> {
    let mut out = String::new();
    out.push_str(&frame.columns.join(","));
    out.push('\n');
    for row in &frame.rows {
        let line: Vec<String> = row.iter().map(render_cell).collect();
        out.push_str(&line.join(","));
        out.push('\n');
    }
    write_atomic(path, out.as_bytes())
}

fn parse_cell(raw: &str) -> Value {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() {
        return Value::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Ok(f) = s.parse::<f64>() {
        return serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(s.to_string()));
    }
    match s {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(s.to_string()),
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Persist a numeric matrix in the binary array format.
pub fn save_matrix(path: &Path, matrix: &Array2<f64>) -> Result<()> {
    let bytes = bincode::serialize(matrix).context("encode matrix")?;
    write_atomic(path, &bytes)
}

pub fn load_matrix(path: &Path) -> Result<Array2<f64>> {
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    bincode::deserialize(&bytes).with_context(|| format!("decode matrix {}", path.display()))
}

/// Persist a fitted object (imputer, composite predictor) in the opaque
/// serialized-object format.
pub fn save_object<T: Serialize>(path: &Path, object: &T) -> Result<()> {
    let bytes = bincode::serialize(object).context("encode object")?;
    write_atomic(path, &bytes)
}

pub fn load_object<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        bail!("object file does not exist: {}", path.display());
    }
    let bytes = fs::read(path).with_context(|| format!("read {}", path.display()))?;
    bincode::deserialize(&bytes).with_context(|| format!("decode object {}", path.display()))
}

/// Write structured key-value text (reports, schema fixtures).
pub fn write_yaml<T: Serialize>(path: &Path, content: &T) -> Result<()> {
    let text = serde_yaml::to_string(content).context("encode yaml")?;
    write_atomic(path, text.as_bytes())
}

pub fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text =
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("decode yaml {}", path.display()))
}

/// Create parent directories and write via a temp file + rename so partial
/// writes never land at the final path.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, bytes).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, path).with_context(|| format!("rename into {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_csv_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("splits").join("train.csv");

        let frame = DataFrame::new(
            vec!["a".into(), "b".into()],
            vec![
                vec![json!(1), json!(-1)],
                vec![Value::Null, json!(0.5)],
                vec![json!("web"), json!(3)],
            ],
        );
        write_csv(&path, &frame).unwrap();

        let loaded = read_csv(&path).unwrap();
        assert_eq!(loaded.columns, frame.columns);
        assert_eq!(loaded.rows[0], vec![json!(1), json!(-1)]);
        assert_eq!(loaded.rows[1][0], Value::Null);
        assert_eq!(loaded.rows[1][1], json!(0.5));
        assert_eq!(loaded.rows[2][0], json!("web"));
    }

    #[test]
    fn test_read_csv_str_rejects_empty() {
        assert!(read_csv_str("").is_err());
    }

    #[test]
    fn test_matrix_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("train.bin");
        let m = Array2::from_shape_vec((2, 3), vec![1.0, f64::NAN, 3.0, 4.0, 5.0, 6.0]).unwrap();
        save_matrix(&path, &m).unwrap();
        let back = load_matrix(&path).unwrap();
        assert_eq!(back.dim(), (2, 3));
        assert_eq!(back[[1, 2]], 6.0);
        assert!(back[[0, 1]].is_nan());
    }

    #[test]
    fn test_load_object_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = load_object::<Vec<f64>>(&dir.path().join("absent.bin")).unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
