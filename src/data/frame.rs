//! In-memory tabular structure passed between pipeline stages.

use ndarray::Array2;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A table of named columns over loosely typed rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFrame {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl DataFrame {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Build a frame from document-store records. Column order is the
    /// first-seen order across documents; absent fields become null.
    pub fn from_documents(documents: Vec<Map<String, Value>>) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for doc in &documents {
            for key in doc.keys() {
                if !columns.iter().any(|c| c == key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = documents
            .into_iter()
            .map(|mut doc| {
                columns
                    .iter()
                    .map(|col| doc.remove(col).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// Drop a column by name. Returns whether it was present.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            if idx < row.len() {
                row.remove(idx);
            }
        }
        true
    }

    /// Remove a column and return its values, padding short rows with null.
    pub fn take_column(&mut self, name: &str) -> Option<Vec<Value>> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        let mut values = Vec::with_capacity(self.rows.len());
        for row in &mut self.rows {
            if idx < row.len() {
                values.push(row.remove(idx));
            } else {
                values.push(Value::Null);
            }
        }
        Some(values)
    }

    /// Replace every cell matching a literal string with null.
    pub fn null_out_literal(&mut self, literal: &str) {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                if cell.as_str() == Some(literal) {
                    *cell = Value::Null;
                }
            }
        }
    }

    /// All values of one column as `f64`, non-numeric cells as NaN.
    pub fn numeric_column(&self, index: usize) -> Vec<f64> {
        self.rows
            .iter()
            .map(|row| row.get(index).map_or(f64::NAN, value_to_f64))
            .collect()
    }

    /// The whole frame as an `f64` matrix; missing and non-numeric cells
    /// become NaN.
    pub fn to_matrix(&self) -> Array2<f64> {
        let (n, p) = (self.row_count(), self.column_count());
        let mut data = Vec::with_capacity(n * p);
        for row in &self.rows {
            for j in 0..p {
                data.push(row.get(j).map_or(f64::NAN, value_to_f64));
            }
        }
        Array2::from_shape_vec((n, p), data).expect("row-major dims match collected data")
    }
}

/// Numeric view of a single cell. Numbers and numeric strings parse;
/// everything else (including null) is NaN.
pub fn value_to_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().unwrap_or(f64::NAN),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(f64::NAN),
        Value::Bool(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
        _ => f64::NAN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn doc(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_from_documents_union_columns() {
        let frame = DataFrame::from_documents(vec![
            doc(&[("a", json!(1)), ("b", json!(2))]),
            doc(&[("a", json!(3)), ("c", json!(4))]),
        ]);
        assert_eq!(frame.columns, vec!["a", "b", "c"]);
        assert_eq!(frame.rows[0], vec![json!(1), json!(2), Value::Null]);
        assert_eq!(frame.rows[1], vec![json!(3), Value::Null, json!(4)]);
    }

    #[test]
    fn test_drop_and_take_column() {
        let mut frame = DataFrame::new(
            vec!["x".into(), "y".into()],
            vec![vec![json!(1), json!(10)], vec![json!(2), json!(20)]],
        );
        let target = frame.take_column("y").unwrap();
        assert_eq!(target, vec![json!(10), json!(20)]);
        assert_eq!(frame.columns, vec!["x"]);
        assert!(!frame.drop_column("y"));
        assert!(frame.drop_column("x"));
        assert_eq!(frame.column_count(), 0);
    }

    #[test]
    fn test_null_out_literal() {
        let mut frame = DataFrame::new(
            vec!["x".into()],
            vec![vec![json!("na")], vec![json!("5")], vec![json!(7)]],
        );
        frame.null_out_literal("na");
        assert_eq!(frame.rows[0][0], Value::Null);
        assert_eq!(frame.rows[1][0], json!("5"));
    }

    #[test]
    fn test_to_matrix_with_missing() {
        let frame = DataFrame::new(
            vec!["x".into(), "y".into()],
            vec![
                vec![json!(1.5), Value::Null],
                vec![json!("2"), json!(-1)],
            ],
        );
        let m = frame.to_matrix();
        assert_eq!(m.dim(), (2, 2));
        assert_eq!(m[[0, 0]], 1.5);
        assert!(m[[0, 1]].is_nan());
        assert_eq!(m[[1, 0]], 2.0);
        assert_eq!(m[[1, 1]], -1.0);
    }
}
