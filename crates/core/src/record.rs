//! Tabular projection of JSON documents.
//!
//! ### Flattening
//! - Nested objects become dotted column names (`b.c`)
//! - Empty nested objects contribute no column
//! - Arrays inside objects stay as a single JSON cell
//! - A top-level array yields one row per element
//! - Scalars (top-level or as array elements) land in a `value` column
//!
//! Columns are the union of every flattened key, in order of first
//! appearance. Cells missing from a row are `null`.

use serde_json::{Map, Value};

/// Column name used for scalar rows.
pub const SCALAR_COLUMN: &str = "value";

const SEPARATOR: char = '.';

/// Ordered columns and rows produced from one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordSet {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl RecordSet {
    /// Flatten a document into rows and columns.
    pub fn from_document(document: &Value) -> Self {
        let records: Vec<Map<String, Value>> = match document {
            Value::Array(items) => items.iter().map(flatten_row).collect(),
            other => vec![flatten_row(other)],
        };
        Self::from_records(&records)
    }

    /// Rebuild a record set from a list of flat records.
    pub fn from_records(records: &[Map<String, Value>]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for record in records {
            for key in record.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let rows = records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(Value::Null))
                    .collect()
            })
            .collect();

        Self { columns, rows }
    }

    /// One map per row, every column present.
    pub fn to_records(&self) -> Vec<Map<String, Value>> {
        (0..self.rows.len()).filter_map(|i| self.record(i)).collect()
    }

    /// Row `index` as a column -> value map.
    pub fn record(&self, index: usize) -> Option<Map<String, Value>> {
        let row = self.rows.get(index)?;
        Some(self.columns.iter().cloned().zip(row.iter().cloned()).collect())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn flatten_row(value: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    match value {
        Value::Object(map) => flatten_into(None, map, &mut out),
        scalar => {
            out.insert(SCALAR_COLUMN.to_string(), scalar.clone());
        }
    }
    out
}

fn flatten_into(prefix: Option<&str>, map: &Map<String, Value>, out: &mut Map<String, Value>) {
    for (key, value) in map {
        let column = match prefix {
            Some(p) => format!("{p}{SEPARATOR}{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(Some(&column), nested, out),
            other => {
                out.insert(column, other.clone());
            }
        }
    }
}
