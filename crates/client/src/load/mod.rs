//! Load stage: record sets into destination tables, full-replace semantics.
//!
//! Every write drops whatever the table held before. Table names must be
//! plain SQL identifiers. Both destinations compare column names without
//! regard to case, so columns such as `Name` and `name` are rejected before
//! anything is written.

pub mod mysql;
pub mod sqlite;

pub use mysql::MySqlSink;
pub use sqlite::SqliteSink;

use std::collections::HashMap;

use ferry_core::{DatabaseUri, Error, RecordSet};
use serde_json::Value;

/// Destination that can replace a table with a record set.
#[async_trait::async_trait]
pub trait TableSink: Send + Sync {
    /// Replace `table` with exactly the columns and rows of `records`.
    async fn replace_table(&self, table: &str, records: &RecordSet) -> Result<(), Error>;
}

/// Open the sink for `uri`'s driver: `sqlite`, or `mysql` with any `+<dbapi>` suffix.
pub async fn connect(uri: &DatabaseUri) -> Result<Box<dyn TableSink>, Error> {
    match uri.driver() {
        "sqlite" => Ok(Box::new(SqliteSink::connect(uri).await?)),
        driver if mysql::is_mysql_driver(driver) => Ok(Box::new(MySqlSink::connect(uri).await?)),
        other => Err(Error::UnsupportedDriver(other.to_string())),
    }
}

/// Write `records` to `table`, replacing any previous contents.
pub async fn load(records: &RecordSet, table: &str, sink: &dyn TableSink) -> Result<(), Error> {
    validate_table_name(table)?;
    validate_columns(records)?;
    sink.replace_table(table, records).await?;
    tracing::info!(table, rows = records.len(), columns = records.columns().len(), "table loaded");
    Ok(())
}

/// Accept `[A-Za-z_][A-Za-z0-9_]*`.
pub fn validate_table_name(table: &str) -> Result<(), Error> {
    let mut chars = table.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_') && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };

    if valid { Ok(()) } else { Err(Error::InvalidTableName(table.to_string())) }
}

/// Reject column names that collide once case is ignored.
pub fn validate_columns(records: &RecordSet) -> Result<(), Error> {
    let mut seen: HashMap<String, &str> = HashMap::new();
    for column in records.columns() {
        if let Some(previous) = seen.insert(column.to_lowercase(), column) {
            return Err(Error::InvalidColumns(format!("`{previous}` and `{column}` differ only in case")));
        }
    }
    Ok(())
}

/// Storage class shared by every value in a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Real,
    Text,
}

/// Column kind for the given values; nulls are ignored.
///
/// Integers outside the i64 range make the column text so no digits are lost.
pub fn column_kind<'a>(values: impl Iterator<Item = &'a Value>) -> ColumnKind {
    let mut seen_int = false;
    let mut seen_real = false;
    for value in values {
        match value {
            Value::Null => {}
            Value::Bool(_) => seen_int = true,
            Value::Number(n) if n.is_i64() => seen_int = true,
            Value::Number(n) if n.is_u64() => return ColumnKind::Text,
            Value::Number(_) => seen_real = true,
            _ => return ColumnKind::Text,
        }
    }
    match (seen_int, seen_real) {
        (_, true) => ColumnKind::Real,
        (true, false) => ColumnKind::Integer,
        (false, false) => ColumnKind::Text,
    }
}
