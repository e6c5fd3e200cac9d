//! SQLite destination.
//!
//! ### Column types
//! - INTEGER for integers and booleans
//! - REAL for floats, or a mix of integers and floats
//! - TEXT for strings, nested arrays/objects (as JSON), integers beyond the
//!   i64 range (as decimal text) and anything mixed
//!
//! Drop, create and insert run in one transaction.

use ferry_core::{DatabaseUri, Error, RecordSet};
use serde_json::{Map, Number, Value};
use tokio_rusqlite::Connection;
use tokio_rusqlite::rusqlite::params_from_iter;
use tokio_rusqlite::rusqlite::types::Value as SqlValue;

use super::{ColumnKind, TableSink, column_kind};

/// Table sink over a SQLite database.
#[derive(Clone, Debug)]
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Connect to the database named by a `sqlite://` URI.
    ///
    /// The database segment is the file path; `:memory:` opens a private
    /// in-memory database. Credentials are accepted and ignored.
    pub async fn connect(uri: &DatabaseUri) -> Result<Self, Error> {
        if uri.driver() != "sqlite" {
            return Err(Error::UnsupportedDriver(uri.driver().to_string()));
        }

        tracing::debug!(destination = %uri, "connecting to destination");
        let database = uri.database();
        if database == ":memory:" {
            return Self::open_in_memory().await;
        }

        let conn = Connection::open(&*database)
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Ok(Self { conn })
    }

    /// Open an in-memory destination for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Ok(Self { conn })
    }

    /// Names of all user tables, sorted.
    pub async fn table_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
                )?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    /// Read a table back as a record set, rows in insertion order.
    pub async fn read_table(&self, table: &str) -> Result<RecordSet, Error> {
        super::validate_table_name(table)?;
        let sql = format!("SELECT * FROM {} ORDER BY rowid", quote_ident(table));

        self.conn
            .call(move |conn| -> Result<RecordSet, Error> {
                let mut stmt = conn.prepare(&sql)?;
                let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

                let mut records = Vec::new();
                let mut rows = stmt.query([])?;
                while let Some(row) = rows.next()? {
                    let mut record = Map::new();
                    for (i, column) in columns.iter().enumerate() {
                        record.insert(column.clone(), from_sql(row.get::<_, SqlValue>(i)?));
                    }
                    records.push(record);
                }

                Ok(RecordSet::from_records(&records))
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl TableSink for SqliteSink {
    async fn replace_table(&self, table: &str, records: &RecordSet) -> Result<(), Error> {
        let table = quote_ident(table);
        let columns = records.columns().to_vec();
        let rows = records.rows().to_vec();

        if columns.is_empty() {
            tracing::warn!(table = %table, "record set has no columns; dropping table without recreating it");
        }

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                tx.execute_batch(&format!("DROP TABLE IF EXISTS {table}"))?;

                if !columns.is_empty() {
                    let definitions = columns
                        .iter()
                        .enumerate()
                        .map(|(i, name)| format!("{} {}", quote_ident(name), column_type(rows.iter().map(|r| &r[i]))))
                        .collect::<Vec<_>>()
                        .join(", ");
                    tx.execute_batch(&format!("CREATE TABLE {table} ({definitions})"))?;

                    let placeholders = (1..=columns.len())
                        .map(|i| format!("?{i}"))
                        .collect::<Vec<_>>()
                        .join(", ");
                    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
                    let mut insert =
                        tx.prepare(&format!("INSERT INTO {table} ({column_list}) VALUES ({placeholders})"))?;
                    for row in &rows {
                        insert.execute(params_from_iter(row.iter().map(to_sql)))?;
                    }
                }

                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }
}

/// Double-quote an identifier, doubling embedded quotes.
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Declared type for a column given its values.
fn column_type<'a>(values: impl Iterator<Item = &'a Value>) -> &'static str {
    match column_kind(values) {
        ColumnKind::Integer => "INTEGER",
        ColumnKind::Real => "REAL",
        ColumnKind::Text => "TEXT",
    }
}

fn to_sql(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Integer(i),
            None if n.is_u64() => SqlValue::Text(n.to_string()),
            None => n.as_f64().map(SqlValue::Real).unwrap_or(SqlValue::Null),
        },
        Value::String(s) => SqlValue::Text(s.clone()),
        nested => SqlValue::Text(nested.to_string()),
    }
}

fn from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(b) => Value::String(String::from_utf8_lossy(&b).into_owned()),
    }
}
