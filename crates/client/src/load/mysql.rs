//! MySQL destination.
//!
//! ### Column types
//! - BIGINT for integers and booleans
//! - DOUBLE for floats, or a mix of integers and floats
//! - LONGTEXT for strings, nested arrays/objects (as JSON), integers beyond
//!   the i64 range (as decimal text) and anything mixed
//!
//! MySQL commits `DROP TABLE` and `CREATE TABLE` implicitly, so only the
//! inserts share a transaction.

use ferry_core::{DatabaseUri, Error, RecordSet};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};
use sqlx::{AssertSqlSafe, MySql, QueryBuilder};

use super::{ColumnKind, TableSink, column_kind};

const DEFAULT_PORT: u16 = 3306;

/// Placeholder limit of a single MySQL prepared statement.
const MAX_BIND_PARAMS: usize = 65_535;

/// `mysql`, or `mysql+<dbapi>` as written in SQLAlchemy-style URIs.
pub fn is_mysql_driver(driver: &str) -> bool {
    driver == "mysql" || driver.starts_with("mysql+")
}

/// Table sink over a MySQL database.
#[derive(Clone, Debug)]
pub struct MySqlSink {
    pool: MySqlPool,
}

impl MySqlSink {
    /// Connect with the host, port, credentials and database named by `uri`.
    pub async fn connect(uri: &DatabaseUri) -> Result<Self, Error> {
        if !is_mysql_driver(uri.driver()) {
            return Err(Error::UnsupportedDriver(uri.driver().to_string()));
        }

        tracing::debug!(destination = %uri, "connecting to destination");
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect_with(connect_options(uri))
            .await
            .map_err(destination_error)?;
        Ok(Self { pool })
    }
}

#[async_trait::async_trait]
impl TableSink for MySqlSink {
    async fn replace_table(&self, table: &str, records: &RecordSet) -> Result<(), Error> {
        sqlx::query(AssertSqlSafe(format!("DROP TABLE IF EXISTS {}", quote_ident(table))))
            .execute(&self.pool)
            .await
            .map_err(destination_error)?;

        let Some(create) = create_table_sql(table, records) else {
            tracing::warn!(table, "record set has no columns; dropping table without recreating it");
            return Ok(());
        };
        sqlx::query(AssertSqlSafe(create))
            .execute(&self.pool)
            .await
            .map_err(destination_error)?;

        let mut tx = self.pool.begin().await.map_err(destination_error)?;
        for chunk in records.rows().chunks(rows_per_insert(records.columns().len())) {
            let mut insert = insert_query(table, records.columns(), chunk);
            insert.build().execute(&mut *tx).await.map_err(destination_error)?;
        }
        tx.commit().await.map_err(destination_error)?;

        Ok(())
    }
}

fn connect_options(uri: &DatabaseUri) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(uri.host().unwrap_or("127.0.0.1"))
        .port(uri.port().unwrap_or(DEFAULT_PORT))
        .username(&uri.username())
        .database(&uri.database());

    match uri.password() {
        Some(password) => options.password(&password),
        None => options,
    }
}

fn destination_error(err: sqlx::Error) -> Error {
    Error::Destination(err.to_string())
}

/// Backtick-quote an identifier, doubling embedded backticks.
fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// `CREATE TABLE` for the record set, or None when it has no columns.
fn create_table_sql(table: &str, records: &RecordSet) -> Option<String> {
    if records.columns().is_empty() {
        return None;
    }

    let definitions = records
        .columns()
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let kind = match column_kind(records.rows().iter().map(|r| &r[i])) {
                ColumnKind::Integer => "BIGINT",
                ColumnKind::Real => "DOUBLE",
                ColumnKind::Text => "LONGTEXT",
            };
            format!("{} {kind}", quote_ident(name))
        })
        .collect::<Vec<_>>()
        .join(", ");

    Some(format!("CREATE TABLE {} ({definitions})", quote_ident(table)))
}

fn rows_per_insert(columns: usize) -> usize {
    (MAX_BIND_PARAMS / columns.max(1)).max(1)
}

/// Multi-row `INSERT` binding every value of `rows`.
fn insert_query(table: &str, columns: &[String], rows: &[Vec<Value>]) -> QueryBuilder<MySql> {
    let column_list = columns.iter().map(|c| quote_ident(c)).collect::<Vec<_>>().join(", ");
    let mut builder = QueryBuilder::new(format!("INSERT INTO {} ({column_list}) ", quote_ident(table)));

    builder.push_values(rows, |mut b, row| {
        for value in row {
            match value {
                Value::Null => b.push_bind(None::<String>),
                Value::Bool(v) => b.push_bind(*v),
                Value::Number(n) => match n.as_i64() {
                    Some(i) => b.push_bind(i),
                    None if n.is_u64() => b.push_bind(n.to_string()),
                    None => b.push_bind(n.as_f64()),
                },
                Value::String(s) => b.push_bind(s.clone()),
                nested => b.push_bind(nested.to_string()),
            };
        }
    });

    builder
}
