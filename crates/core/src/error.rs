//! Unified error types for ferry.
//!
//! Every variant renders as `CODE: detail` so a failed run names the stage
//! that broke.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the cache, the stages and the driver.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty bucket name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// SQLite operation failed, either in the cache or in the destination.
    #[error("DATABASE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("DATABASE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Listing or reading from the blob store failed.
    #[error("BLOB_STORE_ERROR: {0}")]
    BlobStore(String),

    /// Blob content is not valid UTF-8.
    #[error("INVALID_ENCODING: {0}")]
    InvalidEncoding(String),

    /// Blob content is not valid JSON.
    #[error("INVALID_JSON: {name}: {reason}")]
    InvalidJson { name: String, reason: String },

    /// A cached payload could not be decoded into the expected shape.
    #[error("CACHE_CORRUPT: {key}: {reason}")]
    CacheCorrupt { key: String, reason: String },

    /// Destination URI could not be parsed.
    #[error("INVALID_URI: {0}")]
    InvalidUri(String),

    /// Destination driver has no sink implementation.
    #[error("UNSUPPORTED_DRIVER: {0}")]
    UnsupportedDriver(String),

    /// Table name is not a plain SQL identifier, or is claimed by two documents.
    #[error("INVALID_TABLE_NAME: {0}")]
    InvalidTableName(String),

    /// Record set columns cannot be written as given.
    #[error("INVALID_COLUMNS: {0}")]
    InvalidColumns(String),

    /// Networked destination (MySQL) failed.
    #[error("DESTINATION_ERROR: {0}")]
    Destination(String),

    /// Networked cache backend (Redis) failed.
    #[error("CACHE_ERROR: {0}")]
    Cache(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidJson { name: "docs/a.json".to_string(), reason: "EOF".to_string() };
        assert!(err.to_string().starts_with("INVALID_JSON"));
        assert!(err.to_string().contains("docs/a.json"));
    }

    #[test]
    fn test_rusqlite_error_maps_to_database() {
        let err: Error = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, Error::Database(_)));
        assert!(err.to_string().starts_with("DATABASE_ERROR"));
    }

    #[test]
    fn test_backend_error_codes() {
        assert!(Error::Destination("refused".into()).to_string().starts_with("DESTINATION_ERROR"));
        assert!(Error::Cache("refused".into()).to_string().starts_with("CACHE_ERROR"));
        assert!(Error::InvalidColumns("a/A".into()).to_string().starts_with("INVALID_COLUMNS"));
    }

    #[test]
    fn test_nested_error_unwraps() {
        let err: Error = tokio_rusqlite::Error::Error(Error::InvalidTableName("x y".into())).into();
        assert!(matches!(err, Error::InvalidTableName(_)));
    }
}
