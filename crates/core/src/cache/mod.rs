//! TTL cache for document lists and record sets.
//!
//! This module provides the cache gateway used by the ingestion and
//! normalization stages. `CacheDb` stores entries in SQLite with async access
//! via tokio-rusqlite; `RedisCache` shares them through a Redis server. Both
//! support:
//!
//! - JSON values addressed by string keys
//! - Time-based expiry (entries past their expiry read as absent)
//! - Deterministic keys from (bucket, prefix) or canonical content hashes
//! - Automatic schema migrations for the SQLite store

pub mod connection;
pub mod entries;
pub mod hash;
pub mod migrations;
pub mod redis_store;

pub use crate::Error;

pub use connection::CacheDb;
pub use redis_store::RedisCache;

use serde_json::Value;

/// Default entry lifetime in seconds.
pub const DEFAULT_TTL_SECS: i64 = 3600;

/// Key/value store with per-entry expiry.
#[async_trait::async_trait]
pub trait CacheStore: Send + Sync {
    /// Value under `key`, or None when absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Value>, Error>;

    /// Store `value` under `key` for `ttl_seconds`, replacing any previous entry.
    async fn put(&self, key: &str, value: &Value, ttl_seconds: i64) -> Result<(), Error>;

    async fn is_fresh(&self, key: &str) -> Result<bool, Error>;

    /// Drop expired entries, returning how many went.
    async fn purge_expired(&self) -> Result<u64, Error>;
}
