//! Key/value entry operations.
//!
//! Values are JSON; every entry carries an absolute expiry and is treated as
//! absent once that moment has passed.

use super::CacheStore;
use super::connection::CacheDb;
use crate::Error;
use chrono::{Duration, Utc};
use serde_json::Value;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Get a cached value by key.
    ///
    /// Returns None if the key doesn't exist or its entry has expired.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        let raw = {
            let key = key.clone();
            self.conn
                .call(move |conn| -> Result<Option<String>, Error> {
                    let mut stmt =
                        conn.prepare("SELECT value_json FROM cache_entries WHERE key = ?1 AND expires_at > ?2")?;

                    let result = stmt.query_row(params![key, now], |row| row.get(0));

                    match result {
                        Ok(json) => Ok(Some(json)),
                        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                        Err(e) => Err(e.into()),
                    }
                })
                .await
                .map_err(Error::from)?
        };

        match raw {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| Error::CacheCorrupt { key: key.clone(), reason: e.to_string() })?;
                tracing::debug!(key = %key, "cache hit");
                Ok(Some(value))
            }
            None => {
                tracing::debug!(key = %key, "cache miss");
                Ok(None)
            }
        }
    }

    /// Insert or replace a cached value.
    ///
    /// The entry expires `ttl_seconds` from now.
    pub async fn put(&self, key: &str, value: &Value, ttl_seconds: i64) -> Result<(), Error> {
        if ttl_seconds <= 0 {
            return Err(Error::InvalidInput(format!("ttl must be positive, got {ttl_seconds}")));
        }

        let key = key.to_string();
        let value_json = value.to_string();
        let stored_at = Utc::now();
        let expires_at = (stored_at + Duration::seconds(ttl_seconds)).timestamp_millis();
        let stored_at = stored_at.timestamp_millis();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO cache_entries (key, value_json, stored_at, expires_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(key) DO UPDATE SET
                        value_json = excluded.value_json,
                        stored_at = excluded.stored_at,
                        expires_at = excluded.expires_at",
                    params![key, value_json, stored_at, expires_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Check if an entry exists and is fresh.
    pub async fn is_fresh(&self, key: &str) -> Result<bool, Error> {
        let key = key.to_string();
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let fresh: bool = conn
                    .query_row(
                        "SELECT EXISTS(SELECT 1 FROM cache_entries WHERE key = ?1 AND expires_at > ?2)",
                        params![key, now],
                        |row| row.get(0),
                    )
                    .map_err(Error::from)?;

                Ok(fresh)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete expired entries.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_expired(&self) -> Result<u64, Error> {
        let now = Utc::now().timestamp_millis();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM cache_entries WHERE expires_at <= ?1", params![now])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait::async_trait]
impl CacheStore for CacheDb {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        CacheDb::get(self, key).await
    }

    async fn put(&self, key: &str, value: &Value, ttl_seconds: i64) -> Result<(), Error> {
        CacheDb::put(self, key, value, ttl_seconds).await
    }

    async fn is_fresh(&self, key: &str) -> Result<bool, Error> {
        CacheDb::is_fresh(self, key).await
    }

    async fn purge_expired(&self) -> Result<u64, Error> {
        CacheDb::purge_expired(self).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let value = json!([{"a": 1}, {"b": [1, 2]}]);

        db.put("docs", &value, 3600).await.unwrap();

        assert_eq!(db.get("docs").await.unwrap(), Some(value));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_list_is_a_hit() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("empty", &json!([]), 3600).await.unwrap();
        assert_eq!(db.get("empty").await.unwrap(), Some(json!([])));
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("k", &json!({"old": 1}), 3600).await.unwrap();
        db.put("k", &json!({"new": 2}), 3600).await.unwrap();
        assert_eq!(db.get("k").await.unwrap(), Some(json!({"new": 2})));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("short", &json!(1), 1).await.unwrap();
        assert!(db.is_fresh("short").await.unwrap());

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        assert!(!db.is_fresh("short").await.unwrap());
        assert!(db.get("short").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.put("expiring", &json!(1), 1).await.unwrap();
        db.put("fresh", &json!(2), 3600).await.unwrap();

        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;

        assert_eq!(db.purge_expired().await.unwrap(), 1);
        assert!(db.get("fresh").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_rejects_non_positive_ttl() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let result = db.put("k", &json!(1), 0).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_corrupt_payload() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let far_future = Utc::now().timestamp_millis() + 60_000;
        db.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO cache_entries (key, value_json, stored_at, expires_at) VALUES ('bad', '{not json', 0, ?1)",
                    params![far_future],
                )
            })
            .await
            .unwrap();

        let result = db.get("bad").await;
        assert!(matches!(result, Err(Error::CacheCorrupt { .. })));
    }

    #[tokio::test]
    async fn test_usable_as_cache_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let store: &dyn CacheStore = &db;

        store.put("k", &json!({"a": 1}), 3600).await.unwrap();

        assert!(store.is_fresh("k").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), Some(json!({"a": 1})));
        assert_eq!(store.purge_expired().await.unwrap(), 0);
    }
}
