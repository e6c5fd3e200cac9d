//! Redis cache backend.
//!
//! Entries are plain string keys holding JSON text, written with `SET EX` so
//! Redis expires them itself.

use redis::AsyncCommands;
use redis::aio::MultiplexedConnection;
use serde_json::Value;

use super::CacheStore;
use crate::Error;

/// Cache gateway over a Redis server, shared by every process pointing at it.
#[derive(Clone, Debug)]
pub struct RedisCache {
    client: redis::Client,
}

impl RedisCache {
    /// Prepare a client for `redis_url` (e.g. `redis://127.0.0.1:6379/`).
    ///
    /// No connection is made until the first command.
    pub fn open(redis_url: &str) -> Result<Self, Error> {
        let client = redis::Client::open(redis_url).map_err(cache_error)?;
        Ok(Self { client })
    }

    async fn connection(&self) -> Result<MultiplexedConnection, Error> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(cache_error)
    }
}

fn cache_error(err: redis::RedisError) -> Error {
    Error::Cache(err.to_string())
}

#[async_trait::async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Value>, Error> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(key).await.map_err(cache_error)?;

        match raw {
            Some(json) => {
                let value = serde_json::from_str(&json)
                    .map_err(|e| Error::CacheCorrupt { key: key.to_string(), reason: e.to_string() })?;
                tracing::debug!(key, "cache hit");
                Ok(Some(value))
            }
            None => {
                tracing::debug!(key, "cache miss");
                Ok(None)
            }
        }
    }

    async fn put(&self, key: &str, value: &Value, ttl_seconds: i64) -> Result<(), Error> {
        let ttl = u64::try_from(ttl_seconds)
            .ok()
            .filter(|ttl| *ttl > 0)
            .ok_or_else(|| Error::InvalidInput(format!("ttl must be positive, got {ttl_seconds}")))?;

        let mut conn = self.connection().await?;
        let _: () = conn
            .set_ex(key, value.to_string(), ttl)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn is_fresh(&self, key: &str) -> Result<bool, Error> {
        let mut conn = self.connection().await?;
        conn.exists(key).await.map_err(cache_error)
    }

    /// Redis evicts expired keys on its own; nothing is left to purge.
    async fn purge_expired(&self) -> Result<u64, Error> {
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_open_rejects_malformed_url() {
        let result = RedisCache::open("not a redis url");
        assert!(matches!(result, Err(Error::Cache(_))));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_ttl_before_connecting() {
        let cache = RedisCache::open("redis://127.0.0.1:1/").unwrap();
        let result = cache.put("k", &json!(1), 0).await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_a_cache_error() {
        let cache = RedisCache::open("redis://127.0.0.1:1/").unwrap();
        let result = cache.get("k").await;
        assert!(matches!(result, Err(Error::Cache(_))));
    }

    #[tokio::test]
    async fn test_purge_is_a_no_op() {
        let cache = RedisCache::open("redis://127.0.0.1:1/").unwrap();
        assert_eq!(cache.purge_expired().await.unwrap(), 0);
    }
}
