//! Configuration validation rules.
//!
//! This module provides validation logic for `AppConfig` values
//! after they have been loaded from environment, files, or defaults.

use crate::config::{AppConfig, CacheBackend, SourceKind};
use thiserror::Error;

/// Longest accepted cache lifetime: 30 days.
const MAX_CACHE_TTL_SECS: i64 = 30 * 24 * 60 * 60;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    LoadFailed(String),

    #[error("invalid configuration: {field} - {reason}")]
    Invalid { field: String, reason: String },

    #[error("missing required configuration: {field} ({hint})")]
    Missing { field: String, hint: String },
}

impl AppConfig {
    /// Validate configuration values after loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if:
    /// - `bucket` is empty
    /// - `cache_ttl_secs` is below 1 second or exceeds 30 days
    /// - `database.name` or `database.host` is empty
    ///
    /// Returns `ConfigError::Missing` if the local backend has no root, or the
    /// redis cache backend has no URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket.trim().is_empty() {
            return Err(ConfigError::Invalid { field: "bucket".into(), reason: "must not be empty".into() });
        }

        if self.cache_ttl_secs < 1 {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: "must be at least 1 second".into(),
            });
        }
        if self.cache_ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ConfigError::Invalid {
                field: "cache_ttl_secs".into(),
                reason: format!("must not exceed 30 days ({MAX_CACHE_TTL_SECS}s)"),
            });
        }

        if self.cache_backend == CacheBackend::Redis && self.redis_url.trim().is_empty() {
            return Err(ConfigError::Missing {
                field: "redis_url".into(),
                hint: "Set FERRY_REDIS_URL environment variable".into(),
            });
        }

        if self.source.kind == SourceKind::Local && self.source.local_root.is_none() {
            return Err(ConfigError::Missing {
                field: "source.local_root".into(),
                hint: "Set FERRY_SOURCE__LOCAL_ROOT environment variable".into(),
            });
        }

        if self.database.name.is_empty() {
            return Err(ConfigError::Invalid { field: "database.name".into(), reason: "must not be empty".into() });
        }
        if self.database.host.is_empty() {
            return Err(ConfigError::Invalid { field: "database.host".into(), reason: "must not be empty".into() });
        }

        if self.source.kind == SourceKind::Gcs
            && let Some(path) = &self.source.service_account_path
            && !path.exists()
        {
            tracing::warn!(
                path = %path.display(),
                "service account key file not found; falling back to ambient GCS credentials"
            );
        }

        Ok(())
    }
}
