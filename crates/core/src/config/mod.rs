//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (FERRY_*, nested keys split on `__`)
//! 2. TOML config file (if FERRY_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::DEFAULT_TTL_SECS;
use crate::destination::DatabaseUri;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (FERRY_*)
/// 2. TOML config file (if FERRY_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bucket holding the JSON documents.
    ///
    /// Set via FERRY_BUCKET environment variable.
    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Object name prefix to ingest; empty means the whole bucket.
    ///
    /// Set via FERRY_PREFIX environment variable.
    #[serde(default)]
    pub prefix: String,

    /// Cache backend, `sqlite` or `redis`.
    ///
    /// Set via FERRY_CACHE_BACKEND environment variable.
    #[serde(default)]
    pub cache_backend: CacheBackend,

    /// Redis server for the `redis` cache backend.
    ///
    /// Set via FERRY_REDIS_URL environment variable.
    #[serde(default = "default_redis_url")]
    pub redis_url: String,

    /// Path to the SQLite cache database.
    ///
    /// Set via FERRY_CACHE_DB_PATH environment variable.
    #[serde(default = "default_cache_db_path")]
    pub cache_db_path: PathBuf,

    /// Lifetime of cache entries in seconds.
    ///
    /// Set via FERRY_CACHE_TTL_SECS environment variable.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: i64,

    /// How destination tables are named.
    ///
    /// Set via FERRY_TABLE_NAMING environment variable (`positional` or `object_name`).
    #[serde(default)]
    pub table_naming: TableNaming,

    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub database: DatabaseConfig,
}

/// Cache backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    /// Local SQLite file at `cache_db_path`.
    #[default]
    Sqlite,
    /// Redis server at `redis_url`.
    Redis,
}

/// Blob store backend selection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Google Cloud Storage.
    #[default]
    Gcs,
    /// Amazon S3, credentials from the environment.
    S3,
    /// A local directory; every bucket is a sub-directory of `local_root`.
    Local,
    /// In-process store, starts empty.
    Memory,
}

/// Blob store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Set via FERRY_SOURCE__KIND.
    #[serde(default)]
    pub kind: SourceKind,

    /// Service account key file for GCS.
    ///
    /// Set via FERRY_SOURCE__SERVICE_ACCOUNT_PATH.
    #[serde(default = "default_service_account_path")]
    pub service_account_path: Option<PathBuf>,

    /// Root directory for the local backend.
    ///
    /// Set via FERRY_SOURCE__LOCAL_ROOT.
    #[serde(default)]
    pub local_root: Option<PathBuf>,
}

/// Destination database settings.
///
/// Username and password are usually left unset and prompted for.
#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `mysql` (or `mysql+<dbapi>`) or `sqlite`.
    #[serde(default = "default_driver")]
    pub driver: String,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub port: Option<u16>,

    /// Database name; for sqlite this is the database file path.
    #[serde(default = "default_database_name")]
    pub name: String,

    #[serde(default)]
    pub username: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// Destination table naming scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableNaming {
    /// `table_<index>` by listing position.
    #[default]
    Positional,
    /// `table_<object name>` with non-alphanumerics replaced by `_`; a run
    /// fails if two objects end up with the same name.
    ObjectName,
}

fn default_bucket() -> String {
    "no_sql_files".into()
}

fn default_redis_url() -> String {
    "redis://127.0.0.1:6379/".into()
}

fn default_cache_db_path() -> PathBuf {
    PathBuf::from("./ferry-cache.sqlite")
}

fn default_cache_ttl_secs() -> i64 {
    DEFAULT_TTL_SECS
}

fn default_service_account_path() -> Option<PathBuf> {
    Some(PathBuf::from("service-account-file.json"))
}

fn default_driver() -> String {
    "mysql".into()
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_database_name() -> String {
    "SDEProject".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            prefix: String::new(),
            cache_backend: CacheBackend::default(),
            redis_url: default_redis_url(),
            cache_db_path: default_cache_db_path(),
            cache_ttl_secs: default_cache_ttl_secs(),
            table_naming: TableNaming::default(),
            source: SourceConfig::default(),
            database: DatabaseConfig::default(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self { kind: SourceKind::default(), service_account_path: default_service_account_path(), local_root: None }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            host: default_host(),
            port: None,
            name: default_database_name(),
            username: None,
            password: None,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("driver", &self.driver)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .finish()
    }
}

impl DatabaseConfig {
    /// Build the destination URI from these settings and the given credentials.
    pub fn uri(&self, username: &str, password: &str) -> Result<DatabaseUri, crate::Error> {
        DatabaseUri::build(&self.driver, username, password, &self.host, self.port, &self.name)
    }
}

impl AppConfig {
    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `FERRY_`
    /// 2. TOML file from `FERRY_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("FERRY_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("FERRY_")
                .ignore(&["CONFIG_FILE"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
