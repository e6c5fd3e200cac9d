//! Core types and shared functionality for ferry.
//!
//! This crate provides:
//! - TTL cache gateway with SQLite and Redis backends
//! - Document and record-set model, JSON flattening
//! - Destination URI handling
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod config;
pub mod destination;
pub mod document;
pub mod error;
pub mod record;

pub use cache::{CacheDb, CacheStore, RedisCache};
pub use config::{AppConfig, CacheBackend, ConfigError, TableNaming};
pub use destination::DatabaseUri;
pub use document::Document;
pub use error::Error;
pub use record::RecordSet;
