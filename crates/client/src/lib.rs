//! Pipeline stages for ferry.
//!
//! This crate provides the blob source adapter, the ingestion, normalization
//! and load stages, and the driver that sequences them.

pub mod ingest;
pub mod load;
pub mod normalize;
pub mod pipeline;
pub mod source;

pub use ingest::fetch_documents;
pub use load::{MySqlSink, SqliteSink, TableSink, load};
pub use normalize::normalize;
pub use pipeline::{Pipeline, PipelineOptions, RunSummary, run_with_config, table_names};
pub use source::{BlobSource, ObjectStoreSource, RawBlob, SourceBackend};
