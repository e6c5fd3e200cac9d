//! Pipeline driver.
//!
//! Runs ingestion, normalization and load in sequence for one
//! (bucket, prefix, destination). Documents are handled one at a time in
//! listing order; the first error aborts the run and tables already written
//! stay written. Table names are settled before anything is loaded, and two
//! documents claiming the same name abort the run up front.

use std::collections::HashSet;

use ferry_core::cache::DEFAULT_TTL_SECS;
use ferry_core::{AppConfig, CacheBackend, CacheDb, CacheStore, DatabaseUri, Document, Error, RedisCache, TableNaming};

use crate::ingest::fetch_documents;
use crate::load::{TableSink, load};
use crate::normalize::normalize;
use crate::source::{BlobSource, ObjectStoreSource};

/// Per-run settings.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    pub ttl_seconds: i64,
    pub table_naming: TableNaming,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self { ttl_seconds: DEFAULT_TTL_SECS, table_naming: TableNaming::Positional }
    }
}

/// What a completed run loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Documents ingested.
    pub documents: usize,
    /// Tables written, in load order. Documents without columns leave no table
    /// and are not listed.
    pub tables: Vec<String>,
}

/// Stage sequencing over injected collaborators.
pub struct Pipeline<'a> {
    cache: &'a dyn CacheStore,
    source: &'a dyn BlobSource,
    sink: &'a dyn TableSink,
    options: PipelineOptions,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        cache: &'a dyn CacheStore, source: &'a dyn BlobSource, sink: &'a dyn TableSink, options: PipelineOptions,
    ) -> Self {
        Self { cache, source, sink, options }
    }

    /// Ingest everything under `bucket`/`prefix` and load one table per document.
    pub async fn run(&self, bucket: &str, prefix: &str) -> Result<RunSummary, Error> {
        let purged = self.cache.purge_expired().await?;
        if purged > 0 {
            tracing::debug!(purged, "removed expired cache entries");
        }

        let documents = fetch_documents(self.cache, self.source, bucket, prefix, self.options.ttl_seconds).await?;

        let names = table_names(self.options.table_naming, &documents)?;

        let mut tables = Vec::with_capacity(documents.len());
        for (document, table) in documents.iter().zip(names) {
            let records = normalize(self.cache, &document.body, self.options.ttl_seconds).await?;
            load(&records, &table, self.sink).await?;
            if !records.columns().is_empty() {
                tables.push(table);
            }
        }

        tracing::info!(bucket, prefix, documents = documents.len(), tables = tables.len(), "pipeline run complete");
        Ok(RunSummary { documents: documents.len(), tables })
    }
}

/// Destination table for the document at `index`.
pub fn table_name(naming: TableNaming, index: usize, document: &Document) -> String {
    match naming {
        TableNaming::Positional => format!("table_{index}"),
        TableNaming::ObjectName => {
            let sanitized: String = document
                .name
                .chars()
                .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                .collect();
            format!("table_{sanitized}")
        }
    }
}

/// Table name for every document, rejecting any name used twice.
pub fn table_names(naming: TableNaming, documents: &[Document]) -> Result<Vec<String>, Error> {
    let mut seen = HashSet::new();
    let mut names = Vec::with_capacity(documents.len());
    for (index, document) in documents.iter().enumerate() {
        let table = table_name(naming, index, document);
        if !seen.insert(table.clone()) {
            return Err(Error::InvalidTableName(format!(
                "{table} is produced by more than one object (second: {})",
                document.name
            )));
        }
        names.push(table);
    }
    Ok(names)
}

async fn open_cache(config: &AppConfig) -> Result<Box<dyn CacheStore>, Error> {
    match config.cache_backend {
        CacheBackend::Sqlite => Ok(Box::new(CacheDb::open(&config.cache_db_path).await?)),
        CacheBackend::Redis => Ok(Box::new(RedisCache::open(&config.redis_url)?)),
    }
}

/// Build the cache, blob source and sink from configuration and run once.
pub async fn run_with_config(config: &AppConfig, destination: &DatabaseUri) -> Result<RunSummary, Error> {
    tracing::info!(
        bucket = %config.bucket,
        prefix = %config.prefix,
        destination = %destination,
        "starting pipeline run"
    );

    let cache = open_cache(config).await?;
    let source = ObjectStoreSource::from_config(&config.source)?;
    let sink = crate::load::connect(destination).await?;
    let options = PipelineOptions { ttl_seconds: config.cache_ttl_secs, table_naming: config.table_naming };

    Pipeline::new(cache.as_ref(), &source, sink.as_ref(), options)
        .run(&config.bucket, &config.prefix)
        .await
}
