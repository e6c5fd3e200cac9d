//! Normalization stage: document to record set, cached by content hash.

use ferry_core::cache::hash::records_key;
use ferry_core::{CacheStore, Error, RecordSet};
use serde_json::{Map, Value};

/// Flatten `document` into a record set, reusing a cached row list when present.
pub async fn normalize(cache: &dyn CacheStore, document: &Value, ttl_seconds: i64) -> Result<RecordSet, Error> {
    let key = records_key(document);

    if let Some(cached) = cache.get(&key).await? {
        let records: Vec<Map<String, Value>> = serde_json::from_value(cached)
            .map_err(|e| Error::CacheCorrupt { key: key.clone(), reason: e.to_string() })?;
        tracing::debug!(key = %key, rows = records.len(), "record set fetched from cache");
        return Ok(RecordSet::from_records(&records));
    }

    let records = RecordSet::from_document(document);
    let payload = Value::Array(records.to_records().into_iter().map(Value::Object).collect());
    cache.put(&key, &payload, ttl_seconds).await?;

    tracing::debug!(key = %key, rows = records.len(), columns = records.columns().len(), "normalized document");
    Ok(records)
}
