//! Ingestion stage: blob store to parsed documents, cached per (bucket, prefix).
//!
//! A cache hit returns the stored document list without contacting the blob
//! store. An empty listing is cached like any other result.

use ferry_core::cache::hash::documents_key;
use ferry_core::{CacheStore, Document, Error};

use crate::source::BlobSource;

/// Fetch and parse every document under `bucket`/`prefix`.
pub async fn fetch_documents(
    cache: &dyn CacheStore, source: &dyn BlobSource, bucket: &str, prefix: &str, ttl_seconds: i64,
) -> Result<Vec<Document>, Error> {
    let key = documents_key(bucket, prefix);

    if let Some(cached) = cache.get(&key).await? {
        let documents: Vec<Document> = serde_json::from_value(cached)
            .map_err(|e| Error::CacheCorrupt { key: key.clone(), reason: e.to_string() })?;
        tracing::info!(bucket, prefix, count = documents.len(), "documents fetched from cache");
        return Ok(documents);
    }

    let blobs = source.list_and_read(bucket, prefix).await?;

    let documents = blobs
        .into_iter()
        .map(|blob| {
            let body = serde_json::from_str(&blob.text)
                .map_err(|e| Error::InvalidJson { name: blob.name.clone(), reason: e.to_string() })?;
            Ok(Document::new(blob.name, body))
        })
        .collect::<Result<Vec<_>, Error>>()?;

    let payload =
        serde_json::to_value(&documents).map_err(|e| Error::InvalidInput(format!("failed to encode documents: {e}")))?;
    cache.put(&key, &payload, ttl_seconds).await?;

    tracing::info!(bucket, prefix, count = documents.len(), "documents fetched from blob store");
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ferry_core::CacheDb;
    use crate::source::fake::FakeSource;
    use serde_json::json;

    const TTL: i64 = 3600;

    #[tokio::test]
    async fn test_parses_documents_in_listing_order() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[("docs/a.json", r#"{"a": 1}"#), ("docs/b.json", "[1, 2]")]);

        let documents = fetch_documents(&cache, &source, "bucket", "docs/", TTL).await.unwrap();

        assert_eq!(
            documents,
            vec![Document::new("docs/a.json", json!({"a": 1})), Document::new("docs/b.json", json!([1, 2]))]
        );
    }

    #[tokio::test]
    async fn test_second_call_is_served_from_cache() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[("docs/a.json", r#"{"a": 1, "b": {"c": [true, null]}}"#)]);

        let first = fetch_documents(&cache, &source, "bucket", "docs/", TTL).await.unwrap();
        let second = fetch_documents(&cache, &source, "bucket", "docs/", TTL).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_vec(&first).unwrap(),
            serde_json::to_vec(&second).unwrap()
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_listing_is_cached() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[]);

        assert!(fetch_documents(&cache, &source, "bucket", "", TTL).await.unwrap().is_empty());
        assert!(fetch_documents(&cache, &source, "bucket", "", TTL).await.unwrap().is_empty());
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn test_prefixes_are_cached_separately() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[("docs/a.json", "1"), ("logs/b.json", "2")]);

        let docs = fetch_documents(&cache, &source, "bucket", "docs/", TTL).await.unwrap();
        let logs = fetch_documents(&cache, &source, "bucket", "logs/", TTL).await.unwrap();

        assert_eq!(docs[0].body, json!(1));
        assert_eq!(logs[0].body, json!(2));
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_expired_entry_triggers_fresh_fetch() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[("docs/a.json", r#"{"a": 1}"#)]);

        fetch_documents(&cache, &source, "bucket", "docs/", 1).await.unwrap();
        tokio::time::sleep(tokio::time::Duration::from_secs(2)).await;
        fetch_documents(&cache, &source, "bucket", "docs/", 1).await.unwrap();

        assert_eq!(source.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalid_json_aborts_without_caching() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[("docs/a.json", r#"{"a": 1}"#), ("docs/broken.json", "{nope")]);

        let result = fetch_documents(&cache, &source, "bucket", "docs/", TTL).await;
        assert!(matches!(result, Err(Error::InvalidJson { name, .. }) if name == "docs/broken.json"));
        assert!(!cache.is_fresh(&documents_key("bucket", "docs/")).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_cache_entry() {
        let cache = CacheDb::open_in_memory().await.unwrap();
        let source = FakeSource::new(&[]);
        cache.put(&documents_key("bucket", ""), &json!({"not": "a list"}), TTL).await.unwrap();

        let result = fetch_documents(&cache, &source, "bucket", "", TTL).await;
        assert!(matches!(result, Err(Error::CacheCorrupt { .. })));
        assert_eq!(source.calls(), 0);
    }
}
