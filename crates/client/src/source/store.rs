//! `BlobSource` backed by the `object_store` crate.

use std::path::PathBuf;
use std::sync::Arc;

use futures_util::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::gcp::GoogleCloudStorageBuilder;
use object_store::local::LocalFileSystem;
use object_store::memory::InMemory;
use object_store::path::Path as ObjPath;
use object_store::{ObjectMeta, ObjectStore};

use ferry_core::Error;
use ferry_core::config::{SourceConfig, SourceKind};

use super::{BlobSource, RawBlob};

/// Which store buckets are opened against.
#[derive(Debug, Clone)]
pub enum SourceBackend {
    /// Google Cloud Storage, optionally with a service account key file.
    Gcs { service_account_path: Option<PathBuf> },
    /// Amazon S3 with credentials from the environment.
    S3,
    /// Buckets are sub-directories of `root`.
    Local { root: PathBuf },
    /// A single in-process store; the bucket name is ignored.
    Memory(Arc<InMemory>),
}

/// Blob source over any `object_store` backend.
#[derive(Debug, Clone)]
pub struct ObjectStoreSource {
    backend: SourceBackend,
}

impl ObjectStoreSource {
    pub fn new(backend: SourceBackend) -> Self {
        Self { backend }
    }

    /// Build the source described by configuration.
    pub fn from_config(config: &SourceConfig) -> Result<Self, Error> {
        let backend = match config.kind {
            SourceKind::Gcs => SourceBackend::Gcs { service_account_path: config.service_account_path.clone() },
            SourceKind::S3 => SourceBackend::S3,
            SourceKind::Local => {
                let root = config
                    .local_root
                    .clone()
                    .ok_or_else(|| Error::InvalidInput("local source requires local_root".into()))?;
                SourceBackend::Local { root }
            }
            SourceKind::Memory => SourceBackend::Memory(Arc::new(InMemory::new())),
        };
        Ok(Self::new(backend))
    }

    /// Open the store holding `bucket`.
    fn open_bucket(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, Error> {
        let store: Arc<dyn ObjectStore> = match &self.backend {
            SourceBackend::Gcs { service_account_path } => {
                let mut builder = GoogleCloudStorageBuilder::from_env().with_bucket_name(bucket);
                if let Some(path) = service_account_path
                    && path.exists()
                {
                    builder = builder.with_service_account_path(path.to_string_lossy());
                }
                Arc::new(builder.build().map_err(|e| Error::BlobStore(e.to_string()))?)
            }
            SourceBackend::S3 => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| Error::BlobStore(e.to_string()))?,
            ),
            SourceBackend::Local { root } => Arc::new(
                LocalFileSystem::new_with_prefix(root.join(bucket)).map_err(|e| Error::BlobStore(e.to_string()))?,
            ),
            SourceBackend::Memory(store) => store.clone(),
        };
        Ok(store)
    }

    /// Objects in `store` whose name starts with `prefix`, sorted by name.
    async fn list_matching(store: &dyn ObjectStore, prefix: &str) -> Result<Vec<ObjectMeta>, Error> {
        // object_store prefixes match whole path segments; list the enclosing
        // directory and filter on the raw string prefix instead.
        let dir = prefix.rfind('/').map(|i| &prefix[..i]).filter(|d| !d.is_empty()).map(ObjPath::from);

        let mut objects: Vec<ObjectMeta> = store
            .list(dir.as_ref())
            .try_collect::<Vec<_>>()
            .await
            .map_err(|e| Error::BlobStore(e.to_string()))?
            .into_iter()
            .filter(|meta| meta.location.as_ref().starts_with(prefix))
            .collect();

        objects.sort_by(|a, b| a.location.as_ref().cmp(b.location.as_ref()));
        Ok(objects)
    }
}

#[async_trait::async_trait]
impl BlobSource for ObjectStoreSource {
    async fn list_and_read(&self, bucket: &str, prefix: &str) -> Result<Vec<RawBlob>, Error> {
        if bucket.is_empty() {
            return Err(Error::InvalidInput("bucket cannot be empty".into()));
        }

        let store = self.open_bucket(bucket)?;
        let objects = Self::list_matching(store.as_ref(), prefix).await?;

        let mut blobs = Vec::with_capacity(objects.len());
        for meta in objects {
            let name = meta.location.to_string();
            let bytes = store
                .get(&meta.location)
                .await
                .map_err(|e| Error::BlobStore(format!("{name}: {e}")))?
                .bytes()
                .await
                .map_err(|e| Error::BlobStore(format!("{name}: {e}")))?;

            let text = String::from_utf8(bytes.to_vec()).map_err(|e| Error::InvalidEncoding(format!("{name}: {e}")))?;

            tracing::debug!(bucket, object = %name, bytes = meta.size, "read blob");
            blobs.push(RawBlob { name, text });
        }

        Ok(blobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use object_store::PutPayload;

    async fn put(store: &InMemory, name: &str, body: &[u8]) {
        let payload = PutPayload::from_bytes(Bytes::copy_from_slice(body));
        store.put(&ObjPath::from(name), payload).await.unwrap();
    }

    async fn memory_source(objects: &[(&str, &str)]) -> ObjectStoreSource {
        let store = Arc::new(InMemory::new());
        for (name, body) in objects {
            put(&store, name, body.as_bytes()).await;
        }
        ObjectStoreSource::new(SourceBackend::Memory(store))
    }

    #[tokio::test]
    async fn test_lists_sorted_under_prefix() {
        let source = memory_source(&[
            ("docs/b.json", r#"{"b":1}"#),
            ("docs/a.json", r#"{"a":1}"#),
            ("other/c.json", "{}"),
        ])
        .await;

        let blobs = source.list_and_read("bucket", "docs/").await.unwrap();
        let names: Vec<&str> = blobs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["docs/a.json", "docs/b.json"]);
        assert_eq!(blobs[0].text, r#"{"a":1}"#);
    }

    #[tokio::test]
    async fn test_prefix_is_a_string_prefix() {
        let source = memory_source(&[("docs/a.json", "1"), ("documents/x.json", "2"), ("d.json", "3")]).await;

        let blobs = source.list_and_read("bucket", "doc").await.unwrap();
        let names: Vec<&str> = blobs.iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, ["docs/a.json", "documents/x.json"]);

        let blobs = source.list_and_read("bucket", "docs/a").await.unwrap();
        assert_eq!(blobs.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_prefix_lists_everything() {
        let source = memory_source(&[("a.json", "1"), ("nested/b.json", "2")]).await;
        let blobs = source.list_and_read("bucket", "").await.unwrap();
        assert_eq!(blobs.len(), 2);
    }

    #[tokio::test]
    async fn test_no_matches_is_empty() {
        let source = memory_source(&[("a.json", "1")]).await;
        let blobs = source.list_and_read("bucket", "missing/").await.unwrap();
        assert!(blobs.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_utf8() {
        let store = Arc::new(InMemory::new());
        put(&store, "bad.json", &[0xff, 0xfe, 0x00]).await;
        let source = ObjectStoreSource::new(SourceBackend::Memory(store));
        let result = source.list_and_read("bucket", "").await;
        assert!(matches!(result, Err(Error::InvalidEncoding(_))));
    }

    #[tokio::test]
    async fn test_local_backend_reads_bucket_directory() {
        let dir = tempfile::tempdir().unwrap();
        let bucket_dir = dir.path().join("no_sql_files").join("docs");
        std::fs::create_dir_all(&bucket_dir).unwrap();
        std::fs::write(bucket_dir.join("one.json"), r#"{"a": 1}"#).unwrap();

        let source = ObjectStoreSource::new(SourceBackend::Local { root: dir.path().to_path_buf() });
        let blobs = source.list_and_read("no_sql_files", "docs/").await.unwrap();
        assert_eq!(blobs, vec![RawBlob::new("docs/one.json", r#"{"a": 1}"#)]);
    }

    #[tokio::test]
    async fn test_empty_bucket_name_rejected() {
        let source = memory_source(&[]).await;
        let result = source.list_and_read("", "").await;
        assert!(matches!(result, Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_from_config_local_requires_root() {
        let config = SourceConfig { kind: SourceKind::Local, service_account_path: None, local_root: None };
        assert!(matches!(ObjectStoreSource::from_config(&config), Err(Error::InvalidInput(_))));
    }
}
