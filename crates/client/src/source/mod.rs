//! Blob store access.
//!
//! ### Listing
//! - Objects come back sorted by name
//! - Prefixes are plain string prefixes on object names, as in GCS and S3
//!   listings; an empty prefix lists the whole bucket
//!
//! ### Reading
//! - Every object is read fully into memory as UTF-8 text
//!
//! The `BlobSource` trait keeps the ingestion stage independent of the
//! backing store.

pub mod store;

#[cfg(test)]
pub(crate) mod fake;

pub use store::{ObjectStoreSource, SourceBackend};

use ferry_core::Error;

/// One object read from the blob store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBlob {
    /// Object name inside the bucket.
    pub name: String,
    /// Object content as text.
    pub text: String,
}

impl RawBlob {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self { name: name.into(), text: text.into() }
    }
}

/// Lists and reads the objects under a bucket prefix.
#[async_trait::async_trait]
pub trait BlobSource: Send + Sync {
    /// Read every object in `bucket` whose name starts with `prefix`.
    async fn list_and_read(&self, bucket: &str, prefix: &str) -> Result<Vec<RawBlob>, Error>;
}
