//! In-memory `BlobSource` that counts how often it is contacted.

use std::sync::atomic::{AtomicUsize, Ordering};

use ferry_core::Error;

use super::{BlobSource, RawBlob};

pub(crate) struct FakeSource {
    blobs: Vec<RawBlob>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub(crate) fn new(blobs: &[(&str, &str)]) -> Self {
        Self { blobs: blobs.iter().map(|(name, text)| RawBlob::new(*name, *text)).collect(), calls: AtomicUsize::new(0) }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl BlobSource for FakeSource {
    async fn list_and_read(&self, _bucket: &str, prefix: &str) -> Result<Vec<RawBlob>, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .blobs
            .iter()
            .filter(|blob| blob.name.starts_with(prefix))
            .cloned()
            .collect())
    }
}
