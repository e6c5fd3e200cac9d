//! Documents as read from the blob store.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A parsed JSON document and the object it was read from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Object name inside the bucket (e.g. `docs/a.json`).
    pub name: String,
    /// Parsed JSON body.
    pub body: Value,
}

impl Document {
    pub fn new(name: impl Into<String>, body: Value) -> Self {
        Self { name: name.into(), body }
    }
}
