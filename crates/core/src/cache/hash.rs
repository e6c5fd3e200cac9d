//! Cache key generation.
//!
//! Record-set keys hash a canonical serialization of the document: object
//! keys sorted recursively, compact separators. Two documents that differ only
//! in key order or whitespace share a key.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// Cache key for the document list under a (bucket, prefix) pair.
pub fn documents_key(bucket: &str, prefix: &str) -> String {
    format!("nosql_data:{bucket}:{prefix}")
}

/// Cache key for the record set of a document.
pub fn records_key(document: &Value) -> String {
    format!("records:{}", content_hash(document))
}

/// SHA-256 of the canonical serialization, hex encoded.
pub fn content_hash(document: &Value) -> String {
    let mut hasher = Sha256::new();
    hasher.update(canonical_json(document).as_bytes());
    hex::encode(hasher.finalize())
}

/// Serialize with recursively sorted object keys and no whitespace.
pub fn canonical_json(value: &Value) -> String {
    canonicalize(value).to_string()
}

fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            let mut sorted = Map::with_capacity(map.len());
            for key in keys {
                sorted.insert(key.clone(), canonicalize(&map[key]));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
