//! Content fingerprints and block ids.
//!
//! A block id is a pure function of the block's content:
//!
//! ```text
//! blk_ + hex(sha1(stable_serialize(canonicalize(block, drop "id"))))
//! ```
//!
//! Canonicalization works on the generic JSON value model, so the id does not
//! depend on key insertion order or on how the block was decoded.

use serde_json::{Map, Value};
use sha1::{Digest, Sha1};

/// Prefix shared by every block id.
pub const BLOCK_ID_PREFIX: &str = "blk_";

/// Key excluded from fingerprints at every nesting level.
const ID_KEY: &str = "id";

/// Recursively normalize a value for hashing.
///
/// - object keys are sorted
/// - keys whose value is `null` are dropped
/// - `drop_key` (if any) is removed from every object, at any depth
/// - array order is preserved
pub fn canonicalize(value: &Value, drop_key: Option<&str>) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_unstable();

            let mut normalized = Map::new();
            for key in keys {
                if drop_key == Some(key.as_str()) {
                    continue;
                }
                let item = &map[key];
                if item.is_null() {
                    continue;
                }
                normalized.insert(key.clone(), canonicalize(item, drop_key));
            }
            Value::Object(normalized)
        }
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| canonicalize(item, drop_key)).collect())
        }
        scalar => scalar.clone(),
    }
}

/// Compact, key-sorted JSON text. Non-ASCII characters are emitted literally.
pub fn stable_serialize(value: &Value) -> String {
    sort_keys(value).to_string()
}

/// Rebuild a value with every object's keys in sorted order, keeping nulls.
///
/// Used for on-disk output where the value itself must not change.
pub fn sort_keys(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
            Value::Object(
                entries
                    .into_iter()
                    .map(|(key, item)| (key.clone(), sort_keys(item)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.iter().map(sort_keys).collect()),
        scalar => scalar.clone(),
    }
}

/// Canonical text of a block payload, ignoring its `id`.
pub fn fingerprint(block: &Value) -> String {
    stable_serialize(&canonicalize(block, Some(ID_KEY)))
}

/// Derive the content-addressed id of a block payload.
pub fn block_id(block: &Value) -> String {
    let digest = Sha1::digest(fingerprint(block).as_bytes());
    format!("{BLOCK_ID_PREFIX}{}", hex::encode(digest))
}
