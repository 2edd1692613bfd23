//! Store loading errors.

use std::path::PathBuf;
use thiserror::Error;

/// Input and integrity errors raised while loading a micro store.
///
/// All of them are fatal: a store that fails any check is never partially
/// used.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("micro store is missing `{0}`")]
    MissingInput(PathBuf),

    #[error("malformed index `{path}`: {reason}")]
    MalformedIndex { path: PathBuf, reason: String },

    #[error("invalid JSON in `{path}`")]
    InvalidJson {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid id `{id}`: {reason}")]
    InvalidId { id: String, reason: &'static str },

    #[error("block listed in index is missing: `{0}`")]
    MissingBlock(PathBuf),

    #[error("entity listed in index is missing: `{0}`")]
    MissingEntity(PathBuf),

    #[error("id mismatch in `{path}`: expected `{expected}`, found `{found}`")]
    IdMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("block fingerprint mismatch for `{id}`: content hashes to `{actual}`")]
    FingerprintMismatch { id: String, actual: String },

    #[error("entity `{id}` is missing required field `{field}`")]
    MissingField { id: String, field: &'static str },

    #[error("entity `{entity}` references missing block `{block}`")]
    DanglingReference { entity: String, block: String },

    #[error("{kind} present on disk but absent from index: {}", .names.join(", "))]
    OrphanFile {
        kind: &'static str,
        names: Vec<String>,
    },

    #[error("unknown block `{0}`")]
    UnknownBlock(String),

    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),
}
