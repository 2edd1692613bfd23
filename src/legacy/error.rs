//! Errors raised while reading or restoring legacy posts.

use std::path::PathBuf;
use thiserror::Error;

use crate::utils::fs::JsonReadError;

#[derive(Debug, Error)]
pub enum LegacyError {
    #[error("cannot list legacy posts in `{}`", .0.display())]
    List(PathBuf, #[source] std::io::Error),

    #[error("cannot read legacy post `{}`: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: JsonReadError,
    },

    #[error("legacy post `{}` is malformed: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("entity `{0}` references no RawHtml or Markdown block to restore a render from")]
    MissingRender(String),

    #[error("entity `{entity}` references unknown block `{block}`")]
    MissingBlock { entity: String, block: String },
}
