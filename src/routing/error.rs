//! Route planning errors.

use std::path::PathBuf;
use thiserror::Error;

/// Integrity errors in a site plan, detected before any file is written.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("output file `{}` is planned twice (experiences `{first}` and `{second}`)", .path.display())]
    DuplicateOutFile {
        path: PathBuf,
        first: String,
        second: String,
    },

    #[error("url `{url}` is planned twice")]
    DuplicateUrl { url: String },

    #[error("alias `{}` redirects to `{redirect_to}`, which is not a planned page", .alias.display())]
    DanglingAlias { alias: PathBuf, redirect_to: String },
}
