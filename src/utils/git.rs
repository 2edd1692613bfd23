//! Git metadata for build labels.

use std::path::Path;

/// Placeholder used when the project is not inside a git repository.
pub const NO_GIT: &str = "nogit";

/// Length of the abbreviated commit id in build labels.
const SHORT_SHA_LEN: usize = 7;

/// Abbreviated `HEAD` commit id of the repository containing `root`.
///
/// Returns `None` outside a repository or before the first commit.
pub fn short_head_sha(root: &Path) -> Option<String> {
    let repo = gix::discover(root).ok()?;
    let head = repo.head_id().ok()?;
    Some(head.to_hex_with_len(SHORT_SHA_LEN).to_string())
}
