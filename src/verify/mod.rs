//! Build verification.
//!
//! - **tree**: byte-level comparison of two output trees (determinism) and of
//!   two snapshot directories
//! - **roundtrip**: legacy → micro → legacy losslessness
//!
//! Every failure carries a unified diff so the reason is visible without
//! re-running anything.

mod roundtrip;
mod tree;

pub use roundtrip::verify_roundtrip;
pub use tree::{compare_dirs, compare_trees};

use similar::TextDiff;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("builds from identical inputs differ:\n{diff}")]
    DeterminismMismatch { diff: String },

    #[error("{count} legacy post(s) do not survive the round trip:\n{}", .diffs.join("\n"))]
    RoundTripMismatch { count: usize, diffs: Vec<String> },

    #[error("snapshot is stale:\n{diff}")]
    SnapshotMismatch { diff: String },
}

/// Unified diff of two texts with `from`/`to` headers.
pub(crate) fn unified_diff(old: &str, new: &str, from: &str, to: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .context_radius(3)
        .header(from, to)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unified_diff_headers() {
        let diff = unified_diff("a\nb\n", "a\nc\n", "left/x", "right/x");
        assert!(diff.starts_with("--- left/x\n+++ right/x\n"));
        assert!(diff.contains("-b\n"));
        assert!(diff.contains("+c\n"));
    }

    #[test]
    fn test_mismatch_display() {
        let err = VerifyError::RoundTripMismatch {
            count: 2,
            diffs: vec!["d1".into(), "d2".into()],
        };
        assert_eq!(err.to_string(), "2 legacy post(s) do not survive the round trip:\nd1\nd2");
    }
}
