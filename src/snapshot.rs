//! Legacy posts → micro store snapshots, and their verification.

use anyhow::{Context, Result};
use std::path::Path;

use crate::{
    legacy::{load_legacy_dir, snapshot_from_legacy},
    log,
    store::snapshot::write_snapshot,
    verify::{VerifyError, compare_dirs, verify_roundtrip},
};

/// Regenerate the micro store at `out` from the legacy posts in `posts`.
pub fn snapshot_site(posts: &Path, out: &Path) -> Result<()> {
    let records = load_legacy_dir(posts)?.into_records()?;
    let (entities, blocks) = snapshot_from_legacy(&records);
    let index = write_snapshot(out, &entities, &blocks)?;
    log!(
        "snapshot";
        "wrote {} entities, {} blocks to {}",
        index.entity_ids.len(),
        index.block_ids.len(),
        out.display()
    );
    Ok(())
}

/// Regenerate into a temporary directory and require it to match `out`
/// exactly, then require every post to survive the round trip.
pub fn check_snapshot(posts: &Path, out: &Path) -> Result<()> {
    let temp = tempfile::TempDir::new().context("Failed to create temporary snapshot root")?;
    let fresh = temp.path().join("snapshot");
    snapshot_site(posts, &fresh)?;

    if let Some(diff) = compare_dirs(out, &fresh)? {
        return Err(VerifyError::SnapshotMismatch { diff }.into());
    }
    log!("verify"; "snapshot {} is up to date", out.display());

    verify_posts(posts)
}

/// Check that every legacy post survives legacy → micro → legacy.
pub fn verify_posts(posts: &Path) -> Result<()> {
    let count = verify_roundtrip(&load_legacy_dir(posts)?)?;
    log!("verify"; "round trip ok: {} posts", count);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MicroStore;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn posts(dir: &Path) {
        fs::create_dir_all(dir).unwrap();
        let post = json!({
            "contentId": "ep01", "experience": "hina", "pageType": "episode",
            "title": "One", "render": {"kind": "html", "html": "<p>1</p>"}
        });
        fs::write(dir.join("ep01.json"), post.to_string()).unwrap();
    }

    #[test]
    fn test_snapshot_loads_as_store() {
        let dir = TempDir::new().unwrap();
        let (legacy, out) = (dir.path().join("posts"), dir.path().join("micro"));
        posts(&legacy);

        snapshot_site(&legacy, &out).unwrap();
        let store = MicroStore::load(&out).unwrap();
        assert_eq!(store.entity_count(), 1);
        assert_eq!(store.block_count(), 1);
    }

    #[test]
    fn test_check_detects_stale_snapshot() {
        let dir = TempDir::new().unwrap();
        let (legacy, out) = (dir.path().join("posts"), dir.path().join("micro"));
        posts(&legacy);
        snapshot_site(&legacy, &out).unwrap();
        check_snapshot(&legacy, &out).unwrap();

        fs::write(out.join("entities/ep01.json"), "{}\n").unwrap();
        let err = check_snapshot(&legacy, &out).unwrap_err();
        let Some(VerifyError::SnapshotMismatch { diff }) = err.downcast_ref::<VerifyError>() else {
            panic!("expected snapshot mismatch, got {err}");
        };
        assert!(diff.contains("micro/entities/ep01.json"));
        assert!(diff.contains("snapshot/entities/ep01.json"));
    }

    #[test]
    fn test_snapshot_refuses_broken_post() {
        let dir = TempDir::new().unwrap();
        let (legacy, out) = (dir.path().join("posts"), dir.path().join("micro"));
        posts(&legacy);
        fs::write(legacy.join("zz.json"), "{").unwrap();

        assert!(snapshot_site(&legacy, &out).is_err());
        assert!(!out.exists());
        assert!(verify_posts(&legacy).is_err());
    }
}
