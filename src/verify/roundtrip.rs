//! Legacy → micro → legacy losslessness, checked per post.

use rustc_hash::FxHashMap;

use super::{VerifyError, unified_diff};
use crate::legacy::{LegacyPosts, LegacyRecord, legacy_to_micro, micro_to_legacy};
use crate::store::Block;
use crate::store::fingerprint::sort_keys;
use crate::utils::fs::pretty_json;

/// Convert every record to the micro representation and back, comparing the
/// restored record with the raw file content.
///
/// Posts that failed to load are reported next to the diffs of posts that
/// loaded but changed. Returns the number of verified records.
pub fn verify_roundtrip(posts: &LegacyPosts) -> anyhow::Result<usize> {
    let mut diffs: Vec<String> = posts
        .failures
        .iter()
        .map(|failure| format!("legacy/{}: {}", failure.file_name, failure.error))
        .collect();

    for record in &posts.records {
        if let Some(diff) = check_record(record)? {
            diffs.push(diff);
        }
    }

    if diffs.is_empty() {
        Ok(posts.records.len())
    } else {
        Err(VerifyError::RoundTripMismatch {
            count: diffs.len(),
            diffs,
        }
        .into())
    }
}

/// Diff of one record against its restored form, if they differ.
fn check_record(record: &LegacyRecord) -> anyhow::Result<Option<String>> {
    let (entity, blocks) = legacy_to_micro(&record.post);
    let by_id: FxHashMap<String, Block> = blocks.into_iter().map(|b| (b.id, b.block)).collect();
    let restored = micro_to_legacy(&entity, |id| by_id.get(id))?;
    let restored = serde_json::to_value(&restored)?;

    if sort_keys(&restored) == sort_keys(&record.raw) {
        return Ok(None);
    }
    Ok(Some(unified_diff(
        &pretty_json(&record.raw),
        &pretty_json(&restored),
        &format!("legacy/{}", record.file_name),
        &format!("roundtrip/{}", record.file_name),
    )))
}
