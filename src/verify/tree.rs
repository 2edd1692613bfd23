//! Byte-level comparison of output trees and snapshot directories.

use anyhow::{Context, Result};
use std::{collections::BTreeMap, fs, path::Path};

use super::{VerifyError, unified_diff};
use crate::utils::fs::collect_relative_files;

/// Relative path → blake3 hex digest of every file under `root`.
pub fn hash_tree(root: &Path) -> Result<BTreeMap<String, String>> {
    collect_relative_files(root)
        .into_iter()
        .map(|rel| {
            let path = root.join(&rel);
            let bytes = fs::read(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((rel, blake3::hash(&bytes).to_hex().to_string()))
        })
        .collect()
}

fn listing(hashes: &BTreeMap<String, String>) -> String {
    hashes
        .iter()
        .map(|(path, hash)| format!("{path}  {hash}\n"))
        .collect()
}

/// Require two output trees to be byte-identical.
///
/// The report is a diff of the two `path  hash` listings followed by a
/// per-file diff of every text file present in both trees that differs.
pub fn compare_trees(a: &Path, b: &Path) -> Result<()> {
    let left = hash_tree(a)?;
    let right = hash_tree(b)?;
    if left == right {
        return Ok(());
    }

    let mut diff = unified_diff(&listing(&left), &listing(&right), "run1", "run2");
    for (rel, hash) in &left {
        let Some(other) = right.get(rel) else {
            continue;
        };
        if other == hash {
            continue;
        }
        let old = fs::read(a.join(rel))?;
        let new = fs::read(b.join(rel))?;
        if let (Ok(old), Ok(new)) = (std::str::from_utf8(&old), std::str::from_utf8(&new)) {
            diff.push_str(&unified_diff(old, new, &format!("run1/{rel}"), &format!("run2/{rel}")));
        }
    }

    Err(VerifyError::DeterminismMismatch { diff }.into())
}

fn json_contents(dir: &Path) -> Result<BTreeMap<String, String>> {
    collect_relative_files(dir)
        .into_iter()
        .filter(|rel| rel.ends_with(".json"))
        .map(|rel| {
            let path = dir.join(&rel);
            let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
            Ok((rel, text))
        })
        .collect()
}

/// Diff the `*.json` files of two directories.
///
/// Returns `None` when they match, otherwise one unified diff per differing
/// relative path, headed with each directory's name.
pub fn compare_dirs(a: &Path, b: &Path) -> Result<Option<String>> {
    let left = if a.exists() { json_contents(a)? } else { BTreeMap::new() };
    let right = if b.exists() { json_contents(b)? } else { BTreeMap::new() };

    let name = |dir: &Path| {
        dir.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    };
    let (name_a, name_b) = (name(a), name(b));

    let mut paths: Vec<&String> = left.keys().chain(right.keys()).collect();
    paths.sort();
    paths.dedup();

    let mut diff = String::new();
    for rel in paths {
        let old = left.get(rel).map_or("", String::as_str);
        let new = right.get(rel).map_or("", String::as_str);
        if old != new {
            diff.push_str(&unified_diff(old, new, &format!("{name_a}/{rel}"), &format!("{name_b}/{rel}")));
        }
    }

    Ok((!diff.is_empty()).then_some(diff))
}
