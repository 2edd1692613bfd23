//! Filesystem helpers shared by the store, verifier and build pipeline.

use anyhow::{Context, Result};
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

use crate::store::fingerprint::sort_keys;

/// Failure to read a JSON document.
#[derive(Debug, Error)]
pub enum JsonReadError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Read and parse a JSON file into a generic value.
pub fn read_json(path: &Path) -> Result<Value, JsonReadError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Key-sorted, 2-space indented JSON text with a trailing newline.
pub fn pretty_json(value: &Value) -> String {
    let mut text = serde_json::to_string_pretty(&sort_keys(value)).unwrap_or_default();
    text.push('\n');
    text
}

/// Write `value` as stable pretty JSON, creating parent directories.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    write_file(path, pretty_json(value).as_bytes())
}

/// Write bytes to `path`, creating parent directories.
pub fn write_file(path: &Path, content: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// `*.json` files directly inside `dir`, sorted by file name.
pub fn json_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if entry.file_type().is_file() && path.extension().is_some_and(|ext| ext == "json") {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// File stems of the `*.json` files directly inside `dir`, sorted.
pub fn json_stems(dir: &Path) -> io::Result<Vec<String>> {
    Ok(json_files(dir)?
        .iter()
        .filter_map(|path| path.file_stem())
        .map(|stem| stem.to_string_lossy().into_owned())
        .collect())
}

/// All files under `dir` as sorted, `/`-separated relative paths.
pub fn collect_relative_files(dir: &Path) -> Vec<String> {
    let mut files: Vec<String> = WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| {
            let rel = e.path().strip_prefix(dir).ok()?;
            Some(to_slash(rel))
        })
        .collect();
    files.sort();
    files
}

/// Render a relative path with `/` separators regardless of platform.
pub fn to_slash(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Remove `dir` and everything below it, if it exists.
pub fn remove_dir_all_if_exists(dir: &Path) -> Result<()> {
    if dir.exists() {
        fs::remove_dir_all(dir)
            .with_context(|| format!("Failed to clear directory {}", dir.display()))?;
    }
    Ok(())
}

/// Recursively copy the contents of `src` into `dst`.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.with_context(|| format!("Failed to walk {}", src.display()))?;
        let rel = entry.path().strip_prefix(src)?;
        let target = dst.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)
                .with_context(|| format!("Failed to create directory {}", target.display()))?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)
                .with_context(|| format!("Failed to copy {}", entry.path().display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_pretty_json_sorted_with_newline() {
        let text = pretty_json(&json!({"b": 1, "a": {"d": [], "c": "世"}}));
        assert_eq!(text, "{\n  \"a\": {\n    \"c\": \"世\",\n    \"d\": []\n  },\n  \"b\": 1\n}\n");
    }

    #[test]
    fn test_json_files_sorted_and_filtered() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.json"), "{}").unwrap();
        fs::write(dir.path().join("a.json"), "{}").unwrap();
        fs::write(dir.path().join("notes.txt"), "").unwrap();
        fs::create_dir(dir.path().join("nested.json")).unwrap();

        assert_eq!(json_stems(dir.path()).unwrap(), ["a", "b"]);
    }

    #[test]
    fn test_collect_relative_files_and_copy() {
        let src = TempDir::new().unwrap();
        write_file(&src.path().join("x/y/index.html"), b"hi").unwrap();
        write_file(&src.path().join("routes.json"), b"{}").unwrap();
        assert_eq!(collect_relative_files(src.path()), ["routes.json", "x/y/index.html"]);

        let dst = TempDir::new().unwrap();
        copy_dir_all(src.path(), dst.path()).unwrap();
        assert_eq!(fs::read_to_string(dst.path().join("x/y/index.html")).unwrap(), "hi");
    }

    #[test]
    fn test_read_json_errors() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(read_json(&missing), Err(JsonReadError::Io(_))));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{").unwrap();
        assert!(matches!(read_json(&broken), Err(JsonReadError::Json(_))));
    }
}
