//! Relative href computation between output paths.
//!
//! All functions are lexical: they never touch the filesystem, so plans can be
//! computed before anything is written. Both arguments of a comparison must be
//! either absolute or relative to the same root.

use std::path::{Component, Path, PathBuf};

/// Page file name collapsed to a trailing slash in pretty URLs.
pub const INDEX_FILE: &str = "index.html";

/// Lexically normalize a path: drop `.`, fold `name/..`.
///
/// Leading `..` segments of a relative path are kept.
pub fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => parts.push(component),
            },
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// POSIX-style relative href from directory `base` to `target`.
///
/// Returns `.` when both name the same path.
pub fn relative_href(target: &Path, base: &Path) -> String {
    let target = normalize(target);
    let base = normalize(base);
    let target: Vec<Component> = target.components().collect();
    let base: Vec<Component> = base.components().collect();

    let common = target
        .iter()
        .zip(&base)
        .take_while(|(a, b)| a == b)
        .count();

    let parts: Vec<String> = std::iter::repeat_n("..".to_owned(), base.len() - common)
        .chain(
            target[common..]
                .iter()
                .map(|c| c.as_os_str().to_string_lossy().into_owned()),
        )
        .collect();

    if parts.is_empty() {
        ".".to_owned()
    } else {
        parts.join("/")
    }
}

/// Pretty href from `base` to `target`.
///
/// With `collapse_index`, a final `index.html` segment becomes a trailing
/// slash (`./` when the target is the base directory's own index).
pub fn relative_route(target: &Path, base: &Path, collapse_index: bool) -> String {
    let href = relative_href(target, base);
    if !collapse_index {
        return href;
    }
    if href == INDEX_FILE {
        return "./".to_owned();
    }
    match href.strip_suffix(INDEX_FILE) {
        Some(dir) if dir.ends_with('/') => dir.to_owned(),
        _ => href,
    }
}

/// Resolve `href` as a browser would from a page in directory `base`.
///
/// Directory hrefs (`./`, `dir/`, `.`) resolve to their `index.html`.
pub fn resolve_href(base: &Path, href: &str) -> PathBuf {
    let mut path = normalize(&base.join(href));
    if href.is_empty() || href.ends_with('/') || href == "." || href.ends_with("/.") {
        path.push(INDEX_FILE);
    }
    path
}
