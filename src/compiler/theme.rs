//! Shared stylesheet for compiled markup.
//!
//! The stylesheet depends only on the theme overrides, never on which
//! entities were compiled.

use std::collections::BTreeMap;

/// Base rules, one per markup class emitted by the compiler.
const BASE_RULES: &[&str] = &[
    ":root {",
    "  --mw-font-size-base: 16px;",
    "  --mw-font-family: sans-serif;",
    "  --mw-text-color: #222;",
    "}",
    ".mw-heading { font-family: var(--mw-font-family); color: var(--mw-text-color); }",
    ".mw-paragraph { font-family: var(--mw-font-family); color: var(--mw-text-color); line-height: 1.6; }",
    ".mw-link { color: #0a6cff; text-decoration: underline; }",
    ".mw-image { margin: 1em 0; }",
    ".mw-image-img { max-width: 100%; height: auto; display: block; }",
    ".mw-image-caption { font-size: 0.9em; color: #555; }",
    ".mw-section { margin: 1.5em 0; }",
    ".mw-raw { margin: 1em 0; }",
    ".mw-md { margin: 1em 0; }",
];

/// Build the stylesheet: base rules, then one `:root` override per token in
/// sorted order.
///
/// Tokens may be given with or without the leading `--`.
pub fn apply_theme(theme: &BTreeMap<String, String>) -> String {
    let mut lines: Vec<String> = BASE_RULES.iter().map(|line| (*line).to_owned()).collect();
    for (token, value) in theme {
        let token = token.trim_start_matches("--");
        lines.push(format!(":root {{ --{token}: {value}; }}"));
    }
    let mut css = lines.join("\n");
    css.push('\n');
    css
}
