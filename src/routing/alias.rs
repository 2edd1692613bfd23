//! Redirect stubs for flat alias urls.

use std::path::PathBuf;

use super::SitePlan;
use crate::compiler::dom::escape_html;

impl SitePlan {
    /// One `(out_file, html)` stub per alias: a meta refresh plus a canonical
    /// link to the nested page, relative to the alias's own directory.
    pub fn render_aliases(&self, language: &str) -> Vec<(PathBuf, String)> {
        self.aliases()
            .map(|(_, alias)| (alias.out_file.clone(), alias_stub(language, &alias.redirect_to)))
            .collect()
    }
}

fn alias_stub(language: &str, redirect_to: &str) -> String {
    let lang = escape_html(language);
    let href = escape_html(redirect_to);
    [
        "<!doctype html>".to_owned(),
        format!(r#"<html lang="{lang}">"#),
        "  <head>".to_owned(),
        r#"    <meta charset="utf-8">"#.to_owned(),
        format!(r#"    <meta http-equiv="refresh" content="0; url={href}">"#),
        format!(r#"    <link rel="canonical" href="{href}">"#),
        "    <title>Redirecting…</title>".to_owned(),
        "  </head>".to_owned(),
        "  <body>".to_owned(),
        format!(r#"    <p>Redirecting to <a href="{href}">{href}</a></p>"#),
        "  </body>".to_owned(),
        "</html>".to_owned(),
    ]
    .join("\n")
}
