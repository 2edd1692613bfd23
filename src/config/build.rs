//! `[build]` section configuration.
//!
//! Input and output locations plus build switches.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in sitegen.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// store = "micro"              # Micro store root
/// output = "generated"         # Output directory (wiped on build)
/// legacy_posts = "content/posts"
/// minify = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Micro store root directory.
    #[serde(default = "defaults::build::store")]
    #[educe(Default = defaults::build::store())]
    pub store: PathBuf,

    /// Build output directory. Removed and recreated on every build.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Directory of legacy flat-file post records (`*.json`).
    #[serde(default = "defaults::build::legacy_posts")]
    #[educe(Default = defaults::build::legacy_posts())]
    pub legacy_posts: PathBuf,

    /// Directory that legacy experience hrefs are resolved against.
    #[serde(default = "defaults::build::legacy_root")]
    #[educe(Default = defaults::build::legacy_root())]
    pub legacy_root: PathBuf,

    /// File name of the route manifest written at the output root.
    #[serde(default = "defaults::build::routes_filename")]
    #[educe(Default = defaults::build::routes_filename())]
    pub routes_filename: String,

    /// Emit `_buildinfo.json` at the output root.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub buildinfo: bool,

    /// Minify rendered HTML pages.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Pin timestamps to `SOURCE_DATE_EPOCH` (or 0).
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub deterministic: bool,

    /// Fixed build label, overriding `<timestamp>-<git sha>`.
    #[serde(default = "defaults::build::label")]
    #[educe(Default = defaults::build::label())]
    pub label: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();
        assert_eq!(config.build.store, PathBuf::from("micro"));
        assert_eq!(config.build.output, PathBuf::from("generated"));
        assert_eq!(config.build.legacy_posts, PathBuf::from("content/posts"));
        assert_eq!(config.build.routes_filename, "routes.json");
        assert!(config.build.buildinfo);
        assert!(!config.build.minify);
        assert!(!config.build.deterministic);
        assert_eq!(config.build.label, None);
    }

    #[test]
    fn test_build_config_custom() {
        let config = r#"
            [build]
            store = "data/micro"
            output = "dist"
            minify = true
            deterministic = true
            label = "release-1"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();
        assert_eq!(config.build.store, PathBuf::from("data/micro"));
        assert_eq!(config.build.output, PathBuf::from("dist"));
        assert!(config.build.minify);
        assert!(config.build.deterministic);
        assert_eq!(config.build.label.as_deref(), Some("release-1"));
    }

    #[test]
    fn test_build_config_unknown_field() {
        let result: Result<SiteConfig, _> = toml::from_str("[build]\nclean = true\n");
        assert!(result.is_err());
    }
}
