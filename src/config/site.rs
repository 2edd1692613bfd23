//! `[site]` section configuration.
//!
//! Presentation settings shared by every experience.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in sitegen.toml - site-wide presentation settings.
///
/// # Example
/// ```toml
/// [site]
/// title = "Nagi"
/// language = "ja"
/// base_path = "/generated/"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Site title used in page titles.
    #[serde(default = "defaults::site::title")]
    #[educe(Default = defaults::site::title())]
    pub title: String,

    /// BCP 47 language code for `<html lang>` of pages and redirect stubs.
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,

    /// Site-absolute prefix of the output root (canonical links).
    #[serde(default = "defaults::site::base_path")]
    #[educe(Default = defaults::site::base_path())]
    pub base_path: String,

    /// Navigation label for home pages.
    #[serde(default = "defaults::site::home_label")]
    #[educe(Default = defaults::site::home_label())]
    pub home_label: String,

    /// Navigation label for list pages.
    #[serde(default = "defaults::site::list_label")]
    #[educe(Default = defaults::site::list_label())]
    pub list_label: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_site_section_defaults() {
        let config: SiteConfig = toml::from_str("[site]\n").unwrap();
        assert_eq!(config.site.title, "Micro World");
        assert_eq!(config.site.language, "ja");
        assert_eq!(config.site.base_path, "/");
        assert_eq!(config.site.home_label, "ホーム");
        assert_eq!(config.site.list_label, "一覧");
    }

    #[test]
    fn test_site_section_full() {
        let config = r#"
            [site]
            title = "Nagi 🌊"
            language = "en"
            base_path = "/generated/"
            home_label = "Home"
            list_label = "All"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();
        assert_eq!(config.site.title, "Nagi 🌊");
        assert_eq!(config.site.language, "en");
        assert_eq!(config.site.base_path, "/generated/");
        assert_eq!(config.site.list_label, "All");
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str("[site]\nauthor = \"x\"\n");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }
}
