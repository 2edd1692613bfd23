//! `[[experiences]]` configuration.
//!
//! An experience is one presentation variant of the shared content. Generated
//! experiences get pages rendered by this crate; legacy experiences point at
//! hand-maintained pages and only contribute routes.

use educe::Educe;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Component, Path};

/// How an experience's pages come into existence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceKind {
    /// Pages rendered from the micro store (default).
    #[default]
    Generated,
    /// Pre-existing pages, recorded as passthrough routes.
    Legacy,
}

/// Declared route patterns of a legacy experience.
///
/// `detail` may contain `{slug}`, replaced by each content id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoutePatterns {
    pub home: Option<String>,
    pub list: Option<String>,
    pub detail: Option<String>,
}

/// One `[[experiences]]` entry.
///
/// # Example
/// ```toml
/// [[experiences]]
/// key = "hina"
/// name = "Hina"
///
/// [[experiences]]
/// key = "ruri"
/// kind = "legacy"
/// home = "nagi-s1/index.html"
/// content = { ep01 = "nagi-s1/story1.html" }
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct ExperienceConfig {
    /// Unique key; entities select an experience through their `variant`.
    pub key: String,

    #[serde(default)]
    pub kind: ExperienceKind,

    /// Display name (defaults to the key).
    #[serde(default)]
    pub name: Option<String>,

    /// Output directory below the output root (defaults to the key).
    #[serde(default)]
    pub output_dir: Option<String>,

    /// Legacy home href, preferred over `routes.home`.
    #[serde(default)]
    pub home: Option<String>,

    /// Short description shown on the home page.
    #[serde(default)]
    pub summary: Option<String>,

    #[serde(default)]
    pub routes: RoutePatterns,

    /// Legacy content hrefs, keyed by content id.
    #[serde(default)]
    pub content: BTreeMap<String, String>,
}

impl ExperienceConfig {
    #[cfg(test)]
    pub fn generated(key: &str) -> Self {
        Self {
            key: key.to_owned(),
            ..Default::default()
        }
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.key)
    }

    /// Output directory relative to the output root.
    pub fn output_dir(&self) -> &str {
        self.output_dir.as_deref().unwrap_or(&self.key)
    }

    pub const fn is_generated(&self) -> bool {
        matches!(self.kind, ExperienceKind::Generated)
    }

    /// Whether `output_dir()` stays strictly inside the output root.
    pub fn has_safe_output_dir(&self) -> bool {
        let dir = self.output_dir();
        !dir.is_empty()
            && Path::new(dir)
                .components()
                .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
            && Path::new(dir).components().any(|c| matches!(c, Component::Normal(_)))
    }
}
