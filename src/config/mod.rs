//! Site configuration management for `sitegen.toml`.
//!
//! # Sections
//!
//! | Section           | Purpose                                        |
//! |-------------------|------------------------------------------------|
//! | `[site]`          | Title, language, base path, navigation labels  |
//! | `[build]`         | Store/output/legacy paths and build switches   |
//! | `[theme]`         | CSS custom-property overrides                  |
//! | `[[experiences]]` | Presentation variants (generated or legacy)    |
//!
//! # Example
//!
//! ```toml
//! [site]
//! title = "Nagi"
//!
//! [build]
//! store = "micro"
//! output = "generated"
//!
//! [theme]
//! mw-text-color = "#111"
//!
//! [[experiences]]
//! key = "hina"
//! ```

mod build;
pub mod defaults;
mod error;
mod experience;
mod site;

pub use build::BuildConfig;
pub use error::ConfigError;
pub use experience::{ExperienceConfig, ExperienceKind, RoutePatterns};
pub use site::SiteSection;

use crate::cli::{Cli, Commands};
use anyhow::Result;
use educe::Educe;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing sitegen.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute project root (set after loading)
    #[serde(skip)]
    #[educe(Default = PathBuf::from("./"))]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site-wide presentation settings
    #[serde(default)]
    pub site: SiteSection,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,

    /// Theme token overrides, emitted in sorted order
    #[serde(default)]
    pub theme: BTreeMap<String, String>,

    /// Experiences in switcher order
    #[serde(default)]
    pub experiences: Vec<ExperienceConfig>,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli.root.clone().unwrap_or_else(|| PathBuf::from("./"));

        match &cli.command {
            Commands::Build { build_args } => {
                Self::update_option(&mut self.build.output, build_args.out.as_ref());
                Self::update_option(&mut self.build.store, build_args.store.as_ref());
                Self::update_option(&mut self.build.minify, build_args.minify.as_ref());
                if build_args.label.is_some() {
                    self.build.label = build_args.label.clone();
                }
                // --check pins timestamps so both runs agree
                self.build.deterministic |= build_args.deterministic || build_args.check;
            }
            Commands::Snapshot { posts, out, .. } => {
                Self::update_option(&mut self.build.legacy_posts, posts.as_ref());
                Self::update_option(&mut self.build.store, out.as_ref());
            }
            Commands::Verify { posts } => {
                Self::update_option(&mut self.build.legacy_posts, posts.as_ref());
            }
            Commands::Export { store, .. } => {
                Self::update_option(&mut self.build.store, store.as_ref());
            }
        }

        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths against the root directory and normalize to absolute paths
    pub fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(root);

        self.config_path = Self::normalize_path(&root.join(config));
        self.build.store = Self::normalize_path(&root.join(&self.build.store));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
        self.build.legacy_posts = Self::normalize_path(&root.join(&self.build.legacy_posts));
        self.build.legacy_root = Self::normalize_path(&root.join(&self.build.legacy_root));
        self.root = root;
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    pub fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            // For non-existent paths, manually make them absolute
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration for the current command
    pub fn validate(&self, cli: &Cli) -> Result<(), ConfigError> {
        let mut seen = FxHashSet::default();
        for experience in &self.experiences {
            if experience.key.is_empty() {
                return Err(ConfigError::EmptyExperienceKey);
            }
            if !seen.insert(experience.key.as_str()) {
                return Err(ConfigError::DuplicateExperience(experience.key.clone()));
            }
            if !experience.has_safe_output_dir() {
                return Err(ConfigError::UnsafeOutputDir(experience.key.clone()));
            }
        }

        let routes = &self.build.routes_filename;
        if routes.is_empty() || routes.contains(['/', '\\']) {
            return Err(ConfigError::RoutesFilename(routes.clone()));
        }

        if let Commands::Build { build_args } = &cli.command {
            if !self.config_path.exists() {
                return Err(ConfigError::MissingConfig(self.config_path.clone()));
            }
            if self.experiences.is_empty() {
                return Err(ConfigError::NoExperiences);
            }
            self.check_output_overlap()?;
            self.select_experiences(&build_args.experiences)?;
        }

        Ok(())
    }

    /// The output root is wiped on every build: it must not be, or contain,
    /// any input directory.
    fn check_output_overlap(&self) -> Result<(), ConfigError> {
        let output = &self.build.output;
        let inputs = [
            ("project root", &self.root),
            ("store", &self.build.store),
            ("legacy posts directory", &self.build.legacy_posts),
            ("legacy root", &self.build.legacy_root),
        ];
        match inputs.into_iter().find(|(_, path)| path.starts_with(output)) {
            Some((input, path)) => Err(ConfigError::OutputOverlapsInput {
                output: output.clone(),
                input,
                path: path.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Experiences restricted to `keys`, in configuration order.
    ///
    /// An empty filter selects every experience; unknown keys are an error.
    pub fn select_experiences(&self, keys: &[String]) -> Result<Vec<&ExperienceConfig>, ConfigError> {
        if keys.is_empty() {
            return Ok(self.experiences.iter().collect());
        }

        let mut missing: Vec<String> = keys
            .iter()
            .filter(|key| !self.experiences.iter().any(|exp| &exp.key == *key))
            .cloned()
            .collect();
        if !missing.is_empty() {
            missing.sort();
            missing.dedup();
            return Err(ConfigError::UnknownExperience(missing));
        }

        Ok(self
            .experiences
            .iter()
            .filter(|exp| keys.contains(&exp.key))
            .collect())
    }
}

// ============================================================================
// Tests
// ============================================================================
