//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Micro store to static multi-experience site compiler
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name (default: sitegen.toml)
    #[arg(short = 'C', long, default_value = "sitegen.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Arguments of the build command
#[derive(clap::Args, Debug, Clone)]
pub struct BuildArgs {
    /// Output directory (relative to project root); wiped before writing
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Micro store root (relative to project root)
    #[arg(short, long)]
    pub store: Option<PathBuf>,

    /// Limit rendering to one or more experience keys (repeatable)
    #[arg(short, long = "experience")]
    pub experiences: Vec<String>,

    /// Use SOURCE_DATE_EPOCH (or 0) for the build label timestamp
    #[arg(long)]
    pub deterministic: bool,

    /// Override the build label (default combines timestamp and git sha)
    #[arg(long)]
    pub label: Option<String>,

    /// Build twice into temporary directories and fail if the outputs differ
    #[arg(long)]
    pub check: bool,

    /// Minify the html content
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build every experience from the micro store into the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },

    /// Convert legacy posts into a micro store snapshot
    Snapshot {
        /// Legacy posts directory
        #[arg(short, long)]
        posts: Option<PathBuf>,

        /// Snapshot directory (default: the configured store)
        #[arg(short, long)]
        out: Option<PathBuf>,

        /// Regenerate into a temporary directory and fail on any difference
        #[arg(long)]
        check: bool,
    },

    /// Check that every legacy post survives legacy -> micro -> legacy unchanged
    Verify {
        /// Legacy posts directory
        #[arg(short, long)]
        posts: Option<PathBuf>,
    },

    /// Compile the store and write one legacy record per entity
    Export {
        /// Micro store root
        #[arg(short, long)]
        store: Option<PathBuf>,

        /// Export directory (relative to project root)
        #[arg(short, long, default_value = "dist")]
        out: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_build() {
        let cli = Cli::parse_from([
            "sitegen", "build", "-e", "hina", "--experience", "ruri", "--check", "--minify=false",
        ]);
        let Commands::Build { build_args } = &cli.command else {
            panic!("expected build");
        };
        assert_eq!(build_args.experiences, ["hina", "ruri"]);
        assert!(build_args.check);
        assert_eq!(build_args.minify, Some(false));
        assert_eq!(cli.config, PathBuf::from("sitegen.toml"));
    }

    #[test]
    fn test_parse_export_default_out() {
        let cli = Cli::parse_from(["sitegen", "-r", "site", "export"]);
        assert_eq!(cli.root, Some(PathBuf::from("site")));
        let Commands::Export { out, store } = &cli.command else {
            panic!("expected export");
        };
        assert_eq!(out, &PathBuf::from("dist"));
        assert!(store.is_none());
    }
}
