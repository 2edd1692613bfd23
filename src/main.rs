//! sitegen - compiles a content-addressed micro store into a static,
//! multi-experience site.

mod build;
mod cli;
mod compiler;
mod config;
mod export;
mod legacy;
mod logger;
mod routing;
mod snapshot;
mod store;
mod utils;
mod verify;
mod view;

use anyhow::Result;
use build::{build_site, check_determinism};
use clap::Parser;
use cli::{Cli, Commands};
use config::SiteConfig;
use export::export_site;
use snapshot::{check_snapshot, snapshot_site, verify_posts};
use std::path::Path;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Build { build_args } => {
            let experiences = config.select_experiences(&build_args.experiences)?;
            if build_args.check {
                check_determinism(&config, &experiences)?;
            } else {
                build_site(&config, &experiences)?;
            }
            Ok(())
        }
        Commands::Snapshot { check, .. } => {
            let (posts, out) = (&config.build.legacy_posts, &config.build.store);
            if *check {
                check_snapshot(posts, out)
            } else {
                snapshot_site(posts, out)
            }
        }
        Commands::Verify { .. } => verify_posts(&config.build.legacy_posts),
        Commands::Export { out, .. } => {
            let out = SiteConfig::normalize_path(&config.root.join(out));
            export_site(&config, &out).map(|_| ())
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &Cli) -> Result<SiteConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        SiteConfig::from_path(&config_path)?
    } else {
        SiteConfig::default()
    };
    config.update_with_cli(cli);
    // Only `build` requires the file; the store commands run on defaults
    config.validate(cli)?;

    Ok(config)
}
