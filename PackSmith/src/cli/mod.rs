//! PackSmith CLI - Command-line interface for Total War pack archives

pub mod commands;
pub mod progress;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use commands::Commands;

use crate::profile::GameProfile;
use crate::schema::SchemaRegistry;

#[derive(Parser)]
#[command(name = "packsmith")]
#[command(about = "PackSmith: Total War pack archive tools", long_about = None)]
struct Cli {
    /// Game profile (TOML). Defaults to `<config dir>/packsmith/profile.toml`
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Run the PackSmith CLI
pub fn run_cli() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let profile = load_profile(cli.profile.as_deref())?;
    cli.command.execute(&profile)?;

    Ok(())
}

fn load_profile(explicit: Option<&Path>) -> anyhow::Result<GameProfile> {
    if let Some(path) = explicit {
        return GameProfile::load(path)
            .with_context(|| format!("Failed to load profile {}", path.display()));
    }

    match GameProfile::default_path() {
        Some(path) if path.is_file() => GameProfile::load(&path)
            .with_context(|| format!("Failed to load profile {}", path.display())),
        _ => {
            tracing::warn!("No game profile found; DB tables will not decode");
            Ok(GameProfile::new("default", SchemaRegistry::new()))
        }
    }
}
