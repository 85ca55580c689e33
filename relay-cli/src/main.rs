//! Relay: publish application builds and keep installs in sync with them.
//!
//! # Usage
//!
//! ```text
//! relay manifest <source> [--include <glob>] [--exclude <suffix>] [--manifest-name <name>]
//! relay publish <source> <destination> [--target local|ftp] [--version <v>] [--commit <stamp>]
//! relay update <remote> <local> [--target local|http] [--retries <n>]
//! relay verify <manifest-file> <local> [--json]
//! ```
//!
//! Every command reads `relay.yaml` (see `relay_core::config`) unless
//! `--config` points elsewhere.

mod commands;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use commands::{
    manifest::ManifestArgs, publish::PublishArgs, update::UpdateArgs, verify::VerifyArgs,
};
use relay_core::{config, RelayConfig};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "relay",
    version,
    about = "Publish application builds and update installs from them",
    long_about = None,
)]
struct Cli {
    /// Path to a relay.yaml config file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Hash a directory and write its manifest next to the files.
    Manifest(ManifestArgs),

    /// Build a manifest, stamp it and push the build to a target.
    Publish(PublishArgs),

    /// Bring a local install in line with a published build.
    Update(UpdateArgs),

    /// Check a local tree against a manifest file.
    Verify(VerifyArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(cli.config.as_deref())?;
    tracing::debug!("running {:?}", cli.command);
    let result = match cli.command {
        Commands::Manifest(args) => args.run(&config),
        Commands::Publish(args) => args.run(&config),
        Commands::Update(args) => args.run(&config),
        Commands::Verify(args) => args.run(),
    };
    if let Err(err) = &result {
        tracing::debug!("command failed: {err:#}");
    }
    result
}

fn load_config(explicit: Option<&Path>) -> Result<RelayConfig> {
    let cwd = std::env::current_dir().context("could not determine current directory")?;
    config::discover(explicit, &cwd).context("failed to load configuration")
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
