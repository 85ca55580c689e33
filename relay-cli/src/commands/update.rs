//! `relay update`: reconcile a local install with a published build.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Args;
use colored::Colorize;

use relay_core::{HttpConfig, RelayConfig, TransportKind};
use relay_sync::{SyncError, UpdateOptions, UpdateOutcome, Updater};
use relay_transport::{HttpLoader, LocalLoader, Loader};

use super::with_progress;

/// Arguments for `relay update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Published build: a directory for `local`, a base URL for `http`.
    pub remote: String,

    /// Local install directory to bring up to date.
    pub local: PathBuf,

    /// Transport to load through.
    #[arg(long, default_value = "local")]
    pub target: TransportKind,

    /// Download attempts before giving up (defaults to config `retries`).
    #[arg(long)]
    pub retries: Option<u32>,
}

impl UpdateArgs {
    pub fn run(self, config: &RelayConfig) -> Result<()> {
        let loader = loader_for(self.target, &self.remote, config)?;
        let mut options = UpdateOptions::from_config(config);
        if let Some(retries) = self.retries {
            options.max_attempts = retries;
        }
        let updater = Updater::new(loader, options);
        let local = self.local;

        let result = with_progress(false, |reporter| updater.update(&local, reporter));
        match result {
            Ok(UpdateOutcome::UpToDate) => {
                println!("{} {} is up to date", "✓".green(), local.display());
                Ok(())
            }
            Ok(UpdateOutcome::Synced { updated, attempts }) => {
                println!(
                    "{} updated {} file(s) in {} after {attempts} attempt(s)",
                    "✓".green(),
                    updated.len(),
                    local.display()
                );
                Ok(())
            }
            Err(SyncError::RetryExhausted {
                attempts,
                remaining,
            }) => {
                for entry in &remaining {
                    eprintln!("  {} {}", "✗".red(), entry.relative_path);
                }
                bail!(
                    "{} file(s) could not be downloaded after {attempts} attempt(s); {} was left unchanged",
                    remaining.len(),
                    local.display()
                )
            }
            Err(err) => Err(anyhow::Error::new(err)
                .context(format!("failed to update {}", local.display()))),
        }
    }
}

fn loader_for(target: TransportKind, remote: &str, config: &RelayConfig) -> Result<Box<dyn Loader>> {
    match target {
        TransportKind::Local => {
            Ok(Box::new(LocalLoader::new(remote).with_concurrency(config.concurrency)))
        }
        TransportKind::Http => {
            let mut http = config.http.clone().unwrap_or_else(|| {
                let mut http = HttpConfig::new(remote);
                http.concurrent_downloads = config.concurrency;
                http
            });
            http.url = remote.to_string();
            Ok(Box::new(HttpLoader::new(http)?))
        }
        other => bail!("{other} cannot be used as an update source"),
    }
}
