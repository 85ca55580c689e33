//! `relay publish`: build, stamp and push a build.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use relay_core::{RelayConfig, TransportKind};
use relay_sync::{build_and_publish, CommitSource, FileFilter, FixedCommit, GitCommit, PublishRequest};
use relay_transport::{FtpWriter, LocalWriter, Writer};

use super::with_progress;

/// Arguments for `relay publish`.
#[derive(Args, Debug)]
pub struct PublishArgs {
    /// Build output directory.
    pub source: PathBuf,

    /// Where to publish: a directory for `local`, a remote folder for `ftp`.
    pub destination: String,

    /// Transport to publish through.
    #[arg(long, default_value = "local")]
    pub target: TransportKind,

    /// Version string recorded in the manifest.
    #[arg(long)]
    pub version: Option<String>,

    /// Commit stamp to record instead of reading it from git.
    #[arg(long)]
    pub commit: Option<String>,
}

impl PublishArgs {
    pub fn run(self, config: &RelayConfig) -> Result<()> {
        let writer = writer_for(self.target, config)?;
        let commit: Box<dyn CommitSource> = match self.commit {
            Some(stamp) => Box::new(FixedCommit(stamp)),
            None => Box::new(GitCommit),
        };

        let mut request =
            PublishRequest::new(&self.source, &self.destination, &config.manifest_name)
                .with_filter(FileFilter::from_config(config));
        if let Some(version) = self.version {
            request = request.with_version(version);
        }

        let outcome = with_progress(false, |reporter| {
            build_and_publish(&request, writer.as_ref(), commit.as_ref(), reporter)
        })
        .with_context(|| {
            format!(
                "failed to publish {} to {}",
                self.source.display(),
                self.destination
            )
        })?;

        if !outcome.transfer.is_clean() {
            for failed in &outcome.transfer.failed {
                eprintln!("  {} {}: {}", "✗".red(), failed.relative_path, failed.reason);
            }
            bail!(
                "{} of {} file(s) failed to publish",
                outcome.transfer.failed.len(),
                outcome.transfer.attempted
            );
        }

        println!(
            "{} published {} file(s) to {} ({})",
            "✓".green(),
            outcome.manifest.len(),
            self.destination,
            outcome.manifest.commit.as_deref().unwrap_or("-").bright_black()
        );
        Ok(())
    }
}

fn writer_for(target: TransportKind, config: &RelayConfig) -> Result<Box<dyn Writer>> {
    match target {
        TransportKind::Local => Ok(Box::new(LocalWriter::new())),
        TransportKind::Ftp => {
            let ftp = config
                .ftp
                .clone()
                .context("publishing over ftp needs an `ftp` section in relay.yaml")?;
            Ok(Box::new(FtpWriter::new(ftp)?))
        }
        other => bail!("{other} cannot be used as a publish target"),
    }
}
