//! `relay manifest`: hash a directory and save its manifest.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use relay_core::RelayConfig;
use relay_sync::{build_manifest_with, FileFilter};

use super::with_progress;

/// Arguments for `relay manifest`.
#[derive(Args, Debug)]
pub struct ManifestArgs {
    /// Directory to hash.
    pub source: PathBuf,

    /// File-name glob a file must match (defaults to config `include`).
    #[arg(long)]
    pub include: Option<String>,

    /// File-name suffix to leave out (defaults to config `exclude`).
    #[arg(long)]
    pub exclude: Option<String>,

    /// Manifest file name (defaults to config `manifest_name`).
    #[arg(long)]
    pub manifest_name: Option<String>,
}

impl ManifestArgs {
    pub fn run(self, config: &RelayConfig) -> Result<()> {
        let manifest_name = self
            .manifest_name
            .unwrap_or_else(|| config.manifest_name.clone());
        let filter = FileFilter::new(
            self.include.unwrap_or_else(|| config.include.clone()),
            self.exclude.or_else(|| config.exclude.clone()),
        );
        let source = self.source;

        let manifest = with_progress(false, |reporter| {
            build_manifest_with(&source, &manifest_name, &filter, reporter)
        })
        .with_context(|| format!("failed to build manifest for {}", source.display()))?;

        let path = source.join(&manifest_name);
        manifest
            .save(&path)
            .with_context(|| format!("failed to write {}", path.display()))?;

        println!(
            "{} {} entries written to {}",
            "✓".green(),
            manifest.len(),
            path.display()
        );
        Ok(())
    }
}
