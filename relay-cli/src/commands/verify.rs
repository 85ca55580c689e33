//! `relay verify`: report which files of a local tree differ from a manifest.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use relay_core::Manifest;
use relay_sync::validator::{self, InvalidEntry, Problem};

use super::with_progress;

/// Arguments for `relay verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Manifest file to check against.
    pub manifest: PathBuf,

    /// Local tree to check.
    pub local: PathBuf,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Serialize)]
struct VerifyReportJson {
    checked: usize,
    invalid: Vec<InvalidEntryJson>,
}

#[derive(Serialize)]
struct InvalidEntryJson {
    path: String,
    expected: String,
    problem: &'static str,
    detail: String,
}

#[derive(Tabled)]
struct InvalidRow {
    #[tabled(rename = "file")]
    file: String,
    #[tabled(rename = "problem")]
    problem: String,
    #[tabled(rename = "expected hash")]
    expected: String,
}

impl VerifyArgs {
    pub fn run(self) -> Result<()> {
        let manifest = Manifest::load(&self.manifest)
            .with_context(|| format!("failed to read manifest {}", self.manifest.display()))?;
        let local = self.local;

        let invalid = with_progress(self.json, |reporter| {
            validator::inspect(&manifest, &local, reporter)
        });

        if self.json {
            print_json(manifest.len(), &invalid)?;
        } else {
            print_table(manifest.len(), &invalid);
        }

        if !invalid.is_empty() {
            bail!("{} of {} file(s) are invalid", invalid.len(), manifest.len());
        }
        Ok(())
    }
}

fn problem_key(problem: &Problem) -> &'static str {
    match problem {
        Problem::Missing => "missing",
        Problem::HashMismatch { .. } => "hash_mismatch",
        Problem::Unreadable { .. } => "unreadable",
        Problem::OutsideRoot { .. } => "outside_root",
    }
}

fn print_json(checked: usize, invalid: &[InvalidEntry]) -> Result<()> {
    let payload = VerifyReportJson {
        checked,
        invalid: invalid
            .iter()
            .map(|item| InvalidEntryJson {
                path: item.entry.relative_path.clone(),
                expected: item.entry.content_hash.clone(),
                problem: problem_key(&item.problem),
                detail: item.problem.to_string(),
            })
            .collect(),
    };
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).context("failed to serialize report")?
    );
    Ok(())
}

fn print_table(checked: usize, invalid: &[InvalidEntry]) {
    if invalid.is_empty() {
        println!("{} all {checked} file(s) match the manifest", "✓".green());
        return;
    }

    let rows: Vec<InvalidRow> = invalid
        .iter()
        .map(|item| InvalidRow {
            file: item.entry.relative_path.clone(),
            problem: item.problem.to_string(),
            expected: item.entry.content_hash.clone(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!(
        "{} {} of {checked} file(s) invalid",
        "✗".red(),
        invalid.len()
    );
}
