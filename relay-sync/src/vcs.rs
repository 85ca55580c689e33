//! Commit stamping for published manifests.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::SyncError;

/// How many parent directories are searched for a `.git` directory.
pub const MAX_PARENT_DEPTH: usize = 20;

/// Produces the `commit` stamp recorded in a published manifest.
pub trait CommitSource: Send + Sync {
    fn commit_for(&self, source_root: &Path) -> Result<String, SyncError>;
}

/// Reads `branch:shortHash` from the git repository enclosing the source.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCommit;

impl CommitSource for GitCommit {
    fn commit_for(&self, source_root: &Path) -> Result<String, SyncError> {
        let repo = find_git_root(source_root).ok_or_else(|| {
            SyncError::Commit(format!(
                "no git repository within {MAX_PARENT_DEPTH} levels above {}",
                source_root.display()
            ))
        })?;
        let branch = git(&repo, &["branch", "--show-current"])?;
        let hash = git(&repo, &["log", "-n", "1", "--pretty=format:%h"])?;
        if hash.is_empty() {
            return Err(SyncError::Commit(format!(
                "{} has no commits",
                repo.display()
            )));
        }
        // Detached checkouts report no branch name.
        let branch = if branch.is_empty() { "HEAD".to_string() } else { branch };
        Ok(format!("{branch}:{hash}"))
    }
}

/// A stamp supplied by the caller, e.g. from a CI variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedCommit(pub String);

impl CommitSource for FixedCommit {
    fn commit_for(&self, _source_root: &Path) -> Result<String, SyncError> {
        Ok(self.0.clone())
    }
}

/// Nearest directory at or above `start` that contains `.git`.
pub fn find_git_root(start: &Path) -> Option<PathBuf> {
    let start = start.canonicalize().unwrap_or_else(|_| start.to_path_buf());
    start
        .ancestors()
        .take(MAX_PARENT_DEPTH + 1)
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
}

fn git(repo: &Path, args: &[&str]) -> Result<String, SyncError> {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo)
        .output()
        .map_err(|e| SyncError::Commit(format!("could not run git: {e}")))?;
    if !output.status.success() {
        return Err(SyncError::Commit(format!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
