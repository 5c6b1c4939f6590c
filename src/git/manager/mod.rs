//! Git manager implementation

mod changes;
mod remote;
mod types;


pub use types::{CommitMessage, CommitOutcome};

use anyhow::{Result, bail};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::domain::{IssueRecord, RepositoryState};

/// Find the git repository root for a given path.
/// Returns None if the path is not inside a git repository.
pub fn find_git_root(path: &Path) -> Option<PathBuf> {
    let start_dir = if path.is_file() { path.parent()? } else { path };

    let output = Command::new("git")
        .args(["rev-parse", "--show-toplevel"])
        .current_dir(start_dir)
        .output()
        .ok()?;

    if !output.status.success() {
        return None;
    }

    let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if root.is_empty() {
        None
    } else {
        Some(PathBuf::from(root))
    }
}

/// Git toplevel for a repository directory: the directory itself when it holds
/// `.git`, otherwise whatever enclosing checkout git reports.
pub fn versioned_root(path: &Path) -> Option<PathBuf> {
    if GitManager::is_repository(path) {
        return Some(path.to_path_buf());
    }
    if !path.is_dir() {
        return None;
    }
    find_git_root(path)
}

/// Runs git commands against one checkout
#[derive(Clone)]
pub struct GitManager {
    /// Root directory of the repository
    root: PathBuf,
}

impl GitManager {
    /// Create a new Git manager
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();

        if !root.join(".git").exists() {
            bail!("Not a git repository: {}", root.display());
        }

        Ok(Self { root })
    }

    /// Returns true if `root` holds a `.git` directory or file
    pub fn is_repository(root: &Path) -> bool {
        root.join(".git").exists()
    }

    /// Get the root path
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Commit the file touched by an issue's fix.
///
/// Never fails the caller: every problem is folded into the outcome.
pub fn commit_issue(state: &RepositoryState, issue: &IssueRecord) -> CommitOutcome {
    let Some(root) = versioned_root(&state.root()) else {
        return CommitOutcome::Unversioned;
    };

    let result = GitManager::new(&root).and_then(|git| {
        git.commit_path(issue.file_path.as_deref(), &CommitMessage::for_issue(issue))
    });

    match result {
        Ok(true) => CommitOutcome::Committed,
        Ok(false) => CommitOutcome::NothingToCommit,
        Err(e) => CommitOutcome::Failed(format!("{:#}", e)),
    }
}
