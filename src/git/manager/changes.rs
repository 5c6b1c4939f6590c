//! Staging and commit operations for GitManager

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

use super::GitManager;
use super::types::CommitMessage;

impl GitManager {
    /// Stage `path` (relative to the root, or the whole tree when `None`) and commit it.
    ///
    /// Returns `true` if a commit was created.
    pub fn commit_path(&self, path: Option<&Path>, commit_message: &CommitMessage) -> Result<bool> {
        let pathspec = path
            .map(|p| p.strip_prefix(self.root()).unwrap_or(p).to_path_buf())
            .filter(|p| !p.as_os_str().is_empty());

        let mut add_cmd = Command::new("git");
        add_cmd.arg("add");
        match &pathspec {
            Some(p) => add_cmd.arg("--").arg(p),
            None => add_cmd.arg("-A"),
        };

        let add_output = add_cmd
            .current_dir(self.root())
            .output()
            .context("Failed to stage changes")?;

        if !add_output.status.success() {
            bail!(
                "git add failed: {}",
                String::from_utf8_lossy(&add_output.stderr).trim()
            );
        }

        let mut commit_cmd = Command::new("git");
        commit_cmd
            .arg("commit")
            .arg("-m")
            .arg(&commit_message.subject);
        if let Some(body) = commit_message
            .body
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            commit_cmd.arg("-m").arg(body);
        }
        if let Some(p) = &pathspec {
            commit_cmd.arg("--").arg(p);
        }

        // Message matching below needs untranslated git output.
        let commit_output = commit_cmd
            .env("LC_ALL", "C")
            .current_dir(self.root())
            .output()
            .context("Failed to commit changes")?;

        if commit_output.status.success() {
            return Ok(true);
        }

        let stdout = String::from_utf8_lossy(&commit_output.stdout);
        let stderr = String::from_utf8_lossy(&commit_output.stderr);
        let nothing_staged = ["nothing to commit", "nothing added to commit", "no changes added to commit"]
            .iter()
            .any(|needle| stdout.contains(needle) || stderr.contains(needle));
        if nothing_staged {
            tracing::debug!("git commit reported nothing to commit: {}", stdout.trim());
            return Ok(false);
        }

        bail!("git commit failed: {}", stderr.trim());
    }
}
