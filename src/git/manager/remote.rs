//! Clone and pull operations

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::Command;

use super::GitManager;

impl GitManager {
    /// Clone `url` into `dest` and return a manager for the new checkout
    pub fn clone_into(url: &str, dest: &Path) -> Result<Self> {
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create clone directory: {}", parent.display()))?;
        }

        let output = Command::new("git")
            .arg("clone")
            .arg(url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .context("Failed to run git clone")?;

        if !output.status.success() {
            bail!(
                "git clone failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Self::new(dest)
    }

    /// Bring the checkout up to date with `git pull --rebase`
    pub fn pull(&self) -> Result<()> {
        let output = Command::new("git")
            .args(["pull", "--rebase"])
            .env("GIT_TERMINAL_PROMPT", "0")
            .current_dir(self.root())
            .output()
            .context("Failed to run git pull")?;

        if !output.status.success() {
            bail!(
                "git pull failed: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }

        Ok(())
    }
}
