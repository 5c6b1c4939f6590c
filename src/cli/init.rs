//! Init command implementation

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Default configuration content for `security-auditor init`
pub const DEFAULT_CONFIG: &str = r#"# security-auditor configuration
#
# Lookup order: --config <file>, .security-auditor/config.toml,
# security-auditor.toml, ~/.security-auditor/config.toml.

[settings]
# Snapshots, logs, fix diffs and clones of remote repositories.
# Relative paths resolve against the working directory.
store_dir = ".security-auditor"

# Extra glob patterns (relative to the repository root) to skip while scanning.
# node_modules, .git and the store directory are always skipped.
scan_exclude = []

# Repositories for `run` when neither --repos nor REPO_LIST is set.
repos = []

[tools]
# External analyzers (bandit, eslint, brakeman, pip-audit) run when installed
# and the repository uses their ecosystem.
enabled = true
disabled = []

# Known-vulnerable pins checked by the dependency profile.
[[advisories]]
manifest = "requirements.txt"
vulnerable = "shopify-sdk==1.2.3"
fixed = "shopify-sdk==2.0.1"
description = "Outdated dependency missing auth checks"
"#;

/// Write the default configuration, refusing to overwrite without `force`
pub fn init_command(work_dir: &Path, config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = config_path.unwrap_or_else(|| work_dir.join("security-auditor.toml"));

    if config_path.exists() && !force {
        bail!(
            "Configuration already exists: {}\nUse --force to overwrite.",
            config_path.display()
        );
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("Created: {}", config_path.display());

    Ok(())
}
