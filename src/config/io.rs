//! Configuration file lookup

use std::path::{Path, PathBuf};

use anyhow::Result;

use super::Config;

impl Config {
    /// Get the global config directory path (~/.security-auditor/)
    pub fn global_config_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".security-auditor")
    }

    /// Get the global config file path (~/.security-auditor/config.toml)
    pub fn global_config_path() -> PathBuf {
        Self::global_config_dir().join("config.toml")
    }

    /// Candidate config files for a working directory, in lookup order
    pub fn candidate_paths(dir: &Path) -> Vec<PathBuf> {
        vec![
            dir.join(".security-auditor").join("config.toml"),
            dir.join("security-auditor.toml"),
            Self::global_config_path(),
        ]
    }

    /// Load configuration for a working directory.
    ///
    /// An explicit path must exist. Otherwise the first existing candidate wins,
    /// falling back to built-in defaults.
    pub fn load(dir: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        for candidate in Self::candidate_paths(dir) {
            if candidate.is_file() {
                tracing::debug!("Loading config from {}", candidate.display());
                return Self::from_file(&candidate);
            }
        }

        Ok(Self::default())
    }

    /// Absolute store directory for a working directory
    pub fn store_root(&self, work_dir: &Path) -> PathBuf {
        let configured = Path::new(&self.settings.store_dir);
        if configured.is_absolute() {
            configured.to_path_buf()
        } else {
            work_dir.join(configured)
        }
    }
}
