//! Configuration loading and management

mod io;
mod settings;

pub use settings::{Advisory, Settings, ToolSettings, default_advisories};

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::AuditError;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// General settings
    #[serde(default)]
    pub settings: Settings,

    /// External analyzer settings
    #[serde(default)]
    pub tools: ToolSettings,

    /// Known-vulnerable dependency pins checked by the dependency profile
    #[serde(default = "default_advisories")]
    pub advisories: Vec<Advisory>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            settings: Settings::default(),
            tools: ToolSettings::default(),
            advisories: default_advisories(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml_str(&content).map_err(|source| {
            anyhow::Error::new(AuditError::ConfigParse {
                path: path.display().to_string(),
                source,
            })
        })
    }

    pub fn from_toml_str(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Configuration with every external analyzer switched off
    pub fn without_tools() -> Self {
        let mut config = Self::default();
        config.tools.enabled = false;
        config
    }
}
