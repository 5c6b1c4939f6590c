//! Settings configuration types

use serde::{Deserialize, Serialize};

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Directory holding per-repository snapshots, logs and fix artifacts.
    /// Relative paths resolve against the working directory.
    #[serde(default = "default_store_dir")]
    pub store_dir: String,

    /// Additional glob patterns to exclude from scanning
    #[serde(default)]
    pub scan_exclude: Vec<String>,

    /// Repositories processed by `run` when neither --repos nor REPO_LIST is given
    #[serde(default)]
    pub repos: Vec<String>,
}

fn default_store_dir() -> String {
    ".security-auditor".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_dir: default_store_dir(),
            scan_exclude: Vec::new(),
            repos: Vec::new(),
        }
    }
}

/// External static-analysis tool settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Master switch for all external analyzers
    #[serde(default = "default_tools_enabled")]
    pub enabled: bool,

    /// Tool names to skip even when installed (e.g. "eslint")
    #[serde(default)]
    pub disabled: Vec<String>,
}

fn default_tools_enabled() -> bool {
    true
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            enabled: default_tools_enabled(),
            disabled: Vec::new(),
        }
    }
}

impl ToolSettings {
    pub fn allows(&self, tool: &str) -> bool {
        self.enabled && !self.disabled.iter().any(|d| d.eq_ignore_ascii_case(tool))
    }
}

/// A known-vulnerable dependency pin and its fixed replacement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Advisory {
    /// Manifest file name relative to the repository root
    #[serde(default = "default_manifest")]
    pub manifest: String,
    /// Exact pinned text that triggers the finding
    pub vulnerable: String,
    /// Replacement text applied by the fix
    pub fixed: String,
    #[serde(default = "default_advisory_description")]
    pub description: String,
}

fn default_manifest() -> String {
    "requirements.txt".to_string()
}

fn default_advisory_description() -> String {
    "Outdated dependency missing auth checks".to_string()
}

impl Advisory {
    /// Issue description; the vulnerable pin is part of it so distinct advisories
    /// on the same manifest stay distinct issues
    pub fn finding_description(&self) -> String {
        format!("{} ({})", self.description, self.vulnerable)
    }
}

pub fn default_advisories() -> Vec<Advisory> {
    vec![Advisory {
        manifest: default_manifest(),
        vulnerable: "shopify-sdk==1.2.3".to_string(),
        fixed: "shopify-sdk==2.0.1".to_string(),
        description: default_advisory_description(),
    }]
}
