//! Scan profiles

use serde::{Deserialize, Serialize};

/// Named subset of analyzer heuristics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ScanProfile {
    Xss,
    #[serde(alias = "prompt")]
    #[value(alias = "prompt")]
    PromptInjection,
    #[serde(alias = "deps")]
    #[value(alias = "deps")]
    Dependency,
    #[serde(alias = "rce")]
    #[value(alias = "rce")]
    RemoteCodeExecution,
    All,
}

/// Rotation used when no profile is requested
const ROTATION: [ScanProfile; 4] = [
    ScanProfile::Xss,
    ScanProfile::PromptInjection,
    ScanProfile::Dependency,
    ScanProfile::RemoteCodeExecution,
];

impl ScanProfile {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanProfile::Xss => "xss",
            ScanProfile::PromptInjection => "prompt-injection",
            ScanProfile::Dependency => "dependency",
            ScanProfile::RemoteCodeExecution => "remote-code-execution",
            ScanProfile::All => "all",
        }
    }

    /// Returns true if this profile enables the checks of `other`
    pub fn covers(&self, other: ScanProfile) -> bool {
        *self == ScanProfile::All || *self == other
    }

    /// Next profile after `last` in the rotation (`all` restarts it)
    pub fn next_after(last: Option<ScanProfile>) -> ScanProfile {
        match last.and_then(|l| ROTATION.iter().position(|p| *p == l)) {
            Some(idx) => ROTATION[(idx + 1) % ROTATION.len()],
            None => ROTATION[0],
        }
    }
}

impl std::fmt::Display for ScanProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
