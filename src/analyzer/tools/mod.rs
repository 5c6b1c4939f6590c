//! External static-analysis tools
//!
//! Each tool has its own tolerant JSON schema. A run ends in a [`ToolOutcome`]
//! so an absent tool is never confused with a clean report.

mod bandit;
mod brakeman;
mod eslint;
mod pip_audit;

pub use bandit::parse_bandit;
pub use brakeman::parse_brakeman;
pub use eslint::parse_eslint;
pub use pip_audit::parse_pip_audit;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Result;

use crate::config::ToolSettings;
use crate::domain::{Ecosystem, Finding, ScanProfile};

/// Result of invoking one external tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolOutcome {
    /// Executable not installed
    Absent,
    /// Started but produced no usable report
    Failed(String),
    /// Produced output that does not match the expected schema
    Unrecognized,
    /// Parsed report; may be empty
    Findings(Vec<Finding>),
}

impl ToolOutcome {
    pub fn summary(&self) -> String {
        match self {
            ToolOutcome::Absent => "not installed".to_string(),
            ToolOutcome::Failed(reason) => format!("failed: {}", reason),
            ToolOutcome::Unrecognized => "output not recognized".to_string(),
            ToolOutcome::Findings(findings) => format!("{} finding(s)", findings.len()),
        }
    }

    pub fn into_findings(self) -> Vec<Finding> {
        match self {
            ToolOutcome::Findings(findings) => findings,
            _ => Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tool {
    Bandit,
    Eslint,
    Brakeman,
    PipAudit,
}

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Bandit, Tool::Eslint, Tool::Brakeman, Tool::PipAudit];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::Bandit => "bandit",
            Tool::Eslint => "eslint",
            Tool::Brakeman => "brakeman",
            Tool::PipAudit => "pip-audit",
        }
    }

    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            Tool::Bandit | Tool::PipAudit => Ecosystem::Python,
            Tool::Eslint => Ecosystem::JavaScript,
            Tool::Brakeman => Ecosystem::Ruby,
        }
    }

    pub fn profile(&self) -> ScanProfile {
        match self {
            Tool::Bandit => ScanProfile::PromptInjection,
            Tool::Eslint => ScanProfile::Xss,
            Tool::Brakeman => ScanProfile::RemoteCodeExecution,
            Tool::PipAudit => ScanProfile::Dependency,
        }
    }

    fn args(&self) -> &'static [&'static str] {
        match self {
            Tool::Bandit => &["-r", ".", "-f", "json"],
            Tool::Eslint => &[".", "-f", "json"],
            Tool::Brakeman => &["-q", "-f", "json"],
            Tool::PipAudit => &["-r", "requirements.txt", "-f", "json"],
        }
    }

    /// Extra precondition on the tree beyond the detected ecosystem
    fn applies_to(&self, root: &Path) -> bool {
        match self {
            Tool::PipAudit => root.join("requirements.txt").is_file(),
            _ => true,
        }
    }

    pub fn parse(&self, stdout: &str, root: &Path) -> Result<Vec<Finding>> {
        match self {
            Tool::Bandit => parse_bandit(stdout, root),
            Tool::Eslint => parse_eslint(stdout, root),
            Tool::Brakeman => parse_brakeman(stdout, root),
            Tool::PipAudit => parse_pip_audit(stdout, root),
        }
    }

    /// Run the tool in `root`. Non-zero exit is fine as long as stdout parses,
    /// since these tools exit 1 when they report issues.
    pub fn run(&self, root: &Path) -> ToolOutcome {
        let output = match Command::new(self.name())
            .args(self.args())
            .current_dir(root)
            .output()
        {
            Ok(output) => output,
            Err(e) if e.kind() == ErrorKind::NotFound => return ToolOutcome::Absent,
            Err(e) => return ToolOutcome::Failed(format!("could not start: {}", e)),
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(
            "{} exited with {} ({} bytes stdout, {} bytes stderr)",
            self.name(),
            output.status,
            stdout.len(),
            stderr.len()
        );

        if stdout.trim().is_empty() {
            return if output.status.success() {
                ToolOutcome::Findings(Vec::new())
            } else {
                ToolOutcome::Failed(failure_reason(&stderr, &output.status))
            };
        }

        match self.parse(&stdout, root) {
            Ok(findings) => ToolOutcome::Findings(findings),
            Err(e) if output.status.success() => {
                tracing::debug!("{} output not recognized: {:#}", self.name(), e);
                ToolOutcome::Unrecognized
            }
            Err(_) => ToolOutcome::Failed(failure_reason(&stderr, &output.status)),
        }
    }
}

fn failure_reason(stderr: &str, status: &std::process::ExitStatus) -> String {
    let first = stderr.lines().map(str::trim).find(|l| !l.is_empty());
    match first {
        Some(line) => line.to_string(),
        None => format!("exited with {}", status),
    }
}

/// Tools worth running for this profile and tree
pub fn select(
    profile: ScanProfile,
    tech: &[Ecosystem],
    settings: &ToolSettings,
    root: &Path,
) -> Vec<Tool> {
    Tool::ALL
        .into_iter()
        .filter(|tool| profile.covers(tool.profile()))
        .filter(|tool| tech.contains(&tool.ecosystem()))
        .filter(|tool| settings.allows(tool.name()))
        .filter(|tool| tool.applies_to(root))
        .collect()
}

/// Resolve a path reported by a tool against the tree it ran in
pub(crate) fn reported_path(root: &Path, reported: &str) -> PathBuf {
    let path = Path::new(reported);
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let relative = reported.strip_prefix("./").unwrap_or(reported);
    root.join(relative)
}

/// Skip any banner text a tool prints before its JSON document
pub(crate) fn json_start(stdout: &str, open: char) -> &str {
    stdout.find(open).map_or(stdout, |idx| &stdout[idx..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_profile_ecosystem_and_config() {
        let tmp = tempfile::TempDir::new().unwrap();
        let settings = ToolSettings::default();
        let tech = [Ecosystem::Python, Ecosystem::JavaScript];

        assert_eq!(
            select(ScanProfile::Xss, &tech, &settings, tmp.path()),
            vec![Tool::Eslint]
        );
        // pip-audit needs a requirements file
        assert_eq!(
            select(ScanProfile::All, &tech, &settings, tmp.path()),
            vec![Tool::Bandit, Tool::Eslint]
        );
        std::fs::write(tmp.path().join("requirements.txt"), "flask\n").unwrap();
        assert_eq!(
            select(ScanProfile::Dependency, &tech, &settings, tmp.path()),
            vec![Tool::PipAudit]
        );

        let settings = ToolSettings {
            enabled: true,
            disabled: vec!["ESLint".to_string()],
        };
        assert!(select(ScanProfile::Xss, &tech, &settings, tmp.path()).is_empty());

        let settings = ToolSettings {
            enabled: false,
            disabled: Vec::new(),
        };
        assert!(select(ScanProfile::All, &tech, &settings, tmp.path()).is_empty());
    }

    #[test]
    fn test_reported_path() {
        let root = Path::new("/repo");
        assert_eq!(reported_path(root, "./app.py"), PathBuf::from("/repo/app.py"));
        assert_eq!(reported_path(root, "lib/x.rb"), PathBuf::from("/repo/lib/x.rb"));
        assert_eq!(reported_path(root, "/abs/y.js"), PathBuf::from("/abs/y.js"));
    }

    #[test]
    fn test_outcome_distinguishes_absent_from_empty() {
        assert_ne!(ToolOutcome::Absent, ToolOutcome::Findings(Vec::new()));
        assert_eq!(ToolOutcome::Findings(Vec::new()).summary(), "0 finding(s)");
        assert!(ToolOutcome::Unrecognized.into_findings().is_empty());
    }
}
