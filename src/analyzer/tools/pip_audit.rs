//! pip-audit JSON report
//!
//! Newer releases wrap results in `{"dependencies": [...]}`; older ones print
//! the list directly.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::json_start;
use crate::domain::{Classifier, Finding, Severity};

/// CWE-1395: dependency on vulnerable third-party component
const VULNERABLE_COMPONENT: &str = "CWE-1395";

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PipAuditReport {
    Wrapped { dependencies: Vec<Dependency> },
    Legacy(Vec<Dependency>),
}

impl PipAuditReport {
    fn into_dependencies(self) -> Vec<Dependency> {
        match self {
            PipAuditReport::Wrapped { dependencies } | PipAuditReport::Legacy(dependencies) => {
                dependencies
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Dependency {
    name: String,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    vulns: Vec<Vulnerability>,
}

#[derive(Debug, Deserialize)]
struct Vulnerability {
    id: String,
    #[serde(default)]
    fix_versions: Vec<String>,
}

pub fn parse_pip_audit(stdout: &str, root: &Path) -> Result<Vec<Finding>> {
    let trimmed = stdout.trim_start();
    let json = if trimmed.starts_with('[') { trimmed } else { json_start(stdout, '{') };
    let report: PipAuditReport =
        serde_json::from_str(json).context("Failed to parse pip-audit JSON")?;

    let manifest = root.join("requirements.txt");
    let mut findings = Vec::new();
    for dep in report.into_dependencies() {
        let pinned = match &dep.version {
            Some(version) => format!("{}=={}", dep.name, version),
            None => dep.name.clone(),
        };
        for vuln in &dep.vulns {
            let fix = match vuln.fix_versions.first() {
                Some(v) => format!("; fixed in {}", v),
                None => String::new(),
            };
            findings.push(
                Finding::new(
                    "pip-audit",
                    format!("pip-audit: {} ({}{})", pinned, vuln.id, fix),
                    manifest.clone(),
                    Severity::High,
                )
                .with_classifier(Classifier::Other(VULNERABLE_COMPONENT.to_string())),
            );
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_format() {
        let out = r#"{"dependencies": [
            {"name": "jinja2", "version": "2.10", "vulns": [
                {"id": "PYSEC-2019-217", "fix_versions": ["2.10.1"], "description": "sandbox escape"}
            ]},
            {"name": "flask", "version": "2.3.2", "vulns": []}
        ], "fixes": []}"#;
        let findings = parse_pip_audit(out, Path::new("/repo")).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(
            findings[0].description,
            "pip-audit: jinja2==2.10 (PYSEC-2019-217; fixed in 2.10.1)"
        );
        assert_eq!(findings[0].file_path, Path::new("/repo/requirements.txt"));
        assert_eq!(findings[0].classifier.as_ref().map(|c| c.as_str()), Some("CWE-1395"));
    }

    #[test]
    fn test_legacy_list_format() {
        let out = r#"[{"name": "requests", "version": "2.19.0", "vulns": [{"id": "GHSA-x84v", "fix_versions": []}]}]"#;
        let findings = parse_pip_audit(out, Path::new("/repo")).unwrap();
        assert_eq!(findings[0].description, "pip-audit: requests==2.19.0 (GHSA-x84v)");
    }

    #[test]
    fn test_unknown_shape() {
        assert!(parse_pip_audit(r#"{"packages": {}}"#, Path::new("/repo")).is_err());
    }
}
