//! brakeman JSON report; only command/code execution warnings are kept

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::{json_start, reported_path};
use crate::domain::{Classifier, Finding, Severity};

const EXECUTION_WARNINGS: &[&str] = &["Command Injection", "Dangerous Eval", "Remote Code Execution"];

#[derive(Debug, Deserialize)]
struct BrakemanReport {
    warnings: Vec<BrakemanWarning>,
}

#[derive(Debug, Deserialize)]
struct BrakemanWarning {
    #[serde(default)]
    warning_type: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    file: String,
    #[serde(default)]
    line: Option<u32>,
    #[serde(default)]
    confidence: String,
}

pub fn parse_brakeman(stdout: &str, root: &Path) -> Result<Vec<Finding>> {
    let report: BrakemanReport =
        serde_json::from_str(json_start(stdout, '{')).context("Failed to parse brakeman JSON")?;

    let findings = report
        .warnings
        .into_iter()
        .filter(|w| EXECUTION_WARNINGS.contains(&w.warning_type.as_str()) && !w.file.is_empty())
        .map(|w| {
            let severity = if w.confidence.eq_ignore_ascii_case("high") {
                Severity::Critical
            } else {
                Severity::High
            };
            Finding::new(
                "brakeman",
                format!("Brakeman: {} - {}", w.warning_type, w.message),
                reported_path(root, &w.file),
                severity,
            )
            .with_line(w.line)
            .with_classifier(Classifier::CodeInjection)
        })
        .collect();

    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filters_execution_warnings() {
        let out = r#"{
          "scan_info": {"app_path": "/repo"},
          "warnings": [
            {"warning_type": "Command Injection", "message": "Possible command injection",
             "file": "app/jobs/sync.rb", "line": 7, "confidence": "High", "cwe_id": [77]},
            {"warning_type": "Mass Assignment", "message": "Unprotected mass assignment",
             "file": "app/models/user.rb", "line": 3, "confidence": "Weak"},
            {"warning_type": "Dangerous Eval", "message": "User input in eval",
             "file": "lib/calc.rb", "line": 12, "confidence": "Medium"}
          ],
          "errors": []
        }"#;
        let findings = parse_brakeman(out, Path::new("/repo")).unwrap();
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].description, "Brakeman: Command Injection - Possible command injection");
        assert_eq!(findings[0].file_path, Path::new("/repo/app/jobs/sync.rb"));
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[1].severity, Severity::High);
        assert_eq!(findings[1].classifier, Some(Classifier::CodeInjection));
    }

    #[test]
    fn test_missing_warnings_key_is_an_error() {
        assert!(parse_brakeman(r#"{"scan_info": {}}"#, Path::new("/repo")).is_err());
    }
}
