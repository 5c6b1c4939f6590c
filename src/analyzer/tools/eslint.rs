//! eslint JSON formatter output; only innerHTML-related messages are kept

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::{json_start, reported_path};
use crate::domain::{Classifier, Finding, Severity};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintFile {
    file_path: String,
    #[serde(default)]
    messages: Vec<EslintMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EslintMessage {
    #[serde(default)]
    rule_id: Option<String>,
    #[serde(default)]
    message: String,
    #[serde(default)]
    line: Option<u32>,
}

impl EslintMessage {
    fn mentions_inner_html(&self) -> bool {
        let rule = self.rule_id.as_deref().unwrap_or("").to_lowercase();
        rule.contains("innerhtml") || self.message.to_lowercase().contains("innerhtml")
    }
}

pub fn parse_eslint(stdout: &str, root: &Path) -> Result<Vec<Finding>> {
    let files: Vec<EslintFile> =
        serde_json::from_str(json_start(stdout, '[')).context("Failed to parse eslint JSON")?;

    let mut findings = Vec::new();
    for file in files {
        for message in file.messages.iter().filter(|m| m.mentions_inner_html()) {
            findings.push(
                Finding::new(
                    "eslint",
                    format!("ESLint: {}", message.message),
                    reported_path(root, &file.file_path),
                    Severity::Medium,
                )
                .with_line(message.line)
                .with_classifier(Classifier::CrossSiteScripting),
            );
        }
    }
    Ok(findings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keeps_only_inner_html_messages() {
        let out = r#"[
          {"filePath": "/repo/src/view.js", "messages": [
            {"ruleId": "no-unsanitized/property", "message": "Unsafe assignment to innerHTML", "line": 12, "severity": 2},
            {"ruleId": "no-unused-vars", "message": "'x' is defined but never used", "line": 3, "severity": 1}
          ], "errorCount": 1},
          {"filePath": "/repo/src/clean.js", "messages": []}
        ]"#;
        let findings = parse_eslint(out, Path::new("/repo")).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].description, "ESLint: Unsafe assignment to innerHTML");
        assert_eq!(findings[0].file_path, Path::new("/repo/src/view.js"));
        assert_eq!(findings[0].line, Some(12));
        assert_eq!(findings[0].classifier, Some(Classifier::CrossSiteScripting));
    }

    #[test]
    fn test_rule_id_match_and_null_rule() {
        let out = r#"[{"filePath": "a.js", "messages": [
            {"ruleId": "no-unsafe-innerhtml/no-unsafe-innerhtml", "message": "Unsafe assignment", "line": 1},
            {"ruleId": null, "message": "Parsing error: Unexpected token", "line": 2}
        ]}]"#;
        let findings = parse_eslint(out, Path::new("/repo")).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].file_path, Path::new("/repo/a.js"));
    }

    #[test]
    fn test_object_output_is_rejected() {
        assert!(parse_eslint(r#"{"results": []}"#, Path::new("/repo")).is_err());
    }
}
