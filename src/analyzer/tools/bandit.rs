//! bandit JSON report

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

use super::{json_start, reported_path};
use crate::domain::{Classifier, Finding, Severity};

#[derive(Debug, Deserialize)]
struct BanditReport {
    results: Vec<BanditResult>,
}

#[derive(Debug, Deserialize)]
struct BanditResult {
    #[serde(default)]
    filename: String,
    #[serde(default)]
    issue_severity: String,
    #[serde(default)]
    issue_text: String,
    #[serde(default)]
    test_name: String,
    #[serde(default)]
    line_number: Option<u32>,
    #[serde(default)]
    issue_cwe: Option<BanditCwe>,
}

#[derive(Debug, Deserialize)]
struct BanditCwe {
    #[serde(default)]
    id: Option<u32>,
}

pub fn parse_bandit(stdout: &str, root: &Path) -> Result<Vec<Finding>> {
    let report: BanditReport =
        serde_json::from_str(json_start(stdout, '{')).context("Failed to parse bandit JSON")?;

    let findings = report
        .results
        .into_iter()
        .filter(|r| !r.filename.is_empty())
        .map(|r| {
            let severity = match r.issue_severity.to_uppercase().as_str() {
                "HIGH" | "UNSAFE" => Severity::High,
                _ => Severity::Medium,
            };
            let classifier = r
                .issue_cwe
                .and_then(|c| c.id)
                .filter(|id| *id > 0)
                .map(Classifier::from_number);
            Finding::new(
                "bandit",
                format!("Bandit: {} - {}", r.test_name, r.issue_text),
                reported_path(root, &r.filename),
                severity,
            )
            .with_line(r.line_number)
            .with_optional_classifier(classifier)
        })
        .collect();

    Ok(findings)
}
