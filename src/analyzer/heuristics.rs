//! Built-in pattern heuristics, one per weakness family

use std::path::Path;

use crate::config::Advisory;
use crate::domain::{Classifier, Finding, Severity};
use crate::patterns::{js, python, ruby, line_at};
use crate::scanner::Scanner;

pub const PROMPT_INJECTION_DESCRIPTION: &str =
    "Prompt Injection risk: user input concatenated into AI prompt";
pub const XSS_DESCRIPTION: &str = "Potential Reflected XSS: innerHTML used with unsanitized input";
pub const COMMAND_INJECTION_DESCRIPTION: &str =
    "Potential command injection: system/backtick execution with unvalidated params";

const PROMPT_INJECTION_SCORE: &str = "CVSS:3.1/AV:N/AC:L/PR:L/UI:N/S:U/C:H/I:L/A:N";
const XSS_SCORE: &str = "CVSS:3.1/AV:N/AC:L/PR:L/UI:R/S:C/C:L/I:L/A:N";
const DEPENDENCY_SCORE: &str = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:N/A:N";
const COMMAND_INJECTION_SCORE: &str = "CVSS:3.1/AV:N/AC:L/PR:N/UI:N/S:U/C:H/I:H/A:H";

pub const SCRIPT_EXTENSIONS: &[&str] = &["js", "jsx", "ts", "tsx"];

fn read_source(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => Some(content),
        Err(e) => {
            tracing::debug!("Skipping unreadable file {}: {}", path.display(), e);
            None
        }
    }
}

/// Python modules that call an LLM client with a prompt built from raw `user_input`
pub fn prompt_injection(scanner: &Scanner) -> Vec<Finding> {
    let mut findings = Vec::new();
    for path in scanner.files_with_extensions(&["py"]) {
        let Some(content) = read_source(&path) else {
            continue;
        };
        if !python::mentions_llm_client(&content) {
            continue;
        }
        let lines: Vec<&str> = content.lines().collect();
        if let Some(idx) = python::first_prompt_line(&lines) {
            findings.push(
                Finding::new("prompt-heuristic", PROMPT_INJECTION_DESCRIPTION, path, Severity::High)
                    .with_line(Some(idx as u32 + 1))
                    .with_classifier(Classifier::PromptInjection)
                    .with_score(PROMPT_INJECTION_SCORE),
            );
        }
    }
    findings
}

/// Script files assigning templated or concatenated markup to innerHTML/outerHTML
pub fn xss(scanner: &Scanner) -> Vec<Finding> {
    let mut findings = Vec::new();
    for path in scanner.files_with_extensions(SCRIPT_EXTENSIONS) {
        let Some(content) = read_source(&path) else {
            continue;
        };
        if let Some(sink) = js::first_unsafe_sink(&content) {
            findings.push(
                Finding::new("xss-heuristic", XSS_DESCRIPTION, path, Severity::Medium)
                    .with_line(Some(sink.line))
                    .with_classifier(Classifier::CrossSiteScripting)
                    .with_score(XSS_SCORE),
            );
        }
    }
    findings
}

/// Root manifests containing a known-vulnerable pin, one finding per advisory
pub fn dependency(root: &Path, advisories: &[Advisory]) -> Vec<Finding> {
    let mut findings = Vec::new();
    for advisory in advisories {
        let manifest = root.join(&advisory.manifest);
        if !manifest.is_file() {
            continue;
        }
        let Some(content) = read_source(&manifest) else {
            continue;
        };
        if let Some(offset) = content.find(&advisory.vulnerable) {
            findings.push(
                Finding::new(
                    "dependency-heuristic",
                    advisory.finding_description(),
                    manifest,
                    Severity::High,
                )
                .with_line(Some(line_at(&content, offset)))
                .with_classifier(Classifier::MissingAuthorization)
                .with_score(DEPENDENCY_SCORE),
            );
        }
    }
    findings
}

/// Ruby files executing shell commands
pub fn command_injection(scanner: &Scanner) -> Vec<Finding> {
    let mut findings = Vec::new();
    for path in scanner.files_with_extensions(&["rb"]) {
        let Some(content) = read_source(&path) else {
            continue;
        };
        if let Some(site) = ruby::first_exec_site(&content) {
            findings.push(
                Finding::new("rce-heuristic", COMMAND_INJECTION_DESCRIPTION, path, Severity::Critical)
                    .with_line(Some(line_at(&content, site.offset)))
                    .with_classifier(Classifier::CodeInjection)
                    .with_score(COMMAND_INJECTION_SCORE),
            );
        }
    }
    findings
}
