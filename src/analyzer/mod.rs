//! Pattern analysis: built-in heuristics plus optional external tools
//!
//! Heuristic and tool findings are concatenated as-is; ingestion deduplicates
//! against existing issues by `(file, description)`.

pub mod heuristics;
pub mod tools;

pub use tools::{Tool, ToolOutcome};

use crate::config::Advisory;
use crate::domain::{Finding, RepositoryState, ScanProfile};
use crate::scanner::Scanner;
use crate::session::AuditSession;

/// Run the heuristics enabled by `profile`
pub fn run_heuristics(profile: ScanProfile, scanner: &Scanner, advisories: &[Advisory]) -> Vec<Finding> {
    let mut findings = Vec::new();
    if profile.covers(ScanProfile::PromptInjection) {
        findings.extend(heuristics::prompt_injection(scanner));
    }
    if profile.covers(ScanProfile::Xss) {
        findings.extend(heuristics::xss(scanner));
    }
    if profile.covers(ScanProfile::Dependency) {
        findings.extend(heuristics::dependency(scanner.root(), advisories));
    }
    if profile.covers(ScanProfile::RemoteCodeExecution) {
        findings.extend(heuristics::command_injection(scanner));
    }
    findings
}

/// Analyze a repository's working tree. Tool outcomes go to the repository log.
pub fn analyze(session: &AuditSession, state: &mut RepositoryState, profile: ScanProfile) -> Vec<Finding> {
    let config = session.config();
    let store = session.store();
    let root = state.root();

    let store_dir_name = store
        .root()
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    let scanner =
        Scanner::with_excludes(root.clone(), &config.settings.scan_exclude).skipping_dir(store_dir_name);

    let mut findings = run_heuristics(profile, &scanner, &config.advisories);
    let heuristic_count = findings.len();

    let tech = state.tech_stack.clone().unwrap_or_default();
    for tool in tools::select(profile, &tech, &config.tools, &root) {
        let outcome = tool.run(&root);
        if let ToolOutcome::Failed(reason) = &outcome {
            tracing::warn!("{} failed on {}: {}", tool.name(), root.display(), reason);
        }
        store.append_log(state, format!("Tool {}: {}", tool.name(), outcome.summary()));
        findings.extend(outcome.into_findings());
    }

    let message = format!(
        "Analysis ({}): {} heuristic finding(s), {} from tools",
        profile,
        heuristic_count,
        findings.len() - heuristic_count
    );
    store.append_log(state, message);
    findings
}
