//! Turn findings into tracked issues and keep them in priority order

use crate::domain::{Domain, Ecosystem, Finding, IssueRecord, RepositoryState};

/// Counts from one ingestion pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub created: usize,
    pub refreshed: usize,
}

/// Record detection results on the repository
pub fn record_context(state: &mut RepositoryState, domain: Domain, tech: Vec<Ecosystem>) {
    state.domain = Some(domain);
    state.tech_stack = Some(tech);
}

fn next_number(state: &RepositoryState) -> u32 {
    state
        .issues
        .iter()
        .filter_map(|i| i.number())
        .max()
        .unwrap_or(0)
        + 1
}

/// Merge findings into the repository's issues.
///
/// A finding matching an existing issue by `(file, description)` only refreshes
/// its timestamp; anything else becomes a new `Submitted` issue.
pub fn ingest(state: &mut RepositoryState, findings: Vec<Finding>) -> IngestSummary {
    let mut summary = IngestSummary::default();
    for finding in findings {
        let existing = state.issues.iter_mut().find(|i| {
            i.description == finding.description
                && i.file_path.as_deref() == Some(finding.file_path.as_path())
        });
        if let Some(issue) = existing {
            issue.touch();
            summary.refreshed += 1;
            continue;
        }

        let id = IssueRecord::format_id(next_number(state));
        tracing::debug!("New issue {} from {}: {}", id, finding.source, finding.description);
        let issue = IssueRecord::new(id, state.repo_path.clone(), finding.description, finding.severity)
            .with_file(finding.file_path)
            .with_line(finding.line)
            .with_classifier(finding.classifier)
            .with_score(finding.score)
            .with_context(state.domain, state.tech_stack.clone());
        state.issues.push(issue);
        summary.created += 1;
    }
    summary
}

/// Sort by severity (Critical first), ties by ascending numeric id
pub fn prioritize(state: &mut RepositoryState) {
    state.issues.sort_by(|a, b| {
        b.severity
            .rank()
            .cmp(&a.severity.rank())
            .then_with(|| a.number().unwrap_or(u32::MAX).cmp(&b.number().unwrap_or(u32::MAX)))
            .then_with(|| a.id.cmp(&b.id))
    });
}
