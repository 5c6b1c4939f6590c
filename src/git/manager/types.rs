//! Git types and message helpers

use crate::domain::IssueRecord;

/// Git commit message (subject + optional body).
#[derive(Debug, Clone)]
pub struct CommitMessage {
    pub subject: String,
    pub body: Option<String>,
}

impl CommitMessage {
    pub fn for_issue(issue: &IssueRecord) -> Self {
        let subject = sanitize_commit_subject(&format!("Fix {}: {}", issue.id, issue.description));

        let mut paragraphs = Vec::new();
        if let Some(classifier) = &issue.classifier {
            paragraphs.push(format!("Addresses {} ({} severity).", classifier, issue.severity));
        }
        if let Some(plan) = issue
            .remediation_plan
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            paragraphs.push(plan.to_string());
        }
        paragraphs.push(format!("Security-Auditor-Issue: #{}", issue.id));

        Self {
            subject,
            body: Some(paragraphs.join("\n\n")),
        }
    }
}

fn sanitize_commit_subject(raw: &str) -> String {
    // Keep the subject single-line and reasonably short.
    let first_line = raw.lines().next().unwrap_or("").trim();
    let mut out: String = first_line
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect();
    if out.is_empty() {
        out = "security-auditor: fix".to_string();
    }

    const MAX_LEN: usize = 72;
    if out.chars().count() > MAX_LEN {
        out = out.chars().take(MAX_LEN).collect();
    }

    out
}

/// Result of committing a fix
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Git ran but there was nothing staged for the path
    NothingToCommit,
    /// The repository is not under version control
    Unversioned,
    Failed(String),
}

impl std::fmt::Display for CommitOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommitOutcome::Committed => write!(f, "committed"),
            CommitOutcome::NothingToCommit => write!(f, "nothing to commit"),
            CommitOutcome::Unversioned => write!(f, "not a git repository, skipped"),
            CommitOutcome::Failed(reason) => write!(f, "commit failed: {}", reason),
        }
    }
}
