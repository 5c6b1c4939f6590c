//! Domain-level errors callers may want to match on
//!
//! I/O and parsing failures travel as `anyhow::Error` with context attached;
//! these variants cover usage mistakes and lifecycle rule violations.

use crate::domain::IssueState;

#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Issue {id} not found in {repo}")]
    IssueNotFound { id: String, repo: String },

    #[error("No repositories specified. Use --repos, REPO_LIST or settings.repos.")]
    NoRepositories,

    #[error("Issue {id} cannot move from {from} to {to}")]
    InvalidTransition {
        id: String,
        from: IssueState,
        to: IssueState,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}
