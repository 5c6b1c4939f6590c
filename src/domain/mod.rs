//! Core domain types: issues, findings, classifiers and repository snapshots

mod classifier;
mod finding;
mod issue;
mod profile;
mod repo_state;

pub use classifier::Classifier;
pub use finding::Finding;
pub use issue::{IssueRecord, IssueState, Severity};
pub use profile::ScanProfile;
pub use repo_state::{Domain, Ecosystem, RepositoryState, repo_slug};
