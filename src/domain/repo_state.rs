//! Per-repository snapshot: detected context, issues and audit log

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::{IssueRecord, ScanProfile};

static SLUG_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\\/:\s]+").expect("static regex"));

/// Filesystem-safe storage key for a repository path or URL
pub fn repo_slug(repo_path: &str) -> String {
    SLUG_SEPARATORS
        .replace_all(repo_path, "_")
        .trim_matches('_')
        .to_string()
}

/// Business domain inferred from README-like files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "e-commerce")]
    Commerce,
    #[serde(rename = "AI integration")]
    AiIntegration,
    #[serde(rename = "payments")]
    Payments,
    #[serde(rename = "content/cms")]
    Content,
    #[serde(rename = "unspecified")]
    Unspecified,
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Commerce => "e-commerce",
            Domain::AiIntegration => "AI integration",
            Domain::Payments => "payments",
            Domain::Content => "content/cms",
            Domain::Unspecified => "unspecified",
        }
    }
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language ecosystem recognized from a manifest file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ecosystem {
    JavaScript,
    Python,
    Ruby,
    Go,
    Rust,
    #[serde(rename = "PHP")]
    Php,
    Java,
}

impl Ecosystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Ecosystem::JavaScript => "JavaScript",
            Ecosystem::Python => "Python",
            Ecosystem::Ruby => "Ruby",
            Ecosystem::Go => "Go",
            Ecosystem::Rust => "Rust",
            Ecosystem::Php => "PHP",
            Ecosystem::Java => "Java",
        }
    }
}

impl std::fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine knows about one repository, persisted as a single snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryState {
    /// Local path or remote URL as given by the user
    pub repo_path: String,
    pub slug: String,
    /// Local clone used when `repo_path` is a remote URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_copy: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tech_stack: Option<Vec<Ecosystem>>,
    #[serde(default)]
    pub issues: Vec<IssueRecord>,
    #[serde(default)]
    pub logs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_run_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_profile: Option<ScanProfile>,
}

impl RepositoryState {
    /// Empty state for a repository seen for the first time
    pub fn new(repo_path: impl Into<String>) -> Self {
        let repo_path = repo_path.into();
        let slug = repo_slug(&repo_path);
        Self {
            repo_path,
            slug,
            working_copy: None,
            domain: None,
            tech_stack: None,
            issues: Vec::new(),
            logs: Vec::new(),
            last_run_at: None,
            last_profile: None,
        }
    }

    /// Directory the analyzers and version control operate on
    pub fn root(&self) -> PathBuf {
        self.working_copy
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.repo_path))
    }

    pub fn issue_index(&self, id: &str) -> Option<usize> {
        self.issues.iter().position(|i| i.id == id)
    }

    /// Issue file path relative to the repository root, for display
    pub fn relative_file(&self, issue: &IssueRecord) -> String {
        let root = self.root();
        issue
            .file_path
            .as_deref()
            .map(|p| p.strip_prefix(&root).unwrap_or(p))
            .map(|p: &Path| p.display().to_string())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_replaces_separators_and_trims() {
        assert_eq!(repo_slug("/home/me/my repo"), "home_me_my_repo");
        assert_eq!(repo_slug("C:\\work\\shop\\"), "C_work_shop");
        assert_eq!(
            repo_slug("https://github.com/acme/shop.git"),
            "https_github.com_acme_shop.git"
        );
    }

    #[test]
    fn test_slug_is_deterministic() {
        let a = RepositoryState::new("/srv/app");
        let b = RepositoryState::new("/srv/app");
        assert_eq!(a.slug, b.slug);
    }

    #[test]
    fn test_root_prefers_working_copy() {
        let mut state = RepositoryState::new("git@github.com:acme/shop.git");
        assert_eq!(state.root(), PathBuf::from("git@github.com:acme/shop.git"));
        state.working_copy = Some(PathBuf::from("/cache/shop"));
        assert_eq!(state.root(), PathBuf::from("/cache/shop"));
    }

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let state = RepositoryState::new("/srv/app");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"repoPath\":\"/srv/app\""));
        assert!(json.contains("\"issues\":[]"));
    }
}
