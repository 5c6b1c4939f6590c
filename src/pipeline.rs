//! Command-level orchestration over a session
//!
//! Each function loads the repository snapshot, runs its stages and saves the
//! snapshot once at the end.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::analyzer;
use crate::context::{self, GatherOutcome};
use crate::detect;
use crate::domain::{IssueRecord, RepositoryState, ScanProfile};
use crate::error::AuditError;
use crate::git::CommitOutcome;
use crate::ingest::{self, IngestSummary};
use crate::lifecycle;
use crate::remediation::{FixOutcome, Verdict};
use crate::session::AuditSession;

/// What a scan did to one repository
#[derive(Debug, Clone)]
pub struct ScanReport {
    pub profile: ScanProfile,
    pub gather: GatherOutcome,
    pub ingest: IngestSummary,
}

/// Gather, detect, analyze, ingest, prioritize, then triage and plan
fn scan_state(
    session: &AuditSession,
    state: &mut RepositoryState,
    profile: Option<ScanProfile>,
) -> Result<ScanReport> {
    let gather = context::gather(session, state);

    let root = state.root();
    let domain = detect::detect_domain(&root);
    let tech = detect::detect_tech_stack(&root);
    let message = format!(
        "Detected domain {} and tech stack [{}]",
        domain,
        tech.iter().map(|t| t.as_str()).collect::<Vec<_>>().join(", ")
    );
    session.store().append_log(state, message);
    ingest::record_context(state, domain, tech);

    let profile = profile.unwrap_or_else(|| ScanProfile::next_after(state.last_profile));
    state.last_profile = Some(profile);

    let findings = analyzer::analyze(session, state, profile);
    let summary = ingest::ingest(state, findings);
    ingest::prioritize(state);
    let message = format!(
        "Scan ({}): {} new issue(s), {} already tracked",
        profile, summary.created, summary.refreshed
    );
    session.store().append_log(state, message);

    lifecycle::triage_all(session, state)?;
    lifecycle::plan_all(session, state)?;

    Ok(ScanReport {
        profile,
        gather,
        ingest: summary,
    })
}

/// Scan one repository without fixing anything
pub fn scan(
    session: &AuditSession,
    repo: &str,
    profile: Option<ScanProfile>,
) -> Result<(RepositoryState, ScanReport)> {
    let repo_path = session.resolve_repo(repo);
    let store = session.store();
    let mut state = store.load(&repo_path)?;
    let report = scan_state(session, &mut state, profile)?;
    store.save(&state)?;
    Ok((state, report))
}

/// Full pipeline over each repository in turn
pub fn run(
    session: &AuditSession,
    repos: &[String],
    profile: Option<ScanProfile>,
) -> Result<Vec<RepositoryState>> {
    if repos.is_empty() {
        return Err(AuditError::NoRepositories.into());
    }

    let store = session.store();
    let mut states = Vec::with_capacity(repos.len());
    for repo in repos {
        let repo_path = session.resolve_repo(repo);
        tracing::info!("Auditing {}", repo_path);
        let mut state = store.load(&repo_path)?;

        let report = scan_state(session, &mut state, profile)?;
        let fixed = lifecycle::fix_all(session, &mut state)?;
        let verified = lifecycle::verify_all(session, &mut state)?;

        let message = format!(
            "Run ({}): {} new, {} fixed, {} verified",
            report.profile, report.ingest.created, fixed, verified
        );
        store.append_log(&mut state, message);
        store
            .save(&state)
            .with_context(|| format!("Failed to save state for {}", repo_path))?;
        states.push(state);
    }
    Ok(states)
}

fn load_existing(session: &AuditSession, repo: &str) -> Result<RepositoryState> {
    let repo_path = session.resolve_repo(repo);
    session.store().load(&repo_path)
}

/// Fix one issue by id
pub fn fix(session: &AuditSession, repo: &str, id: &str) -> Result<FixOutcome> {
    let mut state = load_existing(session, repo)?;
    let outcome = lifecycle::fix_issue(session, &mut state, id)?;
    session.store().save(&state)?;
    Ok(outcome)
}

/// Verify one issue by id; a passing issue is committed
pub fn verify(session: &AuditSession, repo: &str, id: &str) -> Result<Verdict> {
    let mut state = load_existing(session, repo)?;
    let verdict = lifecycle::verify_issue(session, &mut state, id)?;
    if verdict.is_passed() {
        lifecycle::commit_single(session, &mut state, id)?;
    }
    session.store().save(&state)?;
    Ok(verdict)
}

/// Commit one issue's file by id
pub fn commit(session: &AuditSession, repo: &str, id: &str) -> Result<CommitOutcome> {
    let mut state = load_existing(session, repo)?;
    let outcome = lifecycle::commit_single(session, &mut state, id)?;
    session.store().save(&state)?;
    Ok(outcome)
}

/// Read-only view of tracked issues
#[derive(Debug, Clone)]
pub struct StatusReport {
    states: Vec<RepositoryState>,
}

#[derive(Serialize)]
struct RepoIssues<'a> {
    repo: &'a str,
    issues: &'a [IssueRecord],
}

impl StatusReport {
    pub fn new(states: Vec<RepositoryState>) -> Self {
        Self { states }
    }

    pub fn is_empty(&self) -> bool {
        self.states.iter().all(|s| s.issues.is_empty())
    }

    /// Tab-separated table, or `No issues.`
    pub fn render_table(&self) -> String {
        if self.is_empty() {
            return "No issues.".to_string();
        }
        let mut lines = vec![["Issue ID", "Description", "Severity", "State", "File"].join("\t")];
        for state in &self.states {
            for issue in &state.issues {
                let file = state.relative_file(issue);
                lines.push(
                    [
                        issue.id.as_str(),
                        issue.description.as_str(),
                        issue.severity.as_str(),
                        issue.state.as_str(),
                        file.as_str(),
                    ]
                    .join("\t"),
                );
            }
        }
        lines.join("\n")
    }

    /// JSON array of `{repo, issues}` for repositories with at least one issue
    pub fn to_json(&self) -> Result<String> {
        let entries: Vec<RepoIssues<'_>> = self
            .states
            .iter()
            .filter(|s| !s.issues.is_empty())
            .map(|s| RepoIssues {
                repo: &s.repo_path,
                issues: &s.issues,
            })
            .collect();
        serde_json::to_string_pretty(&entries).context("Failed to serialize status")
    }
}

/// Issues of one repository, or of every repository the store knows
pub fn status(session: &AuditSession, repo: Option<&str>) -> Result<StatusReport> {
    let store = session.store();
    let repos = match repo {
        Some(repo) => vec![session.resolve_repo(repo)],
        None => store.known_repos()?,
    };
    let states = repos
        .iter()
        .map(|r| store.load(r))
        .collect::<Result<Vec<_>>>()?;
    Ok(StatusReport::new(states))
}

/// Repository list for `run`: explicit list (flag or REPO_LIST), else config
pub fn repos_from(explicit: Option<&str>, configured: &[String]) -> Result<Vec<String>> {
    let repos: Vec<String> = match explicit {
        Some(list) => list
            .split(',')
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(String::from)
            .collect(),
        None => configured.to_vec(),
    };
    if repos.is_empty() {
        return Err(AuditError::NoRepositories.into());
    }
    Ok(repos)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_repos_from_precedence() {
        let configured = vec!["cfg-repo".to_string()];
        assert_eq!(repos_from(Some("a, b,,c"), &configured).unwrap(), vec!["a", "b", "c"]);
        assert_eq!(repos_from(None, &configured).unwrap(), vec!["cfg-repo"]);

        let err = repos_from(Some(" , "), &[]).unwrap_err();
        assert!(matches!(err.downcast_ref::<AuditError>(), Some(AuditError::NoRepositories)));
    }

    #[test]
    fn test_status_of_unknown_repo_is_empty_and_read_only() {
        let tmp = TempDir::new().unwrap();
        let session = AuditSession::new(tmp.path(), Config::without_tools());
        let report = status(&session, Some("nothing-here")).unwrap();
        assert_eq!(report.render_table(), "No issues.");
        assert_eq!(report.to_json().unwrap(), "[]");
        assert!(!tmp.path().join(".security-auditor").exists());
    }

    #[test]
    fn test_scan_rotates_profiles() {
        let tmp = TempDir::new().unwrap();
        std::fs::create_dir_all(tmp.path().join("repo")).unwrap();
        let session = AuditSession::new(tmp.path(), Config::without_tools());

        let (_, first) = scan(&session, "repo", None).unwrap();
        let (_, second) = scan(&session, "repo", None).unwrap();
        let (state, third) = scan(&session, "repo", Some(ScanProfile::All)).unwrap();
        let (_, fourth) = scan(&session, "repo", None).unwrap();

        assert_eq!(first.profile, ScanProfile::Xss);
        assert_eq!(second.profile, ScanProfile::PromptInjection);
        assert_eq!(third.profile, ScanProfile::All);
        assert_eq!(fourth.profile, ScanProfile::Xss);
        assert_eq!(state.last_profile, Some(ScanProfile::All));
    }
}
