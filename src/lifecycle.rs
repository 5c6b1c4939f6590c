//! Issue lifecycle: stage passes over a repository and single-issue operations
//!
//! All state changes go through [`transition`], which only ever moves an issue
//! forward and never out of `Complete` or `Failed`.

use anyhow::Result;

use crate::domain::{IssueState, RepositoryState};
use crate::error::AuditError;
use crate::git::{CommitOutcome, commit_issue};
use crate::remediation::{self, FixContext, FixOutcome, Verdict};
use crate::session::AuditSession;
use crate::store::StateStore;

/// Move the issue at `idx` to `next`, stamping and logging the change
pub fn transition(
    store: &StateStore,
    state: &mut RepositoryState,
    idx: usize,
    next: IssueState,
) -> Result<(), AuditError> {
    let issue = &mut state.issues[idx];
    let from = issue.state;
    if !from.can_advance_to(next) {
        return Err(AuditError::InvalidTransition {
            id: issue.id.clone(),
            from,
            to: next,
        });
    }
    issue.state = next;
    issue.touch();
    let message = format!("Issue {}: {} -> {}", issue.id, from, next);
    store.append_log(state, message);
    Ok(())
}

fn find(state: &RepositoryState, id: &str) -> Result<usize, AuditError> {
    state.issue_index(id).ok_or_else(|| AuditError::IssueNotFound {
        id: id.to_string(),
        repo: state.repo_path.clone(),
    })
}

fn indices_in(state: &RepositoryState, wanted: IssueState) -> Vec<usize> {
    state
        .issues
        .iter()
        .enumerate()
        .filter(|(_, issue)| issue.state == wanted)
        .map(|(idx, _)| idx)
        .collect()
}

/// `Submitted -> Triaging` for every new issue
pub fn triage_all(session: &AuditSession, state: &mut RepositoryState) -> Result<usize> {
    let pending = indices_in(state, IssueState::Submitted);
    for &idx in &pending {
        transition(session.store(), state, idx, IssueState::Triaging)?;
    }
    Ok(pending.len())
}

fn plan_at(session: &AuditSession, state: &mut RepositoryState, idx: usize) -> Result<()> {
    let plan = remediation::plan_for(state.issues[idx].classifier.as_ref());
    state.issues[idx].remediation_plan = Some(plan.to_string());
    transition(session.store(), state, idx, IssueState::PlanningRemediation)?;
    Ok(())
}

/// `Triaging -> Planning Remediation`, attaching the plan template
pub fn plan_all(session: &AuditSession, state: &mut RepositoryState) -> Result<usize> {
    let pending = indices_in(state, IssueState::Triaging);
    for &idx in &pending {
        plan_at(session, state, idx)?;
    }
    Ok(pending.len())
}

fn fix_at(session: &AuditSession, state: &mut RepositoryState, idx: usize) -> Result<FixOutcome> {
    let store = session.store();
    if state.issues[idx].state != IssueState::Fixing {
        transition(store, state, idx, IssueState::Fixing)?;
    }

    let ctx = FixContext {
        advisories: &session.config().advisories,
    };
    let outcome = remediation::apply(store, state, &state.issues[idx], &ctx)?;
    let id = state.issues[idx].id.clone();

    match &outcome {
        FixOutcome::Applied { artifact } => {
            state.issues[idx].fix_artifact = Some(artifact.clone());
            state.issues[idx].notes = None;
            let message = format!("Issue {}: fix applied, diff at {}", id, artifact.display());
            store.append_log(state, message);
            transition(store, state, idx, IssueState::Verifying)?;
        }
        FixOutcome::NotApplicable(reason) => {
            tracing::warn!("Fix for issue {} not applied: {}", id, reason);
            state.issues[idx].notes = Some(reason.clone());
            store.append_log(state, format!("Issue {}: fix not applied: {}", id, reason));
            transition(store, state, idx, IssueState::Failed)?;
        }
    }
    Ok(outcome)
}

/// Apply fixes to every planned issue, in priority order
pub fn fix_all(session: &AuditSession, state: &mut RepositoryState) -> Result<usize> {
    let pending = indices_in(state, IssueState::PlanningRemediation);
    let mut applied = 0;
    for &idx in &pending {
        if matches!(fix_at(session, state, idx)?, FixOutcome::Applied { .. }) {
            applied += 1;
        }
    }
    Ok(applied)
}

fn verify_at(session: &AuditSession, state: &mut RepositoryState, idx: usize) -> Result<Verdict> {
    let store = session.store();
    if state.issues[idx].state != IssueState::Verifying {
        transition(store, state, idx, IssueState::Verifying)?;
    }

    let ctx = FixContext {
        advisories: &session.config().advisories,
    };
    let verdict = remediation::verify(&state.issues[idx], &ctx);
    match &verdict {
        Verdict::Passed => {
            transition(store, state, idx, IssueState::Complete)?;
        }
        Verdict::Failed(reason) => {
            let id = state.issues[idx].id.clone();
            tracing::warn!("Verification of issue {} failed: {}", id, reason);
            state.issues[idx].notes = Some(reason.clone());
            store.append_log(state, format!("Issue {}: verification failed: {}", id, reason));
            transition(store, state, idx, IssueState::Failed)?;
        }
    }
    Ok(verdict)
}

/// Commit the issue's file and log the outcome
pub fn commit_at(session: &AuditSession, state: &mut RepositoryState, idx: usize) -> CommitOutcome {
    let outcome = commit_issue(state, &state.issues[idx]);
    if let CommitOutcome::Failed(reason) = &outcome {
        tracing::warn!("Commit for issue {} failed: {}", state.issues[idx].id, reason);
    }
    let message = format!("Issue {}: {}", state.issues[idx].id, outcome);
    session.store().append_log(state, message);
    outcome
}

/// Verify every fixed issue; verified issues are committed right away
pub fn verify_all(session: &AuditSession, state: &mut RepositoryState) -> Result<usize> {
    let pending = indices_in(state, IssueState::Verifying);
    let mut passed = 0;
    for &idx in &pending {
        if verify_at(session, state, idx)?.is_passed() {
            passed += 1;
            commit_at(session, state, idx);
        }
    }
    Ok(passed)
}

/// Fix a single issue. Planning happens first when the issue has not been
/// planned yet; an issue left in `Fixing` is re-applied. Once a fix has been
/// applied the issue waits in `Verifying` and cannot be fixed again.
pub fn fix_issue(session: &AuditSession, state: &mut RepositoryState, id: &str) -> Result<FixOutcome> {
    let idx = find(state, id)?;
    let current = state.issues[idx].state;
    if current.is_terminal() || current.rank() >= IssueState::Verifying.rank() {
        return Err(AuditError::InvalidTransition {
            id: id.to_string(),
            from: current,
            to: IssueState::Fixing,
        }
        .into());
    }
    if current.rank() < IssueState::PlanningRemediation.rank() {
        plan_at(session, state, idx)?;
    }
    fix_at(session, state, idx)
}

/// Verify a single issue from any non-terminal state
pub fn verify_issue(session: &AuditSession, state: &mut RepositoryState, id: &str) -> Result<Verdict> {
    let idx = find(state, id)?;
    let current = state.issues[idx].state;
    if current.is_terminal() {
        return Err(AuditError::InvalidTransition {
            id: id.to_string(),
            from: current,
            to: IssueState::Verifying,
        }
        .into());
    }
    verify_at(session, state, idx)
}

/// Commit a single issue's file regardless of its state
pub fn commit_single(session: &AuditSession, state: &mut RepositoryState, id: &str) -> Result<CommitOutcome> {
    let idx = find(state, id)?;
    if state.issues[idx].state != IssueState::Complete {
        tracing::warn!(
            "Committing issue {} in state {} (not verified)",
            id,
            state.issues[idx].state
        );
    }
    Ok(commit_at(session, state, idx))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::{Classifier, IssueRecord, Severity};
    use tempfile::TempDir;

    fn session(tmp: &TempDir) -> AuditSession {
        AuditSession::new(tmp.path(), Config::without_tools())
    }

    fn state_with_issue(tmp: &TempDir, file: &str, content: &str, classifier: Classifier) -> RepositoryState {
        let repo = tmp.path().join("repo");
        std::fs::create_dir_all(&repo).unwrap();
        std::fs::write(repo.join(file), content).unwrap();
        let mut state = RepositoryState::new(repo.display().to_string());
        state.issues.push(
            IssueRecord::new("001", &state.repo_path, "finding", Severity::High)
                .with_file(repo.join(file))
                .with_classifier(Some(classifier)),
        );
        state
    }

    #[test]
    fn test_transition_only_moves_forward() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        let mut state = RepositoryState::new("/repo");
        state.issues.push(IssueRecord::new("001", "/repo", "x", Severity::Low));

        transition(session.store(), &mut state, 0, IssueState::Fixing).unwrap();
        let err = transition(session.store(), &mut state, 0, IssueState::Triaging).unwrap_err();
        assert!(matches!(err, AuditError::InvalidTransition { from: IssueState::Fixing, .. }));

        transition(session.store(), &mut state, 0, IssueState::Failed).unwrap();
        assert!(transition(session.store(), &mut state, 0, IssueState::Complete).is_err());
        assert!(state.logs.iter().any(|l| l.ends_with("Issue 001: Submitted -> Fixing")));
    }

    #[test]
    fn test_stage_passes_complete_an_xss_issue() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        let mut state = state_with_issue(
            &tmp,
            "view.js",
            "el.innerHTML = `<p>${msg}</p>`;\n",
            Classifier::CrossSiteScripting,
        );

        assert_eq!(triage_all(&session, &mut state).unwrap(), 1);
        assert_eq!(plan_all(&session, &mut state).unwrap(), 1);
        assert_eq!(
            state.issues[0].remediation_plan.as_deref(),
            Some("Escape HTML before injecting; avoid innerHTML; use textContent.")
        );
        assert_eq!(fix_all(&session, &mut state).unwrap(), 1);
        assert!(state.issues[0].fix_artifact.is_some());
        assert_eq!(state.issues[0].state, IssueState::Verifying);
        assert_eq!(verify_all(&session, &mut state).unwrap(), 1);
        assert_eq!(state.issues[0].state, IssueState::Complete);
        assert!(state.logs.iter().any(|l| l.contains("Issue 001: not a git repository, skipped")));
    }

    #[test]
    fn test_applied_fix_waits_in_verifying() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        let mut state = state_with_issue(
            &tmp,
            "requirements.txt",
            "shopify-sdk==1.2.3\n",
            Classifier::MissingAuthorization,
        );

        let outcome = fix_issue(&session, &mut state, "001").unwrap();
        assert!(matches!(outcome, FixOutcome::Applied { .. }));
        assert_eq!(state.issues[0].state, IssueState::Verifying);
        assert!(state.logs.iter().any(|l| l.ends_with("Issue 001: Fixing -> Verifying")));

        let err = fix_issue(&session, &mut state, "001").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::InvalidTransition { from: IssueState::Verifying, .. })
        ));

        assert_eq!(verify_all(&session, &mut state).unwrap(), 1);
        assert_eq!(state.issues[0].state, IssueState::Complete);
    }

    #[test]
    fn test_unfixable_issue_fails_with_notes() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        let mut state = state_with_issue(&tmp, "a.py", "print('hi')\n", Classifier::Other("CWE-78".into()));

        let outcome = fix_issue(&session, &mut state, "001").unwrap();
        assert!(matches!(outcome, FixOutcome::NotApplicable(_)));
        assert_eq!(state.issues[0].state, IssueState::Failed);
        assert_eq!(
            state.issues[0].notes.as_deref(),
            Some("no automated remediation for CWE-78")
        );
        assert_eq!(state.issues[0].remediation_plan.as_deref(), Some(remediation::GENERIC_PLAN));

        let err = fix_issue(&session, &mut state, "001").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::InvalidTransition { .. })
        ));
        assert!(verify_issue(&session, &mut state, "001").is_err());
    }

    #[test]
    fn test_verify_without_fix_fails() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        let mut state = state_with_issue(
            &tmp,
            "requirements.txt",
            "shopify-sdk==1.2.3\n",
            Classifier::MissingAuthorization,
        );

        let verdict = verify_issue(&session, &mut state, "001").unwrap();
        assert_eq!(verdict, Verdict::Failed("shopify-sdk==1.2.3 is still pinned".to_string()));
        assert_eq!(state.issues[0].state, IssueState::Failed);
    }

    #[test]
    fn test_unknown_id() {
        let tmp = TempDir::new().unwrap();
        let session = session(&tmp);
        let mut state = RepositoryState::new("/repo");
        let err = fix_issue(&session, &mut state, "042").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<AuditError>(),
            Some(AuditError::IssueNotFound { .. })
        ));
    }
}
