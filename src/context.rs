//! Context gathering: make sure a reasonably fresh local copy exists

use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::domain::RepositoryState;
use crate::git::{GitManager, versioned_root};
use crate::session::{AuditSession, is_remote};

/// What happened while refreshing a repository's local copy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatherOutcome {
    Cloned(PathBuf),
    Pulled,
    /// Local directory without version control; used as is
    Unversioned,
    /// Git failed; scanning continues against whatever copy exists
    Failed(String),
}

impl std::fmt::Display for GatherOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GatherOutcome::Cloned(path) => write!(f, "cloned into {}", path.display()),
            GatherOutcome::Pulled => write!(f, "pulled latest changes"),
            GatherOutcome::Unversioned => write!(f, "not under version control, using as is"),
            GatherOutcome::Failed(reason) => write!(f, "refresh failed: {}", reason),
        }
    }
}

/// Local cache directory for a remote URL: `<clones>/<last path segment without .git>`
pub fn clone_dir_for(clones_dir: &Path, url: &str) -> PathBuf {
    let trimmed = url.trim_end_matches('/');
    let last = trimmed
        .rsplit(['/', ':'])
        .next()
        .unwrap_or(trimmed);
    let name = last.strip_suffix(".git").unwrap_or(last);
    let name = if name.is_empty() { "repo" } else { name };
    clones_dir.join(name)
}

/// Refresh the local copy of a repository and record the outcome in its log.
pub fn gather(session: &AuditSession, state: &mut RepositoryState) -> GatherOutcome {
    let store = session.store();
    let message = format!("Gathering context for {}", state.repo_path);
    store.append_log(state, message);

    let outcome = if is_remote(&state.repo_path) {
        let dest = clone_dir_for(&store.clones_dir(), &state.repo_path);
        let outcome = if GitManager::is_repository(&dest) {
            pull(&dest)
        } else {
            match GitManager::clone_into(&state.repo_path, &dest) {
                Ok(_) => GatherOutcome::Cloned(dest.clone()),
                Err(e) => GatherOutcome::Failed(format!("{:#}", e)),
            }
        };
        if dest.exists() {
            state.working_copy = Some(dest);
        }
        outcome
    } else {
        match versioned_root(Path::new(&state.repo_path)) {
            Some(root) => pull(&root),
            None => GatherOutcome::Unversioned,
        }
    };

    if let GatherOutcome::Failed(reason) = &outcome {
        tracing::warn!("Context gathering for {} failed: {}", state.repo_path, reason);
    }
    store.append_log(state, format!("Context: {}", outcome));
    state.last_run_at = Some(Utc::now());
    outcome
}

fn pull(root: &Path) -> GatherOutcome {
    match GitManager::new(root).and_then(|git| git.pull()) {
        Ok(()) => GatherOutcome::Pulled,
        Err(e) => GatherOutcome::Failed(format!("{:#}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use tempfile::TempDir;

    #[test]
    fn test_clone_dir_for_urls() {
        let clones = Path::new("/store/repos");
        assert_eq!(
            clone_dir_for(clones, "https://github.com/acme/shop.git"),
            PathBuf::from("/store/repos/shop")
        );
        assert_eq!(
            clone_dir_for(clones, "git@github.com:acme/api.git"),
            PathBuf::from("/store/repos/api")
        );
        assert_eq!(
            clone_dir_for(clones, "https://example.com/team/tool/"),
            PathBuf::from("/store/repos/tool")
        );
    }

    #[test]
    fn test_gather_unversioned_is_a_no_op() {
        let tmp = TempDir::new().unwrap();
        let repo = tmp.path().join("plain");
        std::fs::create_dir_all(&repo).unwrap();
        let session = AuditSession::new(tmp.path(), Config::without_tools());
        let mut state = RepositoryState::new(repo.display().to_string());

        let outcome = gather(&session, &mut state);
        assert_eq!(outcome, GatherOutcome::Unversioned);
        assert!(state.last_run_at.is_some());
        assert!(state.working_copy.is_none());
        assert_eq!(state.logs.len(), 2);
    }

    #[test]
    fn test_gather_unreachable_remote_is_tolerated() {
        let tmp = TempDir::new().unwrap();
        let session = AuditSession::new(tmp.path(), Config::without_tools());
        let missing = format!("https://{}/nowhere.git", "invalid.invalid");
        let mut state = RepositoryState::new(missing);

        let outcome = gather(&session, &mut state);
        assert!(matches!(outcome, GatherOutcome::Failed(_)));
        assert!(state.logs.iter().any(|l| l.contains("refresh failed")));
    }
}
