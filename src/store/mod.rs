//! Durable per-repository snapshots
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<slug>/issues.json     full RepositoryState snapshot
//! <root>/<slug>/logs.txt        append-only timestamped log
//! <root>/<slug>/fix-<id>.diff   unified diff of an applied fix
//! <root>/repos/<name>/          clones of remote repositories
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use fs2::FileExt;

use crate::domain::{RepositoryState, repo_slug};

const SNAPSHOT_FILE: &str = "issues.json";
const LOG_FILE: &str = "logs.txt";

/// Reads and writes repository snapshots below a root directory.
///
/// There is no cross-process coordination beyond the write lock: callers must
/// not run two commands against the same repository at once.
#[derive(Debug, Clone)]
pub struct StateStore {
    root: PathBuf,
}

impl StateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one repository's files
    pub fn repo_dir(&self, slug: &str) -> PathBuf {
        self.root.join(slug)
    }

    /// Directory where remote repositories are cloned
    pub fn clones_dir(&self) -> PathBuf {
        self.root.join("repos")
    }

    fn snapshot_path(&self, slug: &str) -> PathBuf {
        self.repo_dir(slug).join(SNAPSHOT_FILE)
    }

    /// Load the snapshot for a repository, or an empty state if none exists yet.
    ///
    /// Nothing is written until `save`.
    pub fn load(&self, repo_path: &str) -> Result<RepositoryState> {
        let path = self.snapshot_path(&repo_slug(repo_path));
        if !path.exists() {
            return Ok(RepositoryState::new(repo_path));
        }
        Self::read_snapshot(&path)
    }

    fn read_snapshot(path: &Path) -> Result<RepositoryState> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse snapshot: {}", path.display()))
    }

    /// Overwrite the full snapshot.
    ///
    /// Writes to a temp file under an exclusive lock and renames it over the
    /// snapshot, so readers see either the old or the new state, never a mix.
    pub fn save(&self, state: &RepositoryState) -> Result<()> {
        let dir = self.repo_dir(&state.slug);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;

        let path = dir.join(SNAPSHOT_FILE);
        let content =
            serde_json::to_string_pretty(state).context("Failed to serialize repository state")?;

        let lock_path = path.with_extension("json.lock");
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&lock_path)
            .with_context(|| format!("Failed to create lock file: {}", lock_path.display()))?;

        lock_file
            .lock_exclusive()
            .context("Failed to acquire snapshot lock")?;

        let temp_path = path.with_extension("json.tmp");
        let mut temp_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        temp_file
            .write_all(content.as_bytes())
            .context("Failed to write snapshot content")?;
        temp_file.sync_all().context("Failed to sync snapshot")?;

        std::fs::rename(&temp_path, &path)
            .with_context(|| format!("Failed to replace snapshot: {}", path.display()))?;

        Ok(())
    }

    /// Record a timestamped line in memory and in the repository's log file.
    ///
    /// The file append is best-effort: failures are reported through tracing only.
    pub fn append_log(&self, state: &mut RepositoryState, message: impl AsRef<str>) {
        let message = message.as_ref();
        let line = format!("{} {}", Utc::now().to_rfc3339(), message);
        tracing::info!(repo = %state.repo_path, "{}", message);

        if let Err(e) = self.append_log_file(&state.slug, &line) {
            tracing::warn!("Failed to append to log for {}: {:#}", state.repo_path, e);
        }
        state.logs.push(line);
    }

    fn append_log_file(&self, slug: &str, line: &str) -> Result<()> {
        let dir = self.repo_dir(slug);
        std::fs::create_dir_all(&dir)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE))?;
        writeln!(file, "{}", line)?;
        Ok(())
    }

    /// Write a fix artifact and return its path
    pub fn write_artifact(&self, state: &RepositoryState, issue_id: &str, text: &str) -> Result<PathBuf> {
        let dir = self.repo_dir(&state.slug);
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create state directory: {}", dir.display()))?;
        let path = dir.join(format!("fix-{}.diff", issue_id));
        std::fs::write(&path, text)
            .with_context(|| format!("Failed to write fix artifact: {}", path.display()))?;
        Ok(path)
    }

    /// Repository paths of every readable snapshot in the store, sorted
    pub fn known_repos(&self) -> Result<Vec<String>> {
        if !self.root.exists() {
            return Ok(Vec::new());
        }

        let entries = std::fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list store: {}", self.root.display()))?;

        let mut repos = Vec::new();
        for entry in entries.flatten() {
            let snapshot = entry.path().join(SNAPSHOT_FILE);
            if !snapshot.is_file() {
                continue;
            }
            match Self::read_snapshot(&snapshot) {
                Ok(state) => repos.push(state.repo_path),
                Err(e) => tracing::warn!("Skipping unreadable snapshot: {:#}", e),
            }
        }
        repos.sort();
        Ok(repos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{IssueRecord, Severity};
    use tempfile::TempDir;

    #[test]
    fn test_load_unknown_repo_is_empty_and_not_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());

        let state = store.load("/srv/app").unwrap();
        assert!(state.issues.is_empty());
        assert_eq!(state.slug, "srv_app");
        assert!(!tmp.path().join("srv_app").join(SNAPSHOT_FILE).exists());
    }

    #[test]
    fn test_save_then_load_round_trips_issues() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());

        let mut state = store.load("/srv/app").unwrap();
        state
            .issues
            .push(IssueRecord::new("001", "/srv/app", "demo", Severity::High));
        store.save(&state).unwrap();

        let loaded = store.load("/srv/app").unwrap();
        assert_eq!(loaded.issues.len(), 1);
        assert_eq!(loaded.issues[0].id, "001");
        assert!(!tmp.path().join("srv_app").join("issues.json.tmp").exists());
    }

    #[test]
    fn test_append_log_writes_memory_and_file() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        let mut state = store.load("/srv/app").unwrap();

        store.append_log(&mut state, "first");
        store.append_log(&mut state, "second");

        assert_eq!(state.logs.len(), 2);
        assert!(state.logs[0].ends_with(" first"));
        let file = std::fs::read_to_string(tmp.path().join("srv_app").join(LOG_FILE)).unwrap();
        assert_eq!(file.lines().count(), 2);
    }

    #[test]
    fn test_append_log_survives_unwritable_store() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("blocker");
        std::fs::write(&blocker, "not a directory").unwrap();
        let store = StateStore::new(&blocker);
        let mut state = RepositoryState::new("/srv/app");

        store.append_log(&mut state, "still recorded");
        assert_eq!(state.logs.len(), 1);
    }

    #[test]
    fn test_known_repos_skips_corrupt_snapshots() {
        let tmp = TempDir::new().unwrap();
        let store = StateStore::new(tmp.path());
        store.save(&RepositoryState::new("/b/repo")).unwrap();
        store.save(&RepositoryState::new("/a/repo")).unwrap();
        std::fs::create_dir_all(tmp.path().join("broken")).unwrap();
        std::fs::write(tmp.path().join("broken").join(SNAPSHOT_FILE), "{").unwrap();

        let repos = store.known_repos().unwrap();
        assert_eq!(repos, vec!["/a/repo".to_string(), "/b/repo".to_string()]);
    }
}
