//! Per-invocation context threaded through every pipeline call

use std::path::{Component, Path, PathBuf};

use anyhow::Result;

use crate::config::Config;
use crate::store::StateStore;

/// Working directory, configuration and state store for one CLI invocation
#[derive(Debug, Clone)]
pub struct AuditSession {
    work_dir: PathBuf,
    config: Config,
    store: StateStore,
}

impl AuditSession {
    pub fn new(work_dir: impl Into<PathBuf>, config: Config) -> Self {
        let work_dir = work_dir.into();
        let store = StateStore::new(config.store_root(&work_dir));
        Self {
            work_dir,
            config,
            store,
        }
    }

    /// Load configuration for `work_dir` and build a session
    pub fn open(work_dir: &Path, config_path: Option<&Path>) -> Result<Self> {
        let config = Config::load(work_dir, config_path)?;
        Ok(Self::new(work_dir, config))
    }

    /// Replace the store root (e.g. from `--store`)
    pub fn with_store_root(mut self, root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            self.work_dir.join(root)
        };
        self.store = StateStore::new(root);
        self
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    /// Resolve a repository argument: URLs verbatim, relative paths against the
    /// working directory, with `.` and `..` folded lexically.
    pub fn resolve_repo(&self, repo: &str) -> String {
        if is_remote(repo) {
            return repo.to_string();
        }
        let path = Path::new(repo);
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.work_dir.join(path)
        };
        normalize(&joined).display().to_string()
    }
}

/// Returns true if the identifier looks like a remote repository URL
pub fn is_remote(repo: &str) -> bool {
    repo.starts_with("git@")
        || repo.starts_with("http://")
        || repo.starts_with("https://")
        || repo.starts_with("ssh://")
}

fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_and_remote() {
        let session = AuditSession::new("/work", Config::default());
        assert_eq!(session.resolve_repo("shop"), "/work/shop");
        assert_eq!(session.resolve_repo("./shop/../api"), "/work/api");
        assert_eq!(session.resolve_repo("/abs/repo"), "/abs/repo");
        assert_eq!(
            session.resolve_repo("https://github.com/acme/shop.git"),
            "https://github.com/acme/shop.git"
        );
    }

    #[test]
    fn test_store_root_follows_config_and_override() {
        let session = AuditSession::new("/work", Config::default());
        assert_eq!(session.store().root(), Path::new("/work/.security-auditor"));

        let session = session.with_store_root("state");
        assert_eq!(session.store().root(), Path::new("/work/state"));
    }
}
