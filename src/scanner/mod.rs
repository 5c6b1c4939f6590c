//! Repository walker that yields candidate source files

use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

/// Directory names never descended into
const SKIPPED_DIRS: &[&str] = &["node_modules", ".git", ".security-auditor"];

/// Walks a repository tree, skipping dependency caches and engine state
pub struct Scanner {
    root: PathBuf,
    exclude_patterns: GlobSet,
    /// Extra directory name to skip (the configured store directory)
    store_dir_name: Option<String>,
}

impl Scanner {
    /// Create a new scanner for the given directory with default excludes
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_excludes(root, &[])
    }

    /// Create a new scanner with custom exclude patterns
    pub fn with_excludes(root: impl Into<PathBuf>, excludes: &[String]) -> Self {
        let mut builder = GlobSetBuilder::new();
        for pattern in excludes {
            match Glob::new(pattern) {
                Ok(glob) => {
                    builder.add(glob);
                }
                Err(e) => tracing::warn!("Ignoring invalid exclude pattern '{}': {}", pattern, e),
            }
        }

        Self {
            root: root.into(),
            exclude_patterns: builder.build().unwrap_or_else(|_| GlobSet::empty()),
            store_dir_name: None,
        }
    }

    /// Also skip directories with this name (the store may live inside a scanned tree)
    pub fn skipping_dir(mut self, name: Option<String>) -> Self {
        self.store_dir_name = name;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All files under the root whose extension is in `extensions`
    /// (case-insensitive, without the dot), in a stable order
    pub fn files_with_extensions(&self, extensions: &[&str]) -> Vec<PathBuf> {
        self.files()
            .into_iter()
            .filter(|path| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|ext| extensions.iter().any(|x| x.eq_ignore_ascii_case(ext)))
            })
            .collect()
    }

    /// Every regular file under the root, minus skipped directories and excludes
    pub fn files(&self) -> Vec<PathBuf> {
        let store_dir_name = self.store_dir_name.clone();
        let walker = WalkBuilder::new(&self.root)
            .standard_filters(false)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|t| t.is_dir());
                if !is_dir {
                    return true;
                }
                let name = entry.file_name().to_string_lossy();
                let name: &str = &name;
                !SKIPPED_DIRS.contains(&name) && store_dir_name.as_deref() != Some(name)
            })
            .build();

        let mut files = Vec::new();
        for entry in walker.flatten() {
            let path = entry.path();
            if !entry.file_type().is_some_and(|t| t.is_file()) {
                continue;
            }

            if let Ok(relative) = path.strip_prefix(&self.root) {
                if self.exclude_patterns.is_match(relative) {
                    continue;
                }
            }

            files.push(path.to_path_buf());
        }

        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "x").unwrap();
    }

    #[test]
    fn test_skips_dependency_and_state_dirs() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "src/app.js");
        touch(tmp.path(), "node_modules/lib/index.js");
        touch(tmp.path(), ".git/hooks/pre-commit.js");
        touch(tmp.path(), ".security-auditor/x/fix-001.js");
        touch(tmp.path(), "audit-state/y.js");

        let scanner = Scanner::new(tmp.path()).skipping_dir(Some("audit-state".to_string()));
        let files = scanner.files_with_extensions(&["js"]);
        assert_eq!(files, vec![tmp.path().join("src/app.js")]);
    }

    #[test]
    fn test_extension_filter_and_excludes() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), "a.PY");
        touch(tmp.path(), "b.rb");
        touch(tmp.path(), "vendor/c.py");

        let scanner = Scanner::with_excludes(tmp.path(), &["vendor/**".to_string()]);
        assert_eq!(scanner.files_with_extensions(&["py"]), vec![tmp.path().join("a.PY")]);
        assert_eq!(scanner.files().len(), 2);
    }

    #[test]
    fn test_hidden_files_are_scanned() {
        let tmp = TempDir::new().unwrap();
        touch(tmp.path(), ".config/settings.js");
        let scanner = Scanner::new(tmp.path());
        assert_eq!(scanner.files_with_extensions(&["js"]).len(), 1);
    }
}
