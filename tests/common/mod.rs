//! Shared helpers for integration tests

#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::process::Command;

use security_auditor::config::Config;
use security_auditor::session::AuditSession;
use tempfile::TempDir;

pub const VULNERABLE_JS: &str = "const render = (name) => {\n  document.body.innerHTML = '<h1>' + name + '</h1>';\n};\n";

pub const VULNERABLE_PY: &str = "import openai\n\n\ndef ask(user_input):\n    prompt = \"Answer politely: \" + user_input\n    return openai.Completion.create(prompt=prompt)\n";

pub const VULNERABLE_RB: &str = "class Deployer\n  def run(params)\n    system(\"deploy #{params[:env]}\")\n  end\nend\n";

pub const VULNERABLE_REQUIREMENTS: &str = "requests==2.31.0\nshopify-sdk==1.2.3\n";

/// Run git in `dir`, panicking with its output on failure
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .unwrap_or_else(|e| panic!("failed to run git {:?}: {}", args, e));
    assert!(
        output.status.success(),
        "git {:?} failed:\n{}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

/// Write files relative to `root`, creating parent directories
pub fn write_files(root: &Path, files: &[(&str, &str)]) {
    for (rel, content) in files {
        let path = root.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent dir");
        }
        fs::write(&path, content).expect("Failed to write file");
    }
}

/// Plain directory holding `files`, no version control
pub fn create_plain_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().expect("Failed to create temp dir");
    write_files(dir.path(), files);
    dir
}

/// Git repository with `files` committed as the initial commit
pub fn create_test_repo(files: &[(&str, &str)]) -> TempDir {
    let dir = create_plain_repo(files);
    let path = dir.path();

    git(path, &["init"]);
    git(path, &["config", "user.email", "test@example.com"]);
    git(path, &["config", "user.name", "Test User"]);
    git(path, &["add", "."]);
    git(path, &["commit", "-m", "Initial commit"]);

    dir
}

/// Session rooted in its own temp dir so state never lands inside the scanned repo
pub fn test_session() -> (TempDir, AuditSession) {
    let work = TempDir::new().expect("Failed to create temp dir");
    let session = AuditSession::new(work.path(), Config::without_tools());
    (work, session)
}

/// Repository argument for a temp dir
pub fn repo_arg(dir: &TempDir) -> String {
    dir.path().display().to_string()
}
