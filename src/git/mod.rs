//! Version control operations: clone, pull and commit

mod manager;

pub use manager::{
    CommitMessage, CommitOutcome, GitManager, commit_issue, find_git_root, versioned_root,
};
