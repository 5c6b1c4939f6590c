//! Fix engine and verifier
//!
//! Every weakness category the engine can repair is one [`Remediation`]
//! variant owning its plan text, file predicate, transform and acceptance
//! check. Transforms are pure text rewrites; [`apply`] handles the file and
//! the diff artifact.

mod command;
mod dependency;
mod patch;
mod prompt;
mod xss;

pub use patch::unified_patch;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::analyzer::heuristics::SCRIPT_EXTENSIONS;
use crate::config::Advisory;
use crate::domain::{Classifier, IssueRecord, RepositoryState};
use crate::store::StateStore;

/// Plan recorded for issues without a dedicated remediation
pub const GENERIC_PLAN: &str = "Apply standard secure coding practices per finding.";

/// Inputs a remediation may need beyond the file itself
#[derive(Debug, Clone, Copy)]
pub struct FixContext<'a> {
    pub advisories: &'a [Advisory],
}

/// Acceptance check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(String),
}

impl Verdict {
    pub fn failed(reason: impl Into<String>) -> Self {
        Verdict::Failed(reason.into())
    }

    pub fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }
}

/// Result of applying a fix to an issue's file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// File rewritten; diff stored at `artifact`
    Applied { artifact: PathBuf },
    NotApplicable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remediation {
    PromptInjection,
    CrossSiteScripting,
    DependencyUpgrade,
    CommandInjection,
}

impl Remediation {
    pub fn for_classifier(classifier: &Classifier) -> Option<Self> {
        match classifier {
            Classifier::PromptInjection => Some(Remediation::PromptInjection),
            Classifier::CrossSiteScripting => Some(Remediation::CrossSiteScripting),
            Classifier::MissingAuthorization => Some(Remediation::DependencyUpgrade),
            Classifier::CodeInjection => Some(Remediation::CommandInjection),
            Classifier::Other(_) => None,
        }
    }

    pub fn plan(&self) -> &'static str {
        match self {
            Remediation::PromptInjection => {
                "Sanitize and template user input in prompts; reject dangerous tokens."
            }
            Remediation::CrossSiteScripting => {
                "Escape HTML before injecting; avoid innerHTML; use textContent."
            }
            Remediation::DependencyUpgrade => {
                "Update dependencies enabling proper authorization checks; enforce 403 on unauthorized."
            }
            Remediation::CommandInjection => {
                "Validate allowed commands; avoid shell execution; use safe wrappers."
            }
        }
    }

    pub fn applies_to(&self, path: &Path, ctx: &FixContext<'_>) -> bool {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match self {
            Remediation::PromptInjection => ext == "py",
            Remediation::CrossSiteScripting => SCRIPT_EXTENSIONS.contains(&ext.as_str()),
            Remediation::DependencyUpgrade => {
                !dependency::advisories_for(path, ctx.advisories).is_empty()
            }
            Remediation::CommandInjection => ext == "rb",
        }
    }

    /// Rewrite `content`; `None` when there is nothing to change
    pub fn transform(&self, content: &str, path: &Path, ctx: &FixContext<'_>) -> Option<String> {
        match self {
            Remediation::PromptInjection => prompt::transform(content),
            Remediation::CrossSiteScripting => xss::transform(content),
            Remediation::DependencyUpgrade => {
                dependency::transform(content, &dependency::advisories_for(path, ctx.advisories))
            }
            Remediation::CommandInjection => command::transform(content),
        }
    }

    pub fn verify(&self, content: &str, path: &Path, ctx: &FixContext<'_>) -> Verdict {
        match self {
            Remediation::PromptInjection => prompt::verify(content),
            Remediation::CrossSiteScripting => xss::verify(content),
            Remediation::DependencyUpgrade => {
                dependency::verify(content, &dependency::advisories_for(path, ctx.advisories))
            }
            Remediation::CommandInjection => command::verify(content),
        }
    }
}

/// Plan text for a classifier, falling back to the generic plan
pub fn plan_for(classifier: Option<&Classifier>) -> &'static str {
    classifier
        .and_then(Remediation::for_classifier)
        .map_or(GENERIC_PLAN, |r| r.plan())
}

fn remediation_and_path(issue: &IssueRecord) -> std::result::Result<(Remediation, &Path), String> {
    let remediation = match &issue.classifier {
        Some(classifier) => Remediation::for_classifier(classifier)
            .ok_or_else(|| format!("no automated remediation for {}", classifier))?,
        None => return Err("issue has no classifier".to_string()),
    };
    let path = issue
        .file_path
        .as_deref()
        .ok_or_else(|| "issue has no file path".to_string())?;
    Ok((remediation, path))
}

/// Apply the remediation for `issue` to its file and store the diff artifact.
///
/// Problems with the issue's own file are reported as `NotApplicable`; only a
/// failure to persist the artifact is an error.
pub fn apply(
    store: &StateStore,
    state: &RepositoryState,
    issue: &IssueRecord,
    ctx: &FixContext<'_>,
) -> Result<FixOutcome> {
    let (remediation, path) = match remediation_and_path(issue) {
        Ok(found) => found,
        Err(reason) => return Ok(FixOutcome::NotApplicable(reason)),
    };
    if !remediation.applies_to(path, ctx) {
        return Ok(FixOutcome::NotApplicable(format!(
            "{} fix does not apply to {}",
            issue.classifier.as_ref().map_or("", |c| c.as_str()),
            path.display()
        )));
    }

    let before = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            return Ok(FixOutcome::NotApplicable(format!(
                "cannot read {}: {}",
                path.display(),
                e
            )));
        }
    };
    let Some(after) = remediation.transform(&before, path, ctx) else {
        return Ok(FixOutcome::NotApplicable(
            "no vulnerable pattern the fix can rewrite".to_string(),
        ));
    };
    if let Err(e) = std::fs::write(path, &after) {
        return Ok(FixOutcome::NotApplicable(format!(
            "cannot write {}: {}",
            path.display(),
            e
        )));
    }

    let root = state.root();
    let relative = path.strip_prefix(&root).unwrap_or(path);
    let diff = unified_patch(&relative.display().to_string(), &before, &after);
    let artifact = store.write_artifact(state, &issue.id, &diff)?;
    Ok(FixOutcome::Applied { artifact })
}

/// Re-read the issue's file and run the acceptance check
pub fn verify(issue: &IssueRecord, ctx: &FixContext<'_>) -> Verdict {
    let (remediation, path) = match remediation_and_path(issue) {
        Ok(found) => found,
        Err(reason) => return Verdict::Failed(reason),
    };
    match std::fs::read_to_string(path) {
        Ok(content) => remediation.verify(&content, path, ctx),
        Err(e) => Verdict::failed(format!("cannot read {}: {}", path.display(), e)),
    }
}
