//! Single-issue commands: fix, verify, commit

use anyhow::{Result, bail};

use security_auditor::pipeline;
use security_auditor::remediation::{FixOutcome, Verdict};
use security_auditor::session::AuditSession;

pub fn fix_command(session: &AuditSession, repo: &str, issue_id: &str) -> Result<()> {
    match pipeline::fix(session, repo, issue_id)? {
        FixOutcome::Applied { artifact } => {
            println!("Issue {}: fix applied ({})", issue_id, artifact.display());
            Ok(())
        }
        FixOutcome::NotApplicable(reason) => bail!("Issue {}: fix not applied: {}", issue_id, reason),
    }
}

pub fn verify_command(session: &AuditSession, repo: &str, issue_id: &str) -> Result<()> {
    match pipeline::verify(session, repo, issue_id)? {
        Verdict::Passed => {
            println!("Issue {}: verified", issue_id);
            Ok(())
        }
        Verdict::Failed(reason) => bail!("Issue {}: verification failed: {}", issue_id, reason),
    }
}

pub fn commit_command(session: &AuditSession, repo: &str, issue_id: &str) -> Result<()> {
    let outcome = pipeline::commit(session, repo, issue_id)?;
    println!("Issue {}: {}", issue_id, outcome);
    Ok(())
}
