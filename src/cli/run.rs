//! Run command implementation

use anyhow::Result;

use security_auditor::ScanProfile;
use security_auditor::pipeline::{self, StatusReport};
use security_auditor::session::AuditSession;

/// Run the full pipeline over every repository, then print the combined table
pub fn run_command(session: &AuditSession, repos: Option<&str>, profile: Option<ScanProfile>) -> Result<()> {
    let repos = pipeline::repos_from(repos, &session.config().settings.repos)?;
    let states = pipeline::run(session, &repos, profile)?;

    println!("{}", StatusReport::new(states).render_table());

    Ok(())
}
