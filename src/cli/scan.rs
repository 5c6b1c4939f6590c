//! Scan command implementation

use anyhow::Result;

use security_auditor::ScanProfile;
use security_auditor::pipeline::{self, StatusReport};
use security_auditor::session::AuditSession;

/// Scan one repository and print its issue table
pub fn scan_command(session: &AuditSession, repo: &str, profile: Option<ScanProfile>) -> Result<()> {
    let (state, report) = pipeline::scan(session, repo, profile)?;

    eprintln!(
        "Scanned {} with profile {} ({}): {} new, {} already tracked",
        state.repo_path, report.profile, report.gather, report.ingest.created, report.ingest.refreshed
    );
    println!("{}", StatusReport::new(vec![state]).render_table());

    Ok(())
}
