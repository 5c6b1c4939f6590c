//! Status command implementation

use anyhow::Result;

use security_auditor::pipeline;
use security_auditor::session::AuditSession;

/// Show tracked issues for one repository or all known ones
pub fn status_command(session: &AuditSession, repo: Option<&str>, json: bool) -> Result<()> {
    let report = pipeline::status(session, repo)?;

    if json {
        println!("{}", report.to_json()?);
    } else {
        println!("{}", report.render_table());
    }

    Ok(())
}
