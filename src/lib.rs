//! security-auditor - multi-repository security issue lifecycle engine
//!
//! Scans source trees for known weakness patterns and tracks every finding
//! through a persistent state machine, from detection to a verified fix
//! committed to version control.
//!
//! ## Pipeline
//!
//! For each repository, strictly in order:
//!
//! 1. **Context**: clone or pull the repository ([`context`])
//! 2. **Detection**: ecosystem and business domain ([`detect`])
//! 3. **Analysis**: heuristics plus optional external tools ([`analyzer`])
//! 4. **Ingestion**: dedupe into issues, order by severity ([`ingest`])
//! 5. **Lifecycle**: triage, plan, fix, verify, commit ([`lifecycle`],
//!    [`remediation`], [`git`])
//!
//! State for each repository lives in one JSON snapshot managed by [`store`].

pub mod analyzer;
pub mod config;
pub mod context;
pub mod detect;
pub mod domain;
pub mod error;
pub mod git;
pub mod ingest;
pub mod lifecycle;
pub mod patterns;
pub mod pipeline;
pub mod remediation;
pub mod scanner;
pub mod session;
pub mod store;

pub use domain::*;
pub use error::AuditError;
