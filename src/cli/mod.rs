//! CLI command implementations

pub mod init;
pub mod issue;
pub mod run;
pub mod scan;
pub mod status;
