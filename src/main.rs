use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use security_auditor::ScanProfile;
use security_auditor::session::AuditSession;

mod cli;

#[derive(Parser)]
#[command(name = "security-auditor")]
#[command(about = "Scan repositories for known weakness patterns and drive each finding to a verified, committed fix")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to .security-auditor/config.toml in the working directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State store directory (overrides settings.store_dir)
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan one repository, then triage and plan its issues
    Scan {
        /// Local path or remote URL
        repo: String,

        /// Scan profile (rotates through profiles when omitted)
        #[arg(long, value_enum)]
        profile: Option<ScanProfile>,
    },

    /// Apply the automated fix for one issue
    Fix {
        /// Issue id, e.g. 003
        issue_id: String,

        #[arg(long)]
        repo: String,
    },

    /// Check one issue's fix and commit it when it passes
    Verify {
        issue_id: String,

        #[arg(long)]
        repo: String,
    },

    /// Commit the file touched by one issue
    Commit {
        issue_id: String,

        #[arg(long)]
        repo: String,
    },

    /// List tracked issues
    Status {
        /// Only this repository (defaults to every repository in the store)
        #[arg(long)]
        repo: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Full pipeline over a list of repositories
    Run {
        /// Comma-separated repositories
        #[arg(long, env = "REPO_LIST")]
        repos: Option<String>,

        #[arg(long, value_enum)]
        profile: Option<ScanProfile>,
    },

    /// Write a commented default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .init();

    let work_dir = std::env::current_dir()?;

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(&work_dir, cli.config, force);
    }

    let mut session = AuditSession::open(&work_dir, cli.config.as_deref())?;
    if let Some(store) = cli.store {
        session = session.with_store_root(store);
    }

    match cli.command {
        Commands::Scan { repo, profile } => cli::scan::scan_command(&session, &repo, profile)?,
        Commands::Fix { issue_id, repo } => cli::issue::fix_command(&session, &repo, &issue_id)?,
        Commands::Verify { issue_id, repo } => {
            cli::issue::verify_command(&session, &repo, &issue_id)?
        }
        Commands::Commit { issue_id, repo } => {
            cli::issue::commit_command(&session, &repo, &issue_id)?
        }
        Commands::Status { repo, json } => {
            cli::status::status_command(&session, repo.as_deref(), json)?
        }
        Commands::Run { repos, profile } => {
            cli::run::run_command(&session, repos.as_deref(), profile)?
        }
        Commands::Init { .. } => {}
    }

    Ok(())
}
