use clap::Args;

use super::{print_report, Context};
use crate::lock::LockError;
use crate::sync::pull_frontmatter;

/// Copy edited event document frontmatter back into the store
#[derive(Debug, Args)]
pub struct PullCommand {}

impl PullCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), PullCommandError> {
        let events_dir = &ctx.config.events_dir.value;
        let _lock = ctx.lock()?;

        println!("Pulling frontmatter from {}...", events_dir.display());
        let report = pull_frontmatter(&ctx.repo, events_dir)
            .await
            .map_err(|e| PullCommandError::ReadDir(events_dir.display().to_string(), e))?;

        print_report("Pulled", &report);
        if report.failed > 0 {
            return Err(PullCommandError::Incomplete(report.failed));
        }
        Ok(())
    }
}

/// Errors from the pull command
#[derive(Debug)]
pub enum PullCommandError {
    ReadDir(String, std::io::Error),
    Lock(LockError),
    Incomplete(usize),
}

impl std::fmt::Display for PullCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PullCommandError::ReadDir(dir, e) => {
                write!(f, "Failed to read events directory '{}': {}", dir, e)
            }
            PullCommandError::Lock(e) => write!(f, "{}", e),
            PullCommandError::Incomplete(n) => write!(f, "{} document(s) failed", n),
        }
    }
}

impl std::error::Error for PullCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PullCommandError::ReadDir(_, e) => Some(e),
            PullCommandError::Lock(e) => Some(e),
            PullCommandError::Incomplete(_) => None,
        }
    }
}

impl From<LockError> for PullCommandError {
    fn from(e: LockError) -> Self {
        PullCommandError::Lock(e)
    }
}
