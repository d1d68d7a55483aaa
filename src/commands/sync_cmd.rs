//! Batch commands: fetch events into the store and render them to Markdown.

use clap::Args;
use std::path::{Path, PathBuf};

use super::{print_report, today, Context, RangeArgs};
use crate::config::Config;
use crate::lock::LockError;
use crate::models::DateRangeError;
use crate::render::{TemplateError, Templates};
use crate::source::{JsonFileSource, SourceError};
use crate::sync::{SyncReport, Syncer};

/// Fetch events for a range, then render event documents and journals
#[derive(Debug, Args)]
pub struct SyncCommand {
    #[command(flatten)]
    range: RangeArgs,

    /// JSON export to read events from (overrides events_file)
    #[arg(long)]
    events_file: Option<PathBuf>,
}

/// Fetch events for a range into the store without rendering
#[derive(Debug, Args)]
pub struct ImportCommand {
    #[command(flatten)]
    range: RangeArgs,

    /// JSON export to read events from (overrides events_file)
    #[arg(long)]
    events_file: Option<PathBuf>,
}

/// Render stored events for a range without fetching
#[derive(Debug, Args)]
pub struct RenderCommand {
    #[command(flatten)]
    range: RangeArgs,

    /// Only render per-day journals
    #[arg(long, conflicts_with = "events_only")]
    journals_only: bool,

    /// Only render per-event documents
    #[arg(long)]
    events_only: bool,
}

impl SyncCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), SyncCommandError> {
        let range = self.range.resolve(today())?;
        let source = open_source(self.events_file.as_deref(), &ctx.config)?;
        let templates = ctx.load_templates()?;
        let _lock = ctx.lock()?;
        let syncer = syncer(ctx, &templates);

        println!("Syncing {}...", range);
        let fetched = syncer.fetch(&source, &range).await?;
        let rendered = syncer.sync_range(&range).await;

        print_report("Fetched", &fetched);
        print_report("Rendered", &rendered);
        finish(&[fetched, rendered])
    }
}

impl ImportCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), SyncCommandError> {
        let range = self.range.resolve(today())?;
        let source = open_source(self.events_file.as_deref(), &ctx.config)?;
        let templates = ctx.load_templates()?;
        let _lock = ctx.lock()?;

        println!("Importing {}...", range);
        let fetched = syncer(ctx, &templates).fetch(&source, &range).await?;

        print_report("Fetched", &fetched);
        finish(&[fetched])
    }
}

impl RenderCommand {
    pub async fn run(&self, ctx: &Context) -> Result<(), SyncCommandError> {
        let range = self.range.resolve(today())?;
        let templates = ctx.load_templates()?;
        let _lock = ctx.lock()?;
        let syncer = syncer(ctx, &templates);

        println!("Rendering {}...", range);
        let report = if self.journals_only {
            syncer.sync_journals(&range).await
        } else if self.events_only {
            syncer.render_events(&range).await
        } else {
            syncer.sync_range(&range).await
        };

        print_report("Rendered", &report);
        finish(&[report])
    }
}

fn syncer<'a>(ctx: &'a Context, templates: &'a Templates) -> Syncer<'a> {
    Syncer::new(
        &ctx.repo,
        templates,
        ctx.config.events_dir.value.clone(),
        ctx.config.journals_dir.value.clone(),
    )
}

fn open_source(flag: Option<&Path>, config: &Config) -> Result<JsonFileSource, SyncCommandError> {
    let path = flag
        .or(config.events_file.value.as_deref())
        .ok_or(SyncCommandError::NoEventsFile)?;
    Ok(JsonFileSource::open(path)?)
}

/// The batch always runs to the end; unfinished units only change the exit status.
fn finish(reports: &[SyncReport]) -> Result<(), SyncCommandError> {
    let unfinished: usize = reports.iter().map(|r| r.skipped + r.failed).sum();
    if unfinished > 0 {
        return Err(SyncCommandError::Incomplete(unfinished));
    }
    Ok(())
}

/// Errors from sync commands
#[derive(Debug)]
pub enum SyncCommandError {
    NoEventsFile,
    Range(DateRangeError),
    Source(SourceError),
    Template(TemplateError),
    Lock(LockError),
    Incomplete(usize),
}

impl std::fmt::Display for SyncCommandError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SyncCommandError::NoEventsFile => write!(
                f,
                "No events file: pass --events-file or set events_file / CALJOURNAL_EVENTS_FILE"
            ),
            SyncCommandError::Range(e) => write!(f, "{}", e),
            SyncCommandError::Source(e) => write!(f, "{}", e),
            SyncCommandError::Template(e) => write!(f, "{}", e),
            SyncCommandError::Lock(e) => write!(f, "{}", e),
            SyncCommandError::Incomplete(n) => {
                write!(f, "{} unit(s) were skipped or failed", n)
            }
        }
    }
}

impl std::error::Error for SyncCommandError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SyncCommandError::Range(e) => Some(e),
            SyncCommandError::Source(e) => Some(e),
            SyncCommandError::Template(e) => Some(e),
            SyncCommandError::Lock(e) => Some(e),
            _ => None,
        }
    }
}

impl From<DateRangeError> for SyncCommandError {
    fn from(e: DateRangeError) -> Self {
        SyncCommandError::Range(e)
    }
}

impl From<SourceError> for SyncCommandError {
    fn from(e: SourceError) -> Self {
        SyncCommandError::Source(e)
    }
}

impl From<TemplateError> for SyncCommandError {
    fn from(e: TemplateError) -> Self {
        SyncCommandError::Template(e)
    }
}

impl From<LockError> for SyncCommandError {
    fn from(e: LockError) -> Self {
        SyncCommandError::Lock(e)
    }
}
