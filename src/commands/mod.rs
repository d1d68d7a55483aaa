mod config_cmd;
mod pull_cmd;
mod sync_cmd;

pub use config_cmd::ConfigCommand;
pub use pull_cmd::PullCommand;
pub use sync_cmd::{ImportCommand, RenderCommand, SyncCommand};

use chrono::NaiveDate;
use clap::Args;

use crate::config::Config;
use crate::db::{init_db, EventRepository};
use crate::lock::{LockError, RunLock};
use crate::models::{DateRange, DateRangeError, Period};
use crate::render::{TemplateError, Templates};
use crate::sync::SyncReport;

/// Date range selection shared by the batch commands
#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Named range relative to today
    #[arg(long, short, value_enum, default_value = "today")]
    period: Period,

    /// First date to process (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,

    /// Last date to process (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,
}

impl RangeArgs {
    pub fn resolve(&self, today: NaiveDate) -> Result<DateRange, DateRangeError> {
        DateRange::from_args(self.start.as_deref(), self.end.as_deref(), self.period, today)
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Everything a store-backed command needs
pub struct Context {
    pub config: Config,
    pub repo: EventRepository,
}

impl Context {
    pub async fn open(config: Config) -> Result<Self, sqlx::Error> {
        let pool = init_db(&config.database_path.value).await?;
        let repo = EventRepository::new(pool, config.table_name.value.clone())?;
        Ok(Self { config, repo })
    }

    pub fn load_templates(&self) -> Result<Templates, TemplateError> {
        Templates::load(
            self.config.event_template.value.as_deref(),
            self.config.activities_template.value.as_deref(),
        )
    }

    /// Single-writer lock on the journal tree, held by every writing command.
    pub fn lock(&self) -> Result<RunLock, LockError> {
        RunLock::acquire(&self.config.journals_dir.value)
    }
}

fn print_report(label: &str, report: &SyncReport) {
    println!("{}: {}", label, report);
    for failure in &report.failures {
        println!("  ✗ {}", failure);
    }
}
