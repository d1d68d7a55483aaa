//! Batch orchestration: fetch events into the store, then render documents.
//!
//! Every unit of work (one provider event, one event document, one journal
//! date) succeeds or fails on its own. Failures are logged and collected in a
//! [`SyncReport`]; they never abort the rest of the batch.

pub mod pull;
pub mod report;

pub use pull::pull_frontmatter;
pub use report::SyncReport;

use std::path::PathBuf;

use crate::db::EventRepository;
use crate::models::{DateRange, Event};
use crate::render::{EventDocRenderer, JournalRenderer, RenderError, Templates, WriteOutcome};
use crate::source::{normalize, EventSource, SourceError};

pub struct Syncer<'a> {
    repo: &'a EventRepository,
    templates: &'a Templates,
    events_dir: PathBuf,
    journals_dir: PathBuf,
}

impl<'a> Syncer<'a> {
    pub fn new(
        repo: &'a EventRepository,
        templates: &'a Templates,
        events_dir: impl Into<PathBuf>,
        journals_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            repo,
            templates,
            events_dir: events_dir.into(),
            journals_dir: journals_dir.into(),
        }
    }

    /// Pull every calendar's events for `range` from `source` into the store.
    ///
    /// Only a failure to list calendars is returned as an error.
    pub async fn fetch(
        &self,
        source: &dyn EventSource,
        range: &DateRange,
    ) -> Result<SyncReport, SourceError> {
        let mut report = SyncReport::new();

        for calendar in source.calendars()? {
            let events = match source.events(&calendar.id, range) {
                Ok(events) => events,
                Err(e) => {
                    tracing::error!("Failed to list events for '{}': {}", calendar.name, e);
                    report.fail(format!("calendar {}", calendar.id), e);
                    continue;
                }
            };
            tracing::info!(
                "Fetched {} event(s) from '{}' for {}",
                events.len(),
                calendar.name,
                range
            );

            for raw in &events {
                let event = match normalize(raw, &calendar) {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::warn!("Skipping event '{}': {}", raw.id, e);
                        report.skip(unit_name(&raw.id), e);
                        continue;
                    }
                };

                match self.store(&event).await {
                    Ok(outcome) => {
                        tracing::debug!("Stored {} ({})", event, outcome);
                        report.record(outcome);
                    }
                    Err(e) => {
                        tracing::error!("Failed to store event '{}': {}", event.event_id, e);
                        report.fail(event.event_id.clone(), e);
                    }
                }
            }
        }

        Ok(report)
    }

    async fn store(&self, event: &Event) -> Result<WriteOutcome, sqlx::Error> {
        let existed = self.repo.exists(&event.event_id).await?;
        self.repo.upsert(event).await?;
        Ok(if existed {
            WriteOutcome::Updated
        } else {
            WriteOutcome::Created
        })
    }

    /// Create or refresh the document of every event starting in `range`.
    pub async fn render_events(&self, range: &DateRange) -> SyncReport {
        let mut report = SyncReport::new();

        let rows = match self.repo.list_range(range).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Failed to read events for {}: {}", range, e);
                report.fail(format!("events {}", range), e);
                return report;
            }
        };

        let renderer = EventDocRenderer::new(self.templates, self.events_dir.clone());
        for row in &rows {
            let event_id = row.event_id().into_owned();
            match renderer.sync_event(row) {
                Ok(outcome) => {
                    tracing::debug!("Event document {} {}", event_id, outcome);
                    report.record(outcome);
                }
                Err(e) => record_render_error(&mut report, unit_name(&event_id), e),
            }
        }

        tracing::info!("Event documents for {}: {}", range, report);
        report
    }

    /// Create or merge the journal of every date in `range` that has events.
    pub async fn sync_journals(&self, range: &DateRange) -> SyncReport {
        let mut report = SyncReport::new();

        let dates = match self.repo.distinct_dates(range).await {
            Ok(dates) => dates,
            Err(e) => {
                tracing::error!("Failed to read dates for {}: {}", range, e);
                report.fail(format!("journals {}", range), e);
                return report;
            }
        };

        let renderer = JournalRenderer::new(self.templates, self.journals_dir.clone());
        for date in dates {
            let rows = match self.repo.list_on_date(date).await {
                Ok(rows) => rows,
                Err(e) => {
                    tracing::error!("Failed to read events on {}: {}", date, e);
                    report.fail(date.to_string(), e);
                    continue;
                }
            };

            match renderer.sync_day(date, &rows) {
                Ok(outcome) => {
                    tracing::debug!("Journal {} {} ({} event(s))", date, outcome, rows.len());
                    report.record(outcome);
                }
                Err(e) => record_render_error(&mut report, date.to_string(), e),
            }
        }

        tracing::info!("Journals for {}: {}", range, report);
        report
    }

    /// Event documents, then journals, for `range`.
    pub async fn sync_range(&self, range: &DateRange) -> SyncReport {
        let mut report = self.render_events(range).await;
        report.merge(self.sync_journals(range).await);
        report
    }
}

fn unit_name(event_id: &str) -> String {
    if event_id.is_empty() {
        "<no id>".to_string()
    } else {
        event_id.to_string()
    }
}

fn record_render_error(report: &mut SyncReport, unit: String, e: RenderError) {
    if e.is_malformed() {
        tracing::warn!("Skipping {}: {}", unit, e);
        report.skip(unit, e);
    } else {
        tracing::error!("Failed {}: {}", unit, e);
        report.fail(unit, e);
    }
}
