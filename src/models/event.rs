use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Format used for the local `start_date`/`end_date` columns.
pub const LOCAL_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A calendar event as stored in the `events` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: String,
    pub calendar_id: String,
    pub calendar_name: String,
    pub summary: String,
    pub description: String,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    /// IANA timezone name the event was resolved in
    pub timezone: String,
    pub location: String,
}

impl Event {
    pub fn new(
        event_id: impl Into<String>,
        summary: impl Into<String>,
        start: DateTime<FixedOffset>,
        end: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            event_id: event_id.into(),
            calendar_id: String::new(),
            calendar_name: String::new(),
            summary: summary.into(),
            description: String::new(),
            start,
            end,
            timezone: "UTC".to_string(),
            location: String::new(),
        }
    }

    pub fn with_calendar(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        self.calendar_id = id.into();
        self.calendar_name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_timezone(mut self, timezone: impl Into<String>) -> Self {
        self.timezone = timezone.into();
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }

    /// Start rendered as local wall-clock time in the event's own offset.
    pub fn start_date(&self) -> String {
        self.start.format(LOCAL_DATETIME_FORMAT).to_string()
    }

    pub fn end_date(&self) -> String {
        self.end.format(LOCAL_DATETIME_FORMAT).to_string()
    }

    /// Duration in minutes, never negative.
    pub fn duration_minutes(&self) -> f64 {
        let seconds = (self.end - self.start).num_seconds().max(0);
        seconds as f64 / 60.0
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration_minutes() / 60.0
    }

    /// UTC offset of the start time as `±HH:MM`.
    pub fn offsite(&self) -> String {
        format_offset(*self.start.offset())
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {} ({})",
            self.start_date(),
            self.summary,
            self.end.format("%H:%M"),
            self.event_id
        )
    }
}

/// Format a UTC offset as `+HH:MM` / `-HH:MM`.
pub fn format_offset(offset: FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.abs();
    format!("{}{:02}:{:02}", sign, seconds / 3600, (seconds % 3600) / 60)
}
