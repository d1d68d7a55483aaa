use serde::Deserialize;
use std::path::Path;

use super::{CalendarInfo, EventSource, ProviderEvent, SourceError};
use crate::models::DateRange;

#[derive(Debug, Deserialize)]
struct Export {
    #[serde(default)]
    calendars: Vec<ExportedCalendar>,
}

#[derive(Debug, Deserialize)]
struct ExportedCalendar {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    events: Vec<ProviderEvent>,
}

/// Events read from a JSON export of one or more calendars:
///
/// ```json
/// { "calendars": [ { "id": "...", "name": "...", "events": [ ... ] } ] }
/// ```
#[derive(Debug)]
pub struct JsonFileSource {
    calendars: Vec<ExportedCalendar>,
}

impl JsonFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let contents =
            std::fs::read_to_string(path).map_err(|e| SourceError::Io(path.to_path_buf(), e))?;
        Self::parse(&contents)
    }

    pub fn parse(json: &str) -> Result<Self, SourceError> {
        let export: Export = serde_json::from_str(json)?;
        Ok(Self {
            calendars: export.calendars,
        })
    }
}

impl EventSource for JsonFileSource {
    fn calendars(&self) -> Result<Vec<CalendarInfo>, SourceError> {
        Ok(self
            .calendars
            .iter()
            .map(|c| CalendarInfo {
                id: c.id.clone(),
                name: c.name.clone(),
            })
            .collect())
    }

    /// Events whose dates overlap `range`. Events with unreadable dates are
    /// passed through so normalization can report them.
    fn events(
        &self,
        calendar_id: &str,
        range: &DateRange,
    ) -> Result<Vec<ProviderEvent>, SourceError> {
        let calendar = self
            .calendars
            .iter()
            .find(|c| c.id == calendar_id)
            .ok_or_else(|| SourceError::UnknownCalendar(calendar_id.to_string()))?;

        Ok(calendar
            .events
            .iter()
            .filter(|event| {
                let starts_by_end = event
                    .start
                    .local_date()
                    .map_or(true, |start| start <= range.end());
                let ends_after_start = event
                    .end
                    .local_date()
                    .or_else(|| event.start.local_date())
                    .map_or(true, |end| end >= range.start());
                starts_by_end && ends_after_start
            })
            .cloned()
            .collect())
    }
}
