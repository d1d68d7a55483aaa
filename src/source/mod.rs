//! Calendar event sources and normalization into store records.

mod json_file;

pub use json_file::JsonFileSource;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;

use crate::models::{DateRange, Event};

const UTC_NAME: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CalendarInfo {
    pub id: String,
    pub name: String,
}

/// A start or end time as the provider reports it: either a timestamp or,
/// for all-day events, a bare date.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderTime {
    pub date_time: Option<String>,
    pub date: Option<String>,
    pub time_zone: Option<String>,
}

impl ProviderTime {
    pub fn at(date_time: impl Into<String>) -> Self {
        Self {
            date_time: Some(date_time.into()),
            ..Default::default()
        }
    }

    pub fn all_day(date: impl Into<String>) -> Self {
        Self {
            date: Some(date.into()),
            ..Default::default()
        }
    }

    pub fn in_zone(mut self, zone: impl Into<String>) -> Self {
        self.time_zone = Some(zone.into());
        self
    }

    /// Calendar date as written by the provider, ignoring any zone.
    pub fn local_date(&self) -> Option<NaiveDate> {
        let raw = self.date_time.as_deref().or(self.date.as_deref())?;
        NaiveDate::parse_from_str(raw.get(..10)?, "%Y-%m-%d").ok()
    }
}

/// An event in the provider's wire shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub start: ProviderTime,
    #[serde(default)]
    pub end: ProviderTime,
    pub original_start_time: Option<ProviderTime>,
}

impl ProviderEvent {
    /// Zone name the event should be resolved in.
    fn zone_name(&self) -> &str {
        self.original_start_time
            .as_ref()
            .and_then(|t| t.time_zone.as_deref())
            .or(self.start.time_zone.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(UTC_NAME)
    }
}

/// Somewhere calendar events come from.
pub trait EventSource {
    fn calendars(&self) -> Result<Vec<CalendarInfo>, SourceError>;

    fn events(
        &self,
        calendar_id: &str,
        range: &DateRange,
    ) -> Result<Vec<ProviderEvent>, SourceError>;
}

/// Convert a provider event into a store record.
///
/// Timestamps with an offset are kept as-is; naive timestamps and all-day
/// dates are localized in the event's zone. Unknown zone names fall back
/// to UTC.
pub fn normalize(raw: &ProviderEvent, calendar: &CalendarInfo) -> Result<Event, SourceError> {
    if raw.id.is_empty() {
        return Err(SourceError::MissingId);
    }

    let zone_name = raw.zone_name();
    let (tz, zone_name) = match zone_name.parse::<Tz>() {
        Ok(tz) => (tz, zone_name.to_string()),
        Err(_) => {
            tracing::warn!(
                event_id = %raw.id,
                "Unknown timezone '{}', defaulting to UTC",
                zone_name
            );
            (Tz::UTC, UTC_NAME.to_string())
        }
    };

    let start = resolve_time(&raw.start, tz).ok_or_else(|| SourceError::InvalidTime {
        event_id: raw.id.clone(),
        field: "start",
    })?;
    let end = resolve_time(&raw.end, tz).ok_or_else(|| SourceError::InvalidTime {
        event_id: raw.id.clone(),
        field: "end",
    })?;

    Ok(Event::new(raw.id.clone(), raw.summary.clone(), start, end)
        .with_calendar(calendar.id.clone(), calendar.name.clone())
        .with_description(raw.description.clone())
        .with_timezone(zone_name)
        .with_location(raw.location.clone()))
}

fn resolve_time(time: &ProviderTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    if let Some(raw) = time.date_time.as_deref() {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt);
        }
        return localize(raw.parse::<NaiveDateTime>().ok()?, tz);
    }

    let date = NaiveDate::parse_from_str(time.date.as_deref()?, "%Y-%m-%d").ok()?;
    localize(date.and_hms_opt(0, 0, 0)?, tz)
}

/// Pick the earlier instant for ambiguous local times; gaps have none.
fn localize(naive: NaiveDateTime, tz: Tz) -> Option<DateTime<FixedOffset>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.fixed_offset())
}

#[derive(Debug)]
pub enum SourceError {
    Io(PathBuf, std::io::Error),
    Json(serde_json::Error),
    UnknownCalendar(String),
    MissingId,
    InvalidTime { event_id: String, field: &'static str },
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Io(path, e) => write!(f, "Failed to read '{}': {}", path.display(), e),
            SourceError::Json(e) => write!(f, "Invalid events JSON: {}", e),
            SourceError::UnknownCalendar(id) => write!(f, "Unknown calendar '{}'", id),
            SourceError::MissingId => write!(f, "Event has no id"),
            SourceError::InvalidTime { event_id, field } => {
                write!(f, "Event '{}' has no valid {} time", event_id, field)
            }
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(_, e) => Some(e),
            SourceError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Json(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn calendar() -> CalendarInfo {
        CalendarInfo {
            id: "work@example.com".to_string(),
            name: "Work".to_string(),
        }
    }

    fn timed(id: &str, start: ProviderTime, end: ProviderTime) -> ProviderEvent {
        ProviderEvent {
            id: id.to_string(),
            summary: "Standup".to_string(),
            start,
            end,
            ..Default::default()
        }
    }

    #[test]
    fn test_timed_event_keeps_provider_offset() {
        let raw = timed(
            "evt1",
            ProviderTime::at("2025-01-15T09:00:00+01:00").in_zone("Europe/Berlin"),
            ProviderTime::at("2025-01-15T09:15:00+01:00").in_zone("Europe/Berlin"),
        );
        let event = normalize(&raw, &calendar()).unwrap();

        assert_eq!(event.timezone, "Europe/Berlin");
        assert_eq!(event.offsite(), "+01:00");
        assert_eq!(event.start_date(), "2025-01-15T09:00");
        assert_eq!(event.duration_minutes(), 15.0);
        assert_eq!(event.calendar_name, "Work");
        assert_eq!(event.calendar_id, "work@example.com");
    }

    #[test]
    fn test_original_start_zone_wins() {
        let mut raw = timed(
            "evt1",
            ProviderTime::at("2025-07-01T10:00:00").in_zone("UTC"),
            ProviderTime::at("2025-07-01T11:00:00").in_zone("UTC"),
        );
        raw.original_start_time = Some(ProviderTime::default().in_zone("America/New_York"));

        let event = normalize(&raw, &calendar()).unwrap();
        assert_eq!(event.timezone, "America/New_York");
        assert_eq!(event.offsite(), "-04:00");
        assert_eq!(event.start_date(), "2025-07-01T10:00");
    }

    #[test]
    fn test_all_day_event_is_local_midnight() {
        let raw = timed(
            "holiday",
            ProviderTime::all_day("2025-01-15").in_zone("Asia/Tokyo"),
            ProviderTime::all_day("2025-01-16").in_zone("Asia/Tokyo"),
        );
        let event = normalize(&raw, &calendar()).unwrap();

        assert_eq!(event.start_date(), "2025-01-15T00:00");
        assert_eq!(event.offsite(), "+09:00");
        assert_eq!(event.duration_hours(), 24.0);
    }

    #[test]
    fn test_missing_zone_defaults_to_utc() {
        let raw = timed(
            "evt1",
            ProviderTime::at("2025-01-15T09:00:00"),
            ProviderTime::at("2025-01-15T10:00:00"),
        );
        let event = normalize(&raw, &calendar()).unwrap();
        assert_eq!(event.timezone, "UTC");
        assert_eq!(event.offsite(), "+00:00");
    }

    #[test]
    fn test_unknown_zone_falls_back_to_utc() {
        let raw = timed(
            "evt1",
            ProviderTime::at("2025-01-15T09:00:00").in_zone("Mars/Olympus_Mons"),
            ProviderTime::at("2025-01-15T10:00:00").in_zone("Mars/Olympus_Mons"),
        );
        let event = normalize(&raw, &calendar()).unwrap();
        assert_eq!(event.timezone, "UTC");
        assert_eq!(event.offsite(), "+00:00");
    }

    #[test]
    fn test_invalid_times_rejected() {
        let raw = timed("evt1", ProviderTime::at("tomorrow"), ProviderTime::default());
        assert!(matches!(
            normalize(&raw, &calendar()),
            Err(SourceError::InvalidTime { field: "start", .. })
        ));

        let raw = timed("evt1", ProviderTime::all_day("2025-01-15"), ProviderTime::default());
        assert!(matches!(
            normalize(&raw, &calendar()),
            Err(SourceError::InvalidTime { field: "end", .. })
        ));
    }

    #[test]
    fn test_missing_id_rejected() {
        let raw = timed(
            "",
            ProviderTime::all_day("2025-01-15"),
            ProviderTime::all_day("2025-01-16"),
        );
        assert!(matches!(normalize(&raw, &calendar()), Err(SourceError::MissingId)));
    }

    #[test]
    fn test_deserialize_provider_shape() {
        let json = r#"{
            "id": "abc",
            "summary": "Lunch",
            "start": {"dateTime": "2025-01-15T12:00:00Z", "timeZone": "UTC"},
            "end": {"date": "2025-01-16"},
            "originalStartTime": {"timeZone": "Europe/Paris"}
        }"#;
        let raw: ProviderEvent = serde_json::from_str(json).unwrap();
        assert_eq!(raw.start.date_time.as_deref(), Some("2025-01-15T12:00:00Z"));
        assert_eq!(raw.end.date.as_deref(), Some("2025-01-16"));
        assert_eq!(raw.zone_name(), "Europe/Paris");
        assert_eq!(raw.description, "");
    }

    #[test]
    fn test_local_date() {
        assert_eq!(
            ProviderTime::at("2025-01-15T23:30:00-08:00").local_date(),
            NaiveDate::from_ymd_opt(2025, 1, 15)
        );
        assert_eq!(ProviderTime::default().local_date(), None);
    }
}
