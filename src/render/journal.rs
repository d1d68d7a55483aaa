use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::{RenderError, Templates, WriteOutcome};
use crate::markdown::frontmatter;
use crate::markdown::{write_atomic, DocumentState, Frontmatter, FrontmatterError, JournalSections, ScalarStyle};
use crate::models::{EventRow, LOCAL_DATETIME_FORMAT};

/// `Wednesday, 15 January 2025`
pub const FORMATTED_DATE: &str = "%A, %d %B %Y";

/// One line of the Activities block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Activity {
    pub start_time: String,
    pub end_time: String,
    pub event_summary: String,
    pub event_id: String,
}

#[derive(Debug, Serialize)]
struct ActivitiesContext<'a> {
    date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    formatted_date: Option<String>,
    events: &'a [Activity],
}

impl<'a> ActivitiesContext<'a> {
    /// Context for a brand new journal: the template emits the whole document.
    fn document(date: NaiveDate, events: &'a [Activity]) -> Self {
        Self {
            date: date.to_string(),
            formatted_date: Some(date.format(FORMATTED_DATE).to_string()),
            events,
        }
    }

    /// Context for splicing into an existing journal: only the list is emitted.
    fn block(date: NaiveDate, events: &'a [Activity]) -> Self {
        Self {
            date: date.to_string(),
            formatted_date: None,
            events,
        }
    }
}

/// `<root>/<YYYY>/<YYYY-MM>/<YYYY-MM-DD>.md`
pub fn journal_path(root: &Path, date: NaiveDate) -> PathBuf {
    root.join(date.format("%Y").to_string())
        .join(date.format("%Y-%m").to_string())
        .join(format!("{}.md", date.format("%Y-%m-%d")))
}

/// Shape the day's rows into activities ordered by local start time.
pub fn activities_for(rows: &[EventRow]) -> Result<Vec<Activity>, RenderError> {
    let mut keyed = rows
        .iter()
        .map(|row| {
            let activity = Activity {
                start_time: clock_time(row, "start_date", "start")?,
                end_time: clock_time(row, "end_date", "end")?,
                event_summary: row.text("summary").into_owned(),
                event_id: row.event_id().into_owned(),
            };
            Ok((start_key(row), activity))
        })
        .collect::<Result<Vec<_>, RenderError>>()?;

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, activity)| activity).collect())
}

/// `HH:MM` from the local column, falling back to the ISO timestamp column.
fn clock_time(row: &EventRow, local_column: &str, iso_column: &str) -> Result<String, RenderError> {
    if let Ok(local) = NaiveDateTime::parse_from_str(&row.text(local_column), LOCAL_DATETIME_FORMAT) {
        return Ok(local.format("%H:%M").to_string());
    }
    DateTime::parse_from_rfc3339(&row.text(iso_column))
        .map(|dt| dt.format("%H:%M").to_string())
        .map_err(|_| RenderError::Timestamp {
            event_id: row.event_id().into_owned(),
            column: local_column.to_string(),
        })
}

/// Local wall-clock start, the same clock the store orders `start_date` by.
fn start_key(row: &EventRow) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(&row.text("start_date"), LOCAL_DATETIME_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(&row.text("start")).map(|dt| dt.naive_local()))
        .ok()
}

/// Keys written unquoted when a journal's frontmatter is re-serialized.
pub const PLAIN_KEYS: &[&str] = &["date"];

/// An existing journal cut around its Activities span.
#[derive(Debug)]
pub struct ParsedJournal {
    frontmatter: Frontmatter,
    preamble: String,
    trailing: String,
}

#[derive(Debug)]
pub enum JournalDefect {
    Frontmatter(FrontmatterError),
    MissingActivities,
}

impl ParsedJournal {
    pub fn parse(contents: &str) -> Result<Self, JournalDefect> {
        let (frontmatter, body) = frontmatter::parse(contents).map_err(JournalDefect::Frontmatter)?;
        let sections = JournalSections::locate(body).ok_or(JournalDefect::MissingActivities)?;
        Ok(Self {
            frontmatter,
            preamble: sections.preamble.to_string(),
            trailing: sections.trailing.to_string(),
        })
    }

    /// Swap the Activities span for `block`, keeping everything around it.
    pub fn merge(&self, block: &str) -> Result<String, FrontmatterError> {
        // A heading at end of file has no newline of its own.
        let separator = if self.preamble.ends_with('\n') { "" } else { "\n" };
        let body = format!("{}{}{}\n{}", self.preamble, separator, block, self.trailing);
        frontmatter::render_document(&self.frontmatter, &body, &ScalarStyle::plain(PLAIN_KEYS))
    }
}

/// Writes one journal per day under a year/month tree.
pub struct JournalRenderer<'a> {
    templates: &'a Templates,
    root: PathBuf,
}

impl<'a> JournalRenderer<'a> {
    pub fn new(templates: &'a Templates, root: impl Into<PathBuf>) -> Self {
        Self {
            templates,
            root: root.into(),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        journal_path(&self.root, date)
    }

    /// Create or merge the journal for `date` from that day's rows.
    ///
    /// A journal without an Activities heading, or with frontmatter that
    /// does not parse, is left byte-identical and reported.
    pub fn sync_day(&self, date: NaiveDate, rows: &[EventRow]) -> Result<WriteOutcome, RenderError> {
        let path = self.path_for(date);
        let activities = activities_for(rows)?;

        let state = DocumentState::load(&path, |contents| ParsedJournal::parse(&contents))
            .map_err(|e| RenderError::Io(path.clone(), e))?;

        let (contents, outcome) = match state {
            DocumentState::Absent => {
                let context = ActivitiesContext::document(date, &activities);
                (self.templates.render_activities(&context)?, WriteOutcome::Created)
            }
            DocumentState::Present(journal) => {
                let context = ActivitiesContext::block(date, &activities);
                let block = self.templates.render_activities(&context)?;
                let merged = journal
                    .merge(&block)
                    .map_err(|e| RenderError::Frontmatter(path.clone(), e))?;
                (merged, WriteOutcome::Updated)
            }
            DocumentState::Malformed(JournalDefect::Frontmatter(e)) => {
                return Err(RenderError::Frontmatter(path, e))
            }
            DocumentState::Malformed(JournalDefect::MissingActivities) => {
                return Err(RenderError::MissingHeading(path))
            }
        };

        write_atomic(&path, &contents).map_err(|e| RenderError::Io(path.clone(), e))?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct TestContext {
        templates: Templates,
        temp_dir: TempDir,
    }

    impl TestContext {
        fn renderer(&self) -> JournalRenderer<'_> {
            JournalRenderer::new(&self.templates, self.temp_dir.path())
        }

        fn path(&self) -> PathBuf {
            journal_path(self.temp_dir.path(), day())
        }
    }

    fn setup() -> TestContext {
        TestContext {
            templates: Templates::builtin().unwrap(),
            temp_dir: TempDir::new().unwrap(),
        }
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    fn row(id: &str, summary: &str, start: &str, end: &str) -> EventRow {
        EventRow::new()
            .with("event_id", id)
            .with("summary", summary)
            .with("start", format!("2025-01-15T{}:00+01:00", start))
            .with("end", format!("2025-01-15T{}:00+01:00", end))
            .with("start_date", format!("2025-01-15T{}", start))
            .with("end_date", format!("2025-01-15T{}", end))
    }

    #[test]
    fn test_journal_path_layout() {
        assert_eq!(
            journal_path(Path::new("/j"), day()),
            PathBuf::from("/j/2025/2025-01/2025-01-15.md")
        );
    }

    #[test]
    fn test_activities_sorted_by_start() {
        let rows = vec![
            row("b", "Standup", "09:00", "09:15"),
            row("a", "Gym", "08:00", "08:45"),
            row("c", "Review", "10:00", "11:00"),
        ];
        let times: Vec<_> = activities_for(&rows)
            .unwrap()
            .into_iter()
            .map(|a| a.start_time)
            .collect();
        assert_eq!(times, vec!["08:00", "09:00", "10:00"]);
    }

    #[test]
    fn test_mixed_rows_sort_on_local_clock() {
        // 08:30 in New York is 13:30 UTC, but it sorts by its 08:30 wall clock.
        let iso_only = EventRow::new()
            .with("event_id", "ny")
            .with("summary", "Call")
            .with("start", "2025-01-15T08:30:00-05:00")
            .with("end", "2025-01-15T09:00:00-05:00")
            .with("start_date", "")
            .with("end_date", "");
        let rows = vec![
            row("late", "Review", "10:00", "11:00"),
            iso_only,
            row("early", "Gym", "07:00", "07:45"),
        ];
        let ids: Vec<_> = activities_for(&rows)
            .unwrap()
            .into_iter()
            .map(|a| a.event_id)
            .collect();
        assert_eq!(ids, vec!["early", "ny", "late"]);
    }

    #[test]
    fn test_clock_time_falls_back_to_iso_column() {
        let row = EventRow::new()
            .with("event_id", "x")
            .with("start", "2025-01-15T07:30:00-05:00")
            .with("end", "2025-01-15T08:00:00-05:00")
            .with("start_date", "")
            .with("end_date", "");
        let activity = &activities_for(&[row]).unwrap()[0];
        assert_eq!(activity.start_time, "07:30");
        assert_eq!(activity.end_time, "08:00");
    }

    #[test]
    fn test_unusable_timestamp_is_an_error() {
        let row = EventRow::new().with("event_id", "x").with("start_date", "soon");
        let err = activities_for(&[row]).unwrap_err();
        assert!(matches!(err, RenderError::Timestamp { .. }));
        assert!(!err.is_malformed());
    }

    #[test]
    fn test_new_journal_from_template() {
        let ctx = setup();
        let outcome = ctx
            .renderer()
            .sync_day(day(), &[row("evt1", "Standup", "09:00", "09:15")])
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Created);

        let contents = fs::read_to_string(ctx.path()).unwrap();
        assert_eq!(
            contents,
            "---\ndate: 2025-01-15\n---\n# Wednesday, 15 January 2025\n\n## Activities\n\
             - 09:00 - 09:15 [[evt1|Standup]]\n\n## Goal\n\n"
        );
    }

    #[test]
    fn test_resync_preserves_goal_and_preamble() {
        let ctx = setup();
        let path = ctx.path();
        let before = "---\ndate: 2025-01-15\n---\n# Notes first\n\n## Activities\n";
        let goal = "## Goal\n\nFinish the report\n";
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("{}- 07:00 - 07:30 [[old|Old]]\n\n{}", before, goal)).unwrap();

        let rows = [
            row("b", "Standup", "09:00", "09:15"),
            row("a", "Gym", "08:00", "08:45"),
        ];
        let outcome = ctx.renderer().sync_day(day(), &rows).unwrap();
        assert_eq!(outcome, WriteOutcome::Updated);

        let contents = fs::read_to_string(&path).unwrap();
        assert_eq!(
            contents,
            format!(
                "{}- 08:00 - 08:45 [[a|Gym]]\n- 09:00 - 09:15 [[b|Standup]]\n\n{}",
                before, goal
            )
        );
    }

    #[test]
    fn test_resync_is_stable() {
        let ctx = setup();
        let renderer = ctx.renderer();
        let rows = [row("a", "Gym", "08:00", "08:45")];

        renderer.sync_day(day(), &rows).unwrap();
        let first = fs::read_to_string(ctx.path()).unwrap();
        renderer.sync_day(day(), &rows).unwrap();
        assert_eq!(fs::read_to_string(ctx.path()).unwrap(), first);
    }

    #[test]
    fn test_heading_at_end_of_file_is_fully_regenerated() {
        let ctx = setup();
        let path = ctx.path();
        let renderer = ctx.renderer();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "---\ndate: 2025-01-15\n---\n# Day\n\n## Activities").unwrap();

        renderer
            .sync_day(day(), &[row("a", "Gym", "08:00", "08:45")])
            .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "---\ndate: 2025-01-15\n---\n# Day\n\n## Activities\n- 08:00 - 08:45 [[a|Gym]]\n\n"
        );

        renderer
            .sync_day(day(), &[row("b", "Run", "07:00", "07:30")])
            .unwrap();
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "---\ndate: 2025-01-15\n---\n# Day\n\n## Activities\n- 07:00 - 07:30 [[b|Run]]\n\n"
        );
    }

    #[test]
    fn test_settings_block_without_goal_survives() {
        let ctx = setup();
        let path = ctx.path();
        let settings = "%% kanban:settings\n```\n{\"kanban-plugin\":\"basic\"}\n```\n%%\n";
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, format!("## Activities\n- stale\n\n{}", settings)).unwrap();

        ctx.renderer()
            .sync_day(day(), &[row("a", "Gym", "08:00", "08:45")])
            .unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.ends_with(&format!("- 08:00 - 08:45 [[a|Gym]]\n\n{}", settings)));
        assert!(!contents.contains("stale"));
    }

    #[test]
    fn test_existing_without_frontmatter_gets_empty_block() {
        let ctx = setup();
        let path = ctx.path();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "## Activities\n").unwrap();

        ctx.renderer().sync_day(day(), &[]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "---\n{}\n---\n## Activities\n\n");
    }

    #[test]
    fn test_missing_heading_left_byte_identical() {
        let ctx = setup();
        let path = ctx.path();
        let original = "---\ndate: 2025-01-15\n---\n# Day\n\n## Activity log\n- mine\n";
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, original).unwrap();

        let err = ctx
            .renderer()
            .sync_day(day(), &[row("a", "Gym", "08:00", "08:45")])
            .unwrap_err();
        assert!(matches!(err, RenderError::MissingHeading(_)));
        assert!(err.is_malformed());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_malformed_frontmatter_left_byte_identical() {
        let ctx = setup();
        let path = ctx.path();
        let original = "---\ndate: [2025\n---\n## Activities\n";
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, original).unwrap();

        let err = ctx.renderer().sync_day(day(), &[]).unwrap_err();
        assert!(matches!(err, RenderError::Frontmatter(..)));
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }
}
