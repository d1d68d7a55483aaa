use serde_yaml::Value;
use std::path::PathBuf;

use super::{RenderError, Templates, WriteOutcome};
use crate::markdown::frontmatter;
use crate::markdown::{write_atomic, DocumentState, Frontmatter, FrontmatterError, ScalarStyle};
use crate::models::{CellValue, EventRow};

/// Frontmatter key and the row column it is filled from, in output order.
pub const FRONTMATTER_FIELDS: &[(&str, &str)] = &[
    ("title", "summary"),
    ("start-date", "start_date"),
    ("end-date", "end_date"),
    ("duration-minutes", "duration_minutes"),
    ("activity-block", "activity_block"),
    ("activity-category", "activity_category"),
    ("persona", "persona"),
];

/// Date keys are written unquoted so editors see `2025-01-15T09:00`.
pub const PLAIN_KEYS: &[&str] = &["start-date", "end-date"];

pub fn frontmatter_for(row: &EventRow) -> Frontmatter {
    FRONTMATTER_FIELDS
        .iter()
        .fold(Frontmatter::new(), |fm, (key, column)| {
            let value = row
                .get(column)
                .map(CellValue::to_yaml)
                .unwrap_or_else(|| Value::String(String::new()));
            fm.with(*key, value)
        })
}

/// Replace the frontmatter of `existing` with the row's, keeping the body.
pub fn update_frontmatter(existing: &str, row: &EventRow) -> Result<String, FrontmatterError> {
    let (_, body) = frontmatter::parse(existing)?;
    frontmatter::render_document(&frontmatter_for(row), body, &ScalarStyle::plain(PLAIN_KEYS))
}

/// Writes `<dir>/<event_id>.md` for each synced event.
pub struct EventDocRenderer<'a> {
    templates: &'a Templates,
    dir: PathBuf,
}

impl<'a> EventDocRenderer<'a> {
    pub fn new(templates: &'a Templates, dir: impl Into<PathBuf>) -> Self {
        Self {
            templates,
            dir: dir.into(),
        }
    }

    pub fn path_for(&self, event_id: &str) -> Result<PathBuf, RenderError> {
        if event_id.is_empty()
            || event_id == "."
            || event_id == ".."
            || event_id.contains(['/', '\\'])
        {
            return Err(RenderError::InvalidEventId(event_id.to_string()));
        }
        Ok(self.dir.join(format!("{}.md", event_id)))
    }

    /// Create the event's document from the template, or refresh the
    /// frontmatter of the one already on disk.
    pub fn sync_event(&self, row: &EventRow) -> Result<WriteOutcome, RenderError> {
        let path = self.path_for(&row.event_id())?;

        let state = DocumentState::load(&path, |existing| update_frontmatter(&existing, row))
            .map_err(|e| RenderError::Io(path.clone(), e))?;

        let (contents, outcome) = match state {
            DocumentState::Absent => (self.templates.render_event(row)?, WriteOutcome::Created),
            DocumentState::Present(updated) => (updated, WriteOutcome::Updated),
            DocumentState::Malformed(e) => return Err(RenderError::Frontmatter(path, e)),
        };

        write_atomic(&path, &contents).map_err(|e| RenderError::Io(path.clone(), e))?;
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::templates::DEFAULT_ACTIVITIES_TEMPLATE;
    use std::fs;
    use tempfile::TempDir;

    struct TestContext {
        templates: Templates,
        temp_dir: TempDir,
    }

    impl TestContext {
        fn renderer(&self) -> EventDocRenderer<'_> {
            EventDocRenderer::new(&self.templates, self.temp_dir.path())
        }
    }

    fn setup() -> TestContext {
        TestContext {
            templates: Templates::builtin().unwrap(),
            temp_dir: TempDir::new().unwrap(),
        }
    }

    fn row(summary: &str) -> EventRow {
        EventRow::new()
            .with("event_id", "evt1")
            .with("calendar_name", "Work")
            .with("calendar_id", "work@example.com")
            .with("summary", summary)
            .with("description", "Bring snacks")
            .with("start", "2025-01-15T12:00:00+01:00")
            .with("end", "2025-01-15T13:00:00+01:00")
            .with("start_date", "2025-01-15T12:00")
            .with("end_date", "2025-01-15T13:00")
            .with("duration_minutes", 60.0)
            .with("duration_hours", 1.0)
            .with("timezone", "Europe/Berlin")
            .with("offsite", "+01:00")
            .with("location", "")
            .with("activity_block", "")
            .with("activity_category", "")
            .with("persona", "")
    }

    #[test]
    fn test_frontmatter_order_and_plain_dates() {
        let doc = update_frontmatter("body\n", &row("Lunch")).unwrap();
        assert!(doc.starts_with(
            "---\ntitle: Lunch\nstart-date: 2025-01-15T12:00\nend-date: 2025-01-15T13:00\nduration-minutes: 60"
        ));
        assert!(doc.ends_with("---\nbody\n"));
    }

    #[test]
    fn test_missing_columns_become_empty() {
        let fm = frontmatter_for(&EventRow::new().with("summary", "Solo"));
        assert_eq!(fm.len(), FRONTMATTER_FIELDS.len());
        assert_eq!(fm.get("persona"), Some(&Value::String(String::new())));
    }

    #[test]
    fn test_sync_creates_from_template() {
        let ctx = setup();
        let outcome = ctx.renderer().sync_event(&row("Lunch")).unwrap();
        assert_eq!(outcome, WriteOutcome::Created);

        let contents = fs::read_to_string(ctx.temp_dir.path().join("evt1.md")).unwrap();
        assert!(contents.starts_with("---\ntitle: \"Lunch\"\nstart-date: 2025-01-15T12:00\n"));
        assert!(contents.contains("# Lunch\n"));
        assert!(contents.contains("- Calendar: Work\n"));
        assert!(contents.contains("Bring snacks"));
        assert!(!contents.contains("- Location:"));
    }

    #[test]
    fn test_render_then_update_is_idempotent() {
        let ctx = setup();
        let renderer = ctx.renderer();
        let path = ctx.temp_dir.path().join("evt1.md");

        renderer.sync_event(&row("Lunch")).unwrap();
        let created = fs::read_to_string(&path).unwrap();

        assert_eq!(renderer.sync_event(&row("Lunch")).unwrap(), WriteOutcome::Updated);
        let first = fs::read_to_string(&path).unwrap();
        assert_eq!(renderer.sync_event(&row("Lunch")).unwrap(), WriteOutcome::Updated);
        let second = fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);

        let (_, created_body) = frontmatter::parse(&created).unwrap();
        let (_, body) = frontmatter::parse(&second).unwrap();
        assert_eq!(body, created_body);
    }

    #[test]
    fn test_new_document_is_template_output_verbatim() {
        let templates = Templates::new(
            "---\ntitle: {{ summary }}\ntags: [meeting]\ncalendar: {{ calendar_name }}\n---\n# {{ summary }}\n"
                .to_string(),
            DEFAULT_ACTIVITIES_TEMPLATE.to_string(),
        )
        .unwrap();
        let temp_dir = TempDir::new().unwrap();
        let renderer = EventDocRenderer::new(&templates, temp_dir.path());

        assert_eq!(renderer.sync_event(&row("Lunch")).unwrap(), WriteOutcome::Created);

        let contents = fs::read_to_string(temp_dir.path().join("evt1.md")).unwrap();
        assert_eq!(
            contents,
            "---\ntitle: Lunch\ntags: [meeting]\ncalendar: Work\n---\n# Lunch"
        );
    }

    #[test]
    fn test_new_document_written_even_if_frontmatter_is_not_yaml() {
        let templates = Templates::new(
            "---\ntitle: {{ summary }}\n---\nbody\n".to_string(),
            DEFAULT_ACTIVITIES_TEMPLATE.to_string(),
        )
        .unwrap();
        let temp_dir = TempDir::new().unwrap();
        let renderer = EventDocRenderer::new(&templates, temp_dir.path());
        let path = temp_dir.path().join("evt1.md");

        assert_eq!(renderer.sync_event(&row("Sync: team")).unwrap(), WriteOutcome::Created);
        let created = fs::read_to_string(&path).unwrap();
        assert_eq!(created, "---\ntitle: Sync: team\n---\nbody");

        // The next sync cannot parse it and leaves it alone.
        let err = renderer.sync_event(&row("Sync: team")).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(fs::read_to_string(&path).unwrap(), created);
    }

    #[test]
    fn test_update_keeps_body_and_replaces_frontmatter() {
        let ctx = setup();
        let path = ctx.temp_dir.path().join("evt1.md");
        let body = "# My notes\n\nHand written.\n---\nnot frontmatter\n";
        fs::write(&path, format!("---\ntitle: Old\nextra: gone\n---\n{}", body)).unwrap();

        ctx.renderer().sync_event(&row("Renamed")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let (fm, rest) = frontmatter::parse(&contents).unwrap();
        assert_eq!(rest, body);
        assert_eq!(fm.get("title"), Some(&Value::String("Renamed".into())));
        assert!(fm.get("extra").is_none());
    }

    #[test]
    fn test_update_without_frontmatter_keeps_whole_text() {
        let ctx = setup();
        let path = ctx.temp_dir.path().join("evt1.md");
        fs::write(&path, "just notes\n").unwrap();

        ctx.renderer().sync_event(&row("Lunch")).unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with("---\ntitle: Lunch\n"));
        assert!(contents.ends_with("---\njust notes\n"));
    }

    #[test]
    fn test_malformed_frontmatter_left_untouched() {
        let ctx = setup();
        let path = ctx.temp_dir.path().join("evt1.md");
        let original = "---\ntitle: [unclosed\n---\nbody\n";
        fs::write(&path, original).unwrap();

        let err = ctx.renderer().sync_event(&row("Lunch")).unwrap_err();
        assert!(err.is_malformed());
        assert_eq!(fs::read_to_string(&path).unwrap(), original);
    }

    #[test]
    fn test_event_id_must_be_a_file_name() {
        let ctx = setup();
        let renderer = ctx.renderer();
        assert!(matches!(
            renderer.path_for("../escape"),
            Err(RenderError::InvalidEventId(_))
        ));
        assert!(renderer.path_for("").is_err());
        assert_eq!(
            renderer.path_for("abc123").unwrap(),
            ctx.temp_dir.path().join("abc123.md")
        );
    }
}
