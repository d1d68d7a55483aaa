use minijinja::Environment;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::models::EventRow;

pub const DEFAULT_EVENT_TEMPLATE: &str = include_str!("../../templates/event.md.j2");
pub const DEFAULT_ACTIVITIES_TEMPLATE: &str = include_str!("../../templates/activities.md.j2");

const TEMPLATE_NAME: &str = "document";

/// Compiled event and activities templates.
///
/// The activities environment trims block tags so that `{% for %}` lines do
/// not leave blank lines in the rendered list; the event template is rendered
/// as written.
pub struct Templates {
    event_env: Environment<'static>,
    activities_env: Environment<'static>,
}

impl Templates {
    pub fn new(event_source: String, activities_source: String) -> Result<Self, TemplateError> {
        let mut event_env = Environment::new();
        event_env
            .add_template_owned(TEMPLATE_NAME, event_source)
            .map_err(|e| TemplateError::Syntax("event", e))?;

        let mut activities_env = Environment::new();
        activities_env.set_trim_blocks(true);
        activities_env.set_lstrip_blocks(true);
        activities_env
            .add_template_owned(TEMPLATE_NAME, activities_source)
            .map_err(|e| TemplateError::Syntax("activities", e))?;

        Ok(Self {
            event_env,
            activities_env,
        })
    }

    #[cfg(test)]
    pub fn builtin() -> Result<Self, TemplateError> {
        Self::new(
            DEFAULT_EVENT_TEMPLATE.to_string(),
            DEFAULT_ACTIVITIES_TEMPLATE.to_string(),
        )
    }

    /// Load templates from disk, falling back to the built-in ones when unset.
    pub fn load(event: Option<&Path>, activities: Option<&Path>) -> Result<Self, TemplateError> {
        let event_source = match event {
            Some(path) => read_template(path)?,
            None => DEFAULT_EVENT_TEMPLATE.to_string(),
        };
        let activities_source = match activities {
            Some(path) => read_template(path)?,
            None => DEFAULT_ACTIVITIES_TEMPLATE.to_string(),
        };
        Self::new(event_source, activities_source)
    }

    /// Render a new event document from every column of the row.
    pub fn render_event(&self, row: &EventRow) -> Result<String, minijinja::Error> {
        self.event_env.get_template(TEMPLATE_NAME)?.render(row)
    }

    pub fn render_activities<S: Serialize>(&self, context: S) -> Result<String, minijinja::Error> {
        self.activities_env
            .get_template(TEMPLATE_NAME)?
            .render(context)
    }
}

fn read_template(path: &Path) -> Result<String, TemplateError> {
    std::fs::read_to_string(path).map_err(|e| TemplateError::Read(path.to_path_buf(), e))
}

#[derive(Debug)]
pub enum TemplateError {
    Read(PathBuf, std::io::Error),
    Syntax(&'static str, minijinja::Error),
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Read(path, e) => {
                write!(f, "Failed to read template '{}': {}", path.display(), e)
            }
            TemplateError::Syntax(which, e) => write!(f, "Invalid {} template: {}", which, e),
        }
    }
}

impl std::error::Error for TemplateError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TemplateError::Read(_, e) => Some(e),
            TemplateError::Syntax(_, e) => Some(e),
        }
    }
}
