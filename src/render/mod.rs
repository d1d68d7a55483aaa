//! Render event rows into Markdown: one document per event, one journal per day.

pub mod event_doc;
pub mod journal;
pub mod templates;

use std::fmt;
use std::io;
use std::path::PathBuf;

use crate::markdown::FrontmatterError;

pub use event_doc::EventDocRenderer;
pub use journal::JournalRenderer;
pub use templates::{TemplateError, Templates};

/// What a successful render did to the file on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
}

impl fmt::Display for WriteOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteOutcome::Created => write!(f, "created"),
            WriteOutcome::Updated => write!(f, "updated"),
        }
    }
}

#[derive(Debug)]
pub enum RenderError {
    Io(PathBuf, io::Error),
    Template(minijinja::Error),
    /// Existing document has frontmatter that does not parse
    Frontmatter(PathBuf, FrontmatterError),
    /// Existing journal has no Activities heading
    MissingHeading(PathBuf),
    /// Neither the local nor the ISO column of a row holds a usable time
    Timestamp { event_id: String, column: String },
    InvalidEventId(String),
}

impl RenderError {
    /// Malformed documents are skipped and left untouched; everything else
    /// counts as a failure.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            RenderError::Frontmatter(..) | RenderError::MissingHeading(_)
        )
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderError::Io(path, e) => write!(f, "I/O error on '{}': {}", path.display(), e),
            RenderError::Template(e) => write!(f, "Template error: {}", e),
            RenderError::Frontmatter(path, e) => {
                write!(f, "Malformed frontmatter in '{}': {}", path.display(), e)
            }
            RenderError::MissingHeading(path) => write!(
                f,
                "'{}' has no '{}' heading",
                path.display(),
                crate::markdown::sections::ACTIVITIES_HEADING
            ),
            RenderError::Timestamp { event_id, column } => {
                write!(f, "Event '{}' has no usable '{}' time", event_id, column)
            }
            RenderError::InvalidEventId(id) => {
                write!(f, "Event id '{}' cannot be used as a file name", id)
            }
        }
    }
}

impl std::error::Error for RenderError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RenderError::Io(_, e) => Some(e),
            RenderError::Template(e) => Some(e),
            RenderError::Frontmatter(_, e) => Some(e),
            _ => None,
        }
    }
}

impl From<minijinja::Error> for RenderError {
    fn from(e: minijinja::Error) -> Self {
        RenderError::Template(e)
    }
}
