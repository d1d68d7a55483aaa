//! Markdown documents: frontmatter codec, section splitting and safe writes.

pub mod document;
pub mod frontmatter;
pub mod sections;

pub use document::{write_atomic, DocumentState};
pub use frontmatter::{Frontmatter, FrontmatterError, ScalarStyle};
pub use sections::JournalSections;
