//! Locate sections of a journal body by literal marker search.
//!
//! Matching is first-occurrence substring search, not a Markdown parse: the
//! journal body is user-authored and has no schema beyond these markers.

pub const ACTIVITIES_HEADING: &str = "## Activities";
pub const GOAL_HEADING: &str = "## Goal";
pub const SETTINGS_MARKER: &str = "%% kanban:settings";

/// Split `body` after the first occurrence of `heading`.
///
/// The first part runs through the end of the heading's line, including its
/// newline when there is one. Returns `None` when the heading is absent.
pub fn split_at_heading<'a>(body: &'a str, heading: &str) -> Option<(&'a str, &'a str)> {
    let start = body.find(heading)?;
    let heading_end = start + heading.len();
    let split = match body[heading_end..].find('\n') {
        Some(offset) => heading_end + offset + 1,
        None => body.len(),
    };
    Some(body.split_at(split))
}

/// A journal body cut into the regions the merge cares about.
///
/// `preamble + activities + trailing` always reconstructs the original body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JournalSections<'a> {
    /// Everything through the Activities heading line
    pub preamble: &'a str,
    /// The system-owned span, replaced on every sync
    pub activities: &'a str,
    /// Goal section and/or settings block, preserved verbatim
    pub trailing: &'a str,
}

impl<'a> JournalSections<'a> {
    pub fn locate(body: &'a str) -> Option<Self> {
        let (preamble, rest) = split_at_heading(body, ACTIVITIES_HEADING)?;

        // Each marker region runs to end of document; the earliest one wins.
        let trailing_start = [rest.find(GOAL_HEADING), rest.find(SETTINGS_MARKER)]
            .into_iter()
            .flatten()
            .min()
            .unwrap_or(rest.len());

        let (activities, trailing) = rest.split_at(trailing_start);
        Some(Self {
            preamble,
            activities,
            trailing,
        })
    }
}
