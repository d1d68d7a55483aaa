//! YAML frontmatter between `---` marker lines.
//!
//! Keys keep their insertion order. Which string values are written as plain
//! (unquoted) scalars is decided per call by a [`ScalarStyle`], never by
//! shared serializer state.

use serde_yaml::{Mapping, Value};
use std::fmt;

pub const MARKER: &str = "---";

/// An ordered frontmatter mapping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frontmatter(Mapping);

impl Frontmatter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(Value::String(key.into()), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Keys whose string values are emitted unquoted whenever that round-trips.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScalarStyle<'a> {
    plain_keys: &'a [&'a str],
}

impl<'a> ScalarStyle<'a> {
    pub fn plain(keys: &'a [&'a str]) -> Self {
        Self { plain_keys: keys }
    }

    fn is_plain_key(&self, key: &Value) -> bool {
        key.as_str()
            .map(|key| self.plain_keys.contains(&key))
            .unwrap_or(false)
    }
}

/// Split a document into its frontmatter and body.
///
/// A document has frontmatter only when its first line is exactly `---` and a
/// later line is too. Otherwise the mapping is empty and the whole text is the
/// body. The body is returned verbatim.
pub fn parse(text: &str) -> Result<(Frontmatter, &str), FrontmatterError> {
    let Some((yaml, body)) = split_block(text) else {
        return Ok((Frontmatter::new(), text));
    };

    let value: Value = serde_yaml::from_str(yaml).map_err(FrontmatterError::Yaml)?;
    match value {
        Value::Null => Ok((Frontmatter::new(), body)),
        Value::Mapping(mapping) => Ok((Frontmatter(mapping), body)),
        _ => Err(FrontmatterError::NotAMapping),
    }
}

/// Locate the raw YAML block and the body after the closing marker line.
fn split_block(text: &str) -> Option<(&str, &str)> {
    let (first, mut rest) = next_line(text)?;
    if first != MARKER {
        return None;
    }

    let yaml_start = text.len() - rest.len();
    loop {
        let line_start = text.len() - rest.len();
        let (line, after) = next_line(rest)?;
        if line == MARKER {
            return Some((&text[yaml_start..line_start], after));
        }
        rest = after;
    }
}

/// Returns the line without its terminator and the text following it.
fn next_line(text: &str) -> Option<(&str, &str)> {
    if text.is_empty() {
        return None;
    }
    let (line, rest) = match text.find('\n') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    };
    Some((line.strip_suffix('\r').unwrap_or(line), rest))
}

/// Serialize the mapping as YAML lines (without markers).
pub fn serialize(frontmatter: &Frontmatter, style: &ScalarStyle) -> Result<String, FrontmatterError> {
    if frontmatter.is_empty() {
        return serde_yaml::to_string(&frontmatter.0).map_err(FrontmatterError::Yaml);
    }

    let mut out = String::new();
    for (key, value) in &frontmatter.0 {
        if style.is_plain_key(key) {
            if let (Some(key), Some(text)) = (key.as_str(), value.as_str()) {
                if is_plain_safe(text) {
                    out.push_str(&format!("{}: {}\n", key, text));
                    continue;
                }
            }
        }

        let mut entry = Mapping::new();
        entry.insert(key.clone(), value.clone());
        out.push_str(&serde_yaml::to_string(&entry).map_err(FrontmatterError::Yaml)?);
    }
    Ok(out)
}

/// Assemble marker + frontmatter + marker + body.
pub fn render_document(
    frontmatter: &Frontmatter,
    body: &str,
    style: &ScalarStyle,
) -> Result<String, FrontmatterError> {
    let yaml = serialize(frontmatter, style)?;
    Ok(format!("{MARKER}\n{yaml}{MARKER}\n{body}"))
}

/// True when `text` written unquoted reads back as the same string.
fn is_plain_safe(text: &str) -> bool {
    const INDICATORS: &[char] = &[
        '-', '?', ':', ',', '[', ']', '{', '}', '#', '&', '*', '!', '|', '>', '\'', '"', '%', '@',
        '`',
    ];

    let Some(first) = text.chars().next() else {
        return false;
    };
    if INDICATORS.contains(&first)
        || text.trim() != text
        || text.chars().any(char::is_control)
        || text.contains(": ")
        || text.contains(" #")
        || text.ends_with(':')
    {
        return false;
    }

    matches!(serde_yaml::from_str::<Value>(text), Ok(Value::String(s)) if s == text)
}

#[derive(Debug)]
pub enum FrontmatterError {
    Yaml(serde_yaml::Error),
    NotAMapping,
}

impl fmt::Display for FrontmatterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FrontmatterError::Yaml(e) => write!(f, "Invalid YAML frontmatter: {}", e),
            FrontmatterError::NotAMapping => {
                write!(f, "Frontmatter must be a mapping of keys to values")
            }
        }
    }
}

impl std::error::Error for FrontmatterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrontmatterError::Yaml(e) => Some(e),
            FrontmatterError::NotAMapping => None,
        }
    }
}
