use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Cow;

/// A single column value read from the store. NULL is stored as empty text.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Real(f64),
}

impl CellValue {
    pub fn empty() -> Self {
        CellValue::Text(String::new())
    }

    /// Text form used when a value is spliced into Markdown.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            CellValue::Text(s) => Cow::Borrowed(s),
            CellValue::Integer(i) => Cow::Owned(i.to_string()),
            CellValue::Real(f) => Cow::Owned(f.to_string()),
        }
    }

    pub fn to_yaml(&self) -> serde_yaml::Value {
        match self {
            CellValue::Text(s) => serde_yaml::Value::String(s.clone()),
            CellValue::Integer(i) => serde_yaml::Value::Number((*i).into()),
            CellValue::Real(f) => serde_yaml::Value::Number((*f).into()),
        }
    }

    /// Convert a frontmatter value back into a storable cell.
    pub fn from_yaml(value: &serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Null => CellValue::empty(),
            serde_yaml::Value::Bool(b) => CellValue::Integer(i64::from(*b)),
            serde_yaml::Value::Number(n) => match n.as_i64() {
                Some(i) => CellValue::Integer(i),
                None => CellValue::Real(n.as_f64().unwrap_or_default()),
            },
            serde_yaml::Value::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(
                serde_yaml::to_string(other)
                    .map(|s| s.trim_end().to_string())
                    .unwrap_or_default(),
            ),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<i64> for CellValue {
    fn from(value: i64) -> Self {
        CellValue::Integer(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Real(value)
    }
}

/// One row of the events table, columns in table order.
///
/// Renderers read rows through this type rather than [`super::Event`] so that
/// user-added annotation columns reach templates and frontmatter too.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventRow {
    columns: Vec<(String, CellValue)>,
}

impl EventRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<CellValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<CellValue>) {
        let column = column.into();
        let value = value.into();
        match self.columns.iter_mut().find(|(name, _)| *name == column) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// Column value as text; missing columns read as empty.
    pub fn text(&self, column: &str) -> Cow<'_, str> {
        self.get(column)
            .map(CellValue::as_text)
            .unwrap_or(Cow::Borrowed(""))
    }

    pub fn event_id(&self) -> Cow<'_, str> {
        self.text("event_id")
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &CellValue)> {
        self.columns.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Serialize for EventRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, value) in &self.columns {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
