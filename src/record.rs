//! Decoded scan records
//!
//! A [`ScanRecord`] maps field ids to [`FieldValue`]s and keeps insertion
//! order, so the JSON written for a sheet lists fields in the same order as
//! the schema (with the derived `match`/`pos` keys moved to the front).

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

/// One decoded value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Boolean(bool),
    Null,
    List(Vec<String>),
    /// Header to marked options, in header order
    Map(OrderedLists),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Display form used in crop file names
    pub fn to_label(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Integer(n) => n.to_string(),
            FieldValue::Boolean(b) => b.to_string(),
            FieldValue::Null => String::new(),
            FieldValue::List(items) => items.join("+"),
            FieldValue::Map(_) => String::new(),
        }
    }
}

impl From<String> for FieldValue {
    fn from(text: String) -> Self {
        FieldValue::Text(text)
    }
}

impl From<&str> for FieldValue {
    fn from(text: &str) -> Self {
        FieldValue::Text(text.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Boolean(b)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Ordered string → list-of-strings mapping
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OrderedLists(Vec<(String, Vec<String>)>);

impl OrderedLists {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, values: Vec<String>) {
        self.0.push((key.into(), values));
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for OrderedLists {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (key, values) in &self.0 {
            map.serialize_entry(key, values)?;
        }
        map.end()
    }
}

/// Field id → value, in insertion order
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScanRecord {
    entries: Vec<(String, FieldValue)>,
}

impl ScanRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Replacing keeps the original position.
    pub fn insert(&mut self, id: impl Into<String>, value: impl Into<FieldValue>) {
        let id = id.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == id) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((id, value)),
        }
    }

    pub fn get(&self, id: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == id).map(|(_, v)| v)
    }

    pub fn remove(&mut self, id: &str) -> Option<FieldValue> {
        let index = self.entries.iter().position(|(k, _)| k == id)?;
        Some(self.entries.remove(index).1)
    }

    /// Move the given ids to the front, in the order listed. Missing ids are skipped.
    pub fn move_to_front(&mut self, ids: &[&str]) {
        let mut front = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(index) = self.entries.iter().position(|(k, _)| k == id) {
                front.push(self.entries.remove(index));
            }
        }
        front.append(&mut self.entries);
        self.entries = front;
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Serialize for ScanRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

/// Alliance station encoded in the last digit of the match field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Red1,
    Red2,
    Red3,
    Blue1,
    Blue2,
    Blue3,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::Red1,
        Position::Red2,
        Position::Red3,
        Position::Blue1,
        Position::Blue2,
        Position::Blue3,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Position::Red1 => "Red 1",
            Position::Red2 => "Red 2",
            Position::Red3 => "Red 3",
            Position::Blue1 => "Blue 1",
            Position::Blue2 => "Blue 2",
            Position::Blue3 => "Blue 3",
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
