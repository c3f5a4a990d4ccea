//! Key/value entries stored at a node.

use once_cell::sync::Lazy;
use std::fmt;
use std::io::{self, Cursor, Read};
use std::str::FromStr;
use tracing::warn;

use super::metadata::Metadata;

static EMPTY: Lazy<Entry> = Lazy::new(|| Entry {
    key: "EMPTY".to_string(),
    value: EntryValue::Text("EMPTY".to_string()),
    metadata: Metadata::empty().clone(),
});

/// Value of an entry. Binary values survive the round trip through the
/// text-only backend via base64.
#[derive(Clone, PartialEq, Eq, Default)]
pub enum EntryValue {
    Text(String),
    Binary(Vec<u8>),
    #[default]
    Absent,
}

impl EntryValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, EntryValue::Absent)
    }

    fn kind(&self) -> &'static str {
        match self {
            EntryValue::Text(_) => "text",
            EntryValue::Binary(_) => "binary",
            EntryValue::Absent => "absent",
        }
    }
}

// Values are secrets; only their shape is printed.
impl fmt::Debug for EntryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryValue::Text(_) => write!(f, "Text([REDACTED])"),
            EntryValue::Binary(bytes) => write!(f, "Binary({} bytes)", bytes.len()),
            EntryValue::Absent => write!(f, "Absent"),
        }
    }
}

impl From<String> for EntryValue {
    fn from(value: String) -> Self {
        EntryValue::Text(value)
    }
}

impl From<&str> for EntryValue {
    fn from(value: &str) -> Self {
        EntryValue::Text(value.to_string())
    }
}

impl From<Vec<u8>> for EntryValue {
    fn from(value: Vec<u8>) -> Self {
        EntryValue::Binary(value)
    }
}

impl From<&[u8]> for EntryValue {
    fn from(value: &[u8]) -> Self {
        EntryValue::Binary(value.to_vec())
    }
}

impl<T: Into<EntryValue>> From<Option<T>> for EntryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(EntryValue::Absent, Into::into)
    }
}

/// One key/value pair with the metadata of the node it was read from.
///
/// Entries are immutable; [`Entry::with_value`] returns a modified copy.
/// Equality only considers key and value.
#[derive(Clone)]
pub struct Entry {
    key: String,
    value: EntryValue,
    metadata: Metadata,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl Eq for Entry {}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("metadata", &self.metadata)
            .finish()
    }
}

impl Default for Entry {
    fn default() -> Self {
        Self::empty()
    }
}

impl Entry {
    pub fn new(key: impl Into<String>, value: impl Into<EntryValue>, metadata: Metadata) -> Self {
        Self { key: key.into(), value: value.into(), metadata }
    }

    /// Entry with default metadata, e.g. for writing.
    pub fn of(key: impl Into<String>, value: impl Into<EntryValue>) -> Self {
        Self::new(key, value, Metadata::default())
    }

    /// Entry holding the bytes of `reader`; an empty stream yields an absent value.
    pub fn from_reader(key: impl Into<String>, reader: impl Read) -> io::Result<Self> {
        Ok(Self::of(key, read_all(reader)?))
    }

    /// Sentinel returned as payload when no real entry applies.
    pub fn empty() -> Self {
        EMPTY.clone()
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &EntryValue {
        &self.value
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Copy with a new value, keeping key and metadata.
    pub fn with_value(&self, value: impl Into<EntryValue>) -> Self {
        Self { key: self.key.clone(), value: value.into(), metadata: self.metadata.clone() }
    }

    /// Copy with the bytes of `reader` as value.
    pub fn with_value_from_reader(&self, reader: impl Read) -> io::Result<Self> {
        Ok(self.with_value(read_all(reader)?))
    }

    pub fn value_as_string(&self) -> Option<String> {
        match &self.value {
            EntryValue::Text(text) => Some(text.clone()),
            EntryValue::Binary(bytes) => match String::from_utf8(bytes.clone()) {
                Ok(text) => Some(text),
                Err(_) => {
                    warn!(key = %self.key, "Binary value is not valid UTF-8, no text available");
                    None
                }
            },
            EntryValue::Absent => None,
        }
    }

    /// `true` only for the text "true", ignoring case; any other text is `false`.
    pub fn value_as_bool(&self) -> Option<bool> {
        self.value_as_string().map(|text| text.eq_ignore_ascii_case("true"))
    }

    pub fn value_as_i32(&self) -> Option<i32> {
        self.parse_value("integer")
    }

    pub fn value_as_f64(&self) -> Option<f64> {
        self.parse_value("double")
    }

    pub fn value_as_f32(&self) -> Option<f32> {
        self.parse_value("float")
    }

    /// Stream over the value; text is streamed as UTF-8.
    pub fn value_as_reader(&self) -> Option<Box<dyn Read + Send>> {
        match &self.value {
            EntryValue::Text(text) => Some(Box::new(Cursor::new(text.clone().into_bytes()))),
            EntryValue::Binary(bytes) => Some(Box::new(Cursor::new(bytes.clone()))),
            EntryValue::Absent => None,
        }
    }

    fn parse_value<T: FromStr>(&self, type_name: &str) -> Option<T> {
        let text = self.value_as_string()?;
        match text.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(
                    key = %self.key,
                    kind = self.value.kind(),
                    target_type = type_name,
                    "Unable to parse entry value"
                );
                None
            }
        }
    }
}

fn read_all(mut reader: impl Read) -> io::Result<EntryValue> {
    let mut bytes = Vec::new();
    reader.read_to_end(&mut bytes)?;
    Ok(if bytes.is_empty() { EntryValue::Absent } else { EntryValue::Binary(bytes) })
}
