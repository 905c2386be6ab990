//! Core data structures and types for CAT processing.
//!
//! Defines decoded field values, storage type tags, the two decoded
//! record shapes (tuple and map) and processing statistics.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// A single decoded field value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Blank numeric field
    Null,
    Text(String),
    Integer(i64),
    Decimal(f64),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Decimal(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => Ok(()),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Decimal(v) => write!(f, "{}", v),
        }
    }
}

/// Semantic storage type of a decoded field, used to type table columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StorageType {
    /// Text of at most `n` characters
    Text(usize),
    Int32,
    Int64,
    Float32,
    Float64,
}

impl StorageType {
    /// Check that a decoded value can be stored under this type
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null) => true,
            (StorageType::Text(_), FieldValue::Text(_)) => true,
            (StorageType::Int32, FieldValue::Integer(v)) => i32::try_from(*v).is_ok(),
            (StorageType::Int64, FieldValue::Integer(_)) => true,
            (StorageType::Float32 | StorageType::Float64, FieldValue::Decimal(_)) => true,
            _ => false,
        }
    }

    pub fn is_numeric(&self) -> bool {
        !matches!(self, StorageType::Text(_))
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Text(n) => write!(f, "text({})", n),
            StorageType::Int32 => f.write_str("int32"),
            StorageType::Int64 => f.write_str("int64"),
            StorageType::Float32 => f.write_str("float32"),
            StorageType::Float64 => f.write_str("float64"),
        }
    }
}

/// Decoded record as an ordered sequence of values
pub type RecordTuple = Vec<FieldValue>;

/// Decoded record as a name-keyed mapping that keeps schema order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMap {
    entries: Vec<(&'static str, FieldValue)>,
}

impl RecordMap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    pub(crate) fn push(&mut self, name: &'static str, value: FieldValue) {
        self.entries.push((name, value));
    }

    /// Look up a value by field name
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(field, _)| *field == name)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &FieldValue)> {
        self.entries.iter().map(|(name, value)| (*name, value))
    }

    /// Values in schema order, i.e. the tuple form of the same record
    pub fn into_tuple(self) -> RecordTuple {
        self.entries.into_iter().map(|(_, value)| value).collect()
    }
}

impl Serialize for RecordMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Processing statistics
#[derive(Debug, Default)]
pub struct ProcessingStats {
    pub files_processed: usize,
    pub files_failed: usize,
    pub total_records: usize,
    pub records_skipped: usize,
    pub outputs: Vec<PathBuf>,
    pub processing_time_ms: u128,
}
