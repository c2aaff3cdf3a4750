//! Structured record construction
//!
//! A [`StructuredRecord`] is the unit of work of the whole pipeline: an
//! insertion-ordered mapping from field name to typed value, built from either
//! an alternating key/value list or a batch of metric samples, encoded once
//! and then discarded.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::adapter::MetricSample;
use crate::encode::format_timestamp;

/// A single typed field value.
///
/// Encoding is exhaustive over these variants; `Opaque` is the explicit
/// best-effort arm for values that do not fit the primitive shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Int(i64),
    Float(f64),
    Text(String),
    Record(StructuredRecord),
    Opaque(serde_json::Value),
}

impl FieldValue {
    /// Convert any serializable value into an opaque field.
    ///
    /// A value that cannot be represented as JSON degrades to a text
    /// placeholder instead of failing the surrounding record.
    pub fn opaque<T: Serialize>(value: &T) -> FieldValue {
        match serde_json::to_value(value) {
            Ok(v) => FieldValue::Opaque(v),
            Err(_) => FieldValue::Text("<unencodable>".to_string()),
        }
    }

    fn as_key(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        FieldValue::Int(v as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Float(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        FieldValue::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        FieldValue::Text(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Opaque(serde_json::Value::Bool(v))
    }
}

impl From<StructuredRecord> for FieldValue {
    fn from(v: StructuredRecord) -> Self {
        FieldValue::Record(v)
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(v: serde_json::Value) -> Self {
        FieldValue::Opaque(v)
    }
}

impl Serialize for FieldValue {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            FieldValue::Int(v) => serializer.serialize_i64(*v),
            FieldValue::Float(v) => serializer.serialize_f64(*v),
            FieldValue::Text(v) => serializer.serialize_str(v),
            FieldValue::Record(v) => v.serialize(serializer),
            FieldValue::Opaque(v) => v.serialize(serializer),
        }
    }
}

/// An ordered field-name to value mapping representing one log event.
///
/// Field names are unique within one record; inserting an existing key
/// replaces the value in place without changing the key's position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StructuredRecord {
    fields: Vec<(String, FieldValue)>,
}

impl StructuredRecord {
    pub fn new() -> Self {
        StructuredRecord { fields: Vec::new() }
    }

    /// Insert a field, last-wins on duplicate keys.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterate fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a record from a flat alternating key/value list.
    ///
    /// Even-indexed elements act as field names and must be text; a pair
    /// whose key is not text is dropped, as is a trailing key with no
    /// paired value. Neither case is an error.
    pub fn from_pairs(pairs: &[FieldValue]) -> StructuredRecord {
        let mut record = StructuredRecord::new();
        for pair in pairs.chunks_exact(2) {
            let key = match pair[0].as_key() {
                Some(key) => key,
                None => continue,
            };
            record.insert(key, pair[1].clone());
        }
        record
    }

    /// Build a record from a batch of metric samples.
    ///
    /// Each metric name maps to its stringified value, last-wins when a name
    /// repeats. A sample carrying a timestamp contributes a `time` field and
    /// a sample carrying tags contributes a `tags` sub-record.
    pub fn from_samples(samples: &[MetricSample]) -> StructuredRecord {
        let mut record = StructuredRecord::new();
        for sample in samples {
            record.insert(sample.name.clone(), format!("{}", sample.value));
            if let Some(time) = sample.time {
                record.insert("time", format_timestamp(time));
            }
            if !sample.tags.is_empty() {
                let mut tags = StructuredRecord::new();
                for (key, value) in &sample.tags {
                    tags.insert(key.clone(), value.clone());
                }
                record.insert("tags", tags);
            }
        }
        record
    }

    /// Wrap a record as a single named nested field, for embedding in a
    /// larger log call.
    pub fn wrap(name: impl Into<String>, record: StructuredRecord) -> StructuredRecord {
        let mut outer = StructuredRecord::new();
        outer.insert(name, record);
        outer
    }
}

impl Serialize for StructuredRecord {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
