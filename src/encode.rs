//! JSON line encoding
//!
//! Serializes one [`StructuredRecord`] per call into exactly one JSON object
//! terminated by a newline. Envelope fields (level, timestamp, message) come
//! first, followed by the record's fields in insertion order. Output is
//! append-only; previously emitted bytes are never touched.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::Result;
use crate::logger::Level;
use crate::record::StructuredRecord;

/// Render a timestamp as ISO-8601 in UTC with sub-second precision up to
/// nanoseconds, trailing zeros trimmed.
pub fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Encoding policy, immutable after logger construction.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    /// Envelope key for the uppercase level name.
    pub level_key: String,
    /// Envelope key for the ISO-8601 timestamp.
    pub timestamp_key: String,
    /// Envelope key for the log message.
    pub message_key: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        EncoderConfig {
            level_key: "level".to_string(),
            timestamp_key: "timestamp".to_string(),
            message_key: "message".to_string(),
        }
    }
}

/// Encoder for single-line JSON records.
#[derive(Debug, Clone, Default)]
pub struct JsonEncoder {
    config: EncoderConfig,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig) -> Self {
        JsonEncoder { config }
    }

    /// Encode one record. Repeated calls on identical inputs produce
    /// byte-identical output.
    pub fn encode(
        &self,
        record: &StructuredRecord,
        level: Level,
        message: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<Vec<u8>> {
        let envelope = Envelope {
            config: &self.config,
            level,
            timestamp: format_timestamp(timestamp),
            message,
            record,
        };
        let mut line = serde_json::to_vec(&envelope)?;
        line.push(b'\n');
        Ok(line)
    }
}

struct Envelope<'a> {
    config: &'a EncoderConfig,
    level: Level,
    timestamp: String,
    message: &'a str,
    record: &'a StructuredRecord,
}

impl Serialize for Envelope<'_> {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(3 + self.record.len()))?;
        map.serialize_entry(&self.config.level_key, self.level.as_str())?;
        map.serialize_entry(&self.config.timestamp_key, &self.timestamp)?;
        map.serialize_entry(&self.config.message_key, self.message)?;
        for (key, value) in self.record.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
