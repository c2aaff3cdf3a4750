//! Leveled record emission and pipeline lifecycle.

use chrono::{DateTime, Utc};
use std::fmt;
use tracing::warn;

use crate::encode::{EncoderConfig, JsonEncoder};
use crate::record::StructuredRecord;
use crate::sink::SinkSet;

/// Log severity, rendered as an uppercase word in encoded output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binds an encoder and a sink set into an emission API.
///
/// Lifecycle runs `start` then any number of `emit` calls then `stop`; there
/// is no transition back after `stop`. `start` is not idempotent: calling it
/// twice writes two startup records. Emitting before `start` works, since
/// sinks exist from construction, but no started marker precedes those lines.
pub struct Logger {
    encoder: JsonEncoder,
    sinks: SinkSet,
    min_level: Level,
}

impl Logger {
    /// Construct with the default encoding policy and a minimum level of
    /// `Debug` so nothing is filtered.
    pub fn new(sinks: SinkSet) -> Self {
        Self::with_encoder(EncoderConfig::default(), sinks)
    }

    pub fn with_encoder(config: EncoderConfig, sinks: SinkSet) -> Self {
        Logger {
            encoder: JsonEncoder::new(config),
            sinks,
            min_level: Level::Debug,
        }
    }

    /// Announce readiness with a startup record.
    pub fn start(&self) {
        self.emit(Level::Info, "metrics logger started", &StructuredRecord::new());
    }

    /// Encode one record and write it through every sink.
    ///
    /// Sink write failures are swallowed here; logging never aborts the
    /// caller's workload. The worst case on total sink failure is the silent
    /// loss of this one line.
    pub fn emit(&self, level: Level, message: &str, record: &StructuredRecord) {
        self.emit_at(level, message, record, Utc::now());
    }

    /// Like [`Logger::emit`] with an explicit timestamp, for callers that
    /// stamp records with an externally observed time.
    pub fn emit_at(
        &self,
        level: Level,
        message: &str,
        record: &StructuredRecord,
        timestamp: DateTime<Utc>,
    ) {
        if level < self.min_level {
            return;
        }
        let line = match self.encoder.encode(record, level, message, timestamp) {
            Ok(line) => line,
            Err(e) => {
                warn!("failed to encode log record: {}", e);
                return;
            }
        };
        if let Err(e) = self.sinks.write(&line) {
            warn!("log write failed: {}", e);
        }
    }

    /// Flush every sink, then write a shutdown record.
    ///
    /// Must run before process exit; sinks may hold buffered bytes and
    /// trailing lines are lost otherwise.
    pub fn stop(&self) {
        if let Err(e) = self.sinks.flush() {
            warn!("log flush failed: {}", e);
        }
        self.emit(Level::Info, "metrics logger stopped", &StructuredRecord::new());
        if let Err(e) = self.sinks.flush() {
            warn!("log flush failed: {}", e);
        }
    }
}
