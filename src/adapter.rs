//! Metric sample intake
//!
//! The external-facing edge of the pipeline: the host runtime delivers
//! batches of sample containers, each container becomes exactly one emitted
//! log record with its samples merged into a `metricKeyValues` sub-record.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::logger::{Level, Logger};
use crate::record::StructuredRecord;

/// One measured value delivered by the host runtime.
#[derive(Debug, Clone, Deserialize)]
pub struct MetricSample {
    pub name: String,
    pub value: f64,
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

/// A group of samples delivered together; the host may pack any number of
/// samples into one container.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SampleContainer {
    pub samples: Vec<MetricSample>,
}

/// Turns metric-sample batches into log records on an owned [`Logger`].
pub struct MetricAdapter {
    logger: Logger,
}

impl MetricAdapter {
    pub fn new(logger: Logger) -> Self {
        MetricAdapter { logger }
    }

    pub fn start(&self) {
        self.logger.start();
    }

    pub fn stop(&self) {
        self.logger.stop();
    }

    /// Emit one log record per container, stamped with the time of the
    /// container's first sample. Containers without samples are skipped.
    pub fn on_metric_batch(&self, containers: &[SampleContainer]) {
        for container in containers {
            let Some(first) = container.samples.first() else {
                continue;
            };
            let record = StructuredRecord::wrap(
                "metricKeyValues",
                StructuredRecord::from_samples(&container.samples),
            );
            let timestamp = first.time.unwrap_or_else(Utc::now);
            self.logger.emit_at(Level::Info, "metric sample", &record, timestamp);
        }
    }
}
