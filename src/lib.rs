pub mod adapter;
pub mod config;
pub mod encode;
pub mod error;
pub mod logger;
pub mod observe;
pub mod record;
pub mod sink;

pub use adapter::{MetricAdapter, MetricSample, SampleContainer};
pub use config::{FileSinkConfig, LogConfig};
pub use encode::{EncoderConfig, JsonEncoder};
pub use error::{LogError, Result};
pub use logger::{Level, Logger};
pub use record::{FieldValue, StructuredRecord};
pub use sink::{ConsoleSink, RotatingFileSink, RotationConfig, Sink, SinkSet};
