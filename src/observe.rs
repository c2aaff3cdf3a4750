//! Sink self-instrumentation
//!
//! Counters and gauges for sink health, recorded on the `metrics` facade.
//! A recorder installed by the host (for example the Prometheus exporter the
//! bundled binary wires up) picks these up; without one the macros are
//! no-ops.

use metrics::{counter, describe_counter, describe_gauge, gauge};

pub const WRITES_SUCCESS_TOTAL: &str = "loadlog_sink_writes_success_total";
pub const WRITES_ERROR_TOTAL: &str = "loadlog_sink_writes_error_total";
pub const WRITE_BYTES_TOTAL: &str = "loadlog_sink_write_bytes_total";
pub const ROTATIONS_TOTAL: &str = "loadlog_sink_rotations_total";
pub const CURRENT_FILE_BYTES: &str = "loadlog_sink_current_file_bytes";

/// Record a successful sink write.
pub fn record_write_success(bytes: usize) {
    counter!(WRITES_SUCCESS_TOTAL).increment(1);
    counter!(WRITE_BYTES_TOTAL).increment(bytes as u64);
}

/// Record a failed sink write.
pub fn record_write_error() {
    counter!(WRITES_ERROR_TOTAL).increment(1);
}

/// Record a completed file rotation.
pub fn record_rotation() {
    counter!(ROTATIONS_TOTAL).increment(1);
}

/// Record the current size of the active log file.
pub fn record_current_file_size(size: u64) {
    gauge!(CURRENT_FILE_BYTES).set(size as f64);
}

/// Register all metrics with descriptions. Called once at startup by hosts
/// that install a recorder, so naming conflicts surface early.
pub fn register_metrics() {
    describe_counter!(
        WRITES_SUCCESS_TOTAL,
        "Total number of successful sink writes"
    );
    describe_counter!(WRITES_ERROR_TOTAL, "Total number of failed sink writes");
    describe_counter!(WRITE_BYTES_TOTAL, "Total bytes written through sinks");
    describe_counter!(ROTATIONS_TOTAL, "Total number of log file rotations");
    describe_gauge!(
        CURRENT_FILE_BYTES,
        "Current size of the active log file in bytes"
    );
}
