use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{LogError, Result};
use crate::logger::Logger;
use crate::sink::{ConsoleSink, RotatingFileSink, RotationConfig, SinkSet};

fn default_console() -> bool {
    true
}

/// Logger configuration, loadable from TOML.
///
/// The host constructs and wires the pipeline from this explicitly; nothing
/// registers itself at load time.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// Emit records to standard output (default true).
    #[serde(default = "default_console")]
    pub console: bool,
    /// Optional rotating-file sink.
    #[serde(default)]
    pub file: Option<FileSinkConfig>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            console: true,
            file: None,
        }
    }
}

/// Rotating-file sink settings. Rotation fields are optional and fall back
/// to their documented defaults when omitted.
#[derive(Debug, Clone, Deserialize)]
pub struct FileSinkConfig {
    /// Path of the current log file.
    pub path: PathBuf,
    #[serde(flatten)]
    pub rotation: RotationConfig,
}

impl LogConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            LogError::Config(format!(
                "Failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Build a logger with the configured sink set.
    pub fn build_logger(&self) -> Result<Logger> {
        let mut sinks = SinkSet::new();
        if self.console {
            sinks.push(Arc::new(ConsoleSink::new()));
        }
        if let Some(file) = &self.file {
            sinks.push(Arc::new(RotatingFileSink::open(
                &file.path,
                file.rotation.clone(),
            )?));
        }
        Ok(Logger::new(sinks))
    }
}
