use anyhow::{Context, Result};
use clap::Parser;
use std::io::{self, BufRead};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::{debug, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use loadlog::adapter::{MetricAdapter, SampleContainer};
use loadlog::config::{FileSinkConfig, LogConfig};

/// Emit line-delimited JSON metric records from sample batches on stdin.
///
/// Each input line is one sample container, e.g.
/// `{"samples":[{"name":"http_reqs","value":1}]}`.
#[derive(Parser, Debug)]
#[command(name = "loadlog", version, about = "Structured JSON metrics logger")]
struct Cli {
    /// Optional TOML config file; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Also write records to a rotating file at this path
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Maximum current-file size in megabytes before rotation
    #[arg(long)]
    max_size_mb: Option<u64>,

    /// Number of rotated files to keep
    #[arg(long)]
    max_backups: Option<usize>,

    /// Rotated files older than this many days are deleted
    #[arg(long)]
    max_age_days: Option<i64>,

    /// Serve sink self-instrumentation metrics at this address
    #[arg(long)]
    metrics_addr: Option<SocketAddr>,
}

/// Internal diagnostics go to stderr; stdout carries the record stream.
fn init_diagnostics() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("loadlog=info"));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

fn init_metrics(addr: SocketAddr) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .context("Failed to install Prometheus recorder")?;
    loadlog::observe::register_metrics();
    debug!("Prometheus exporter serving at http://{}/metrics", addr);
    Ok(())
}

fn resolve_config(args: &Cli) -> Result<LogConfig> {
    let mut config = match &args.config {
        Some(path) => LogConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => LogConfig::default(),
    };

    if let Some(path) = &args.log_file {
        let rotation = config.file.take().map(|f| f.rotation).unwrap_or_default();
        config.file = Some(FileSinkConfig {
            path: path.clone(),
            rotation,
        });
    }
    if let Some(file) = config.file.as_mut() {
        if let Some(v) = args.max_size_mb {
            file.rotation.max_size_mb = v;
        }
        if let Some(v) = args.max_backups {
            file.rotation.max_backups = v;
        }
        if let Some(v) = args.max_age_days {
            file.rotation.max_age_days = v;
        }
    }
    Ok(config)
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_diagnostics();

    if let Some(addr) = args.metrics_addr {
        init_metrics(addr)?;
    }

    let config = resolve_config(&args)?;
    let logger = config.build_logger().context("Failed to build logger")?;
    let adapter = MetricAdapter::new(logger);

    adapter.start();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read from stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<SampleContainer>(&line) {
            Ok(container) => adapter.on_metric_batch(std::slice::from_ref(&container)),
            Err(e) => warn!("skipping malformed sample batch: {}", e),
        }
    }
    adapter.stop();
    Ok(())
}
