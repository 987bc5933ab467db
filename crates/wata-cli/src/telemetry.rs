//! Tracing setup
//!
//! Console output goes to stderr through `fmt` (pretty or JSON) so command
//! results on stdout stay machine-readable. When a log path is
//! configured, events at `ERROR` are additionally written as JSON to a daily
//! file under `<path>/error/`.

use anyhow::Context;
use std::path::Path;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingConfig};

/// Keeps the error-file writer alive; dropping it flushes pending lines
#[must_use = "dropping the telemetry guard stops the error log writer"]
pub struct Telemetry {
    _error_guard: Option<WorkerGuard>,
}

impl Telemetry {
    /// Flush and close the error log
    pub fn shutdown(self) {}
}

/// Install the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<Telemetry> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    let console = match config.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_target(true)
            .with_writer(std::io::stderr)
            .boxed(),
    };

    let (error_layer, error_guard) = match &config.path {
        Some(path) => {
            let (layer, guard) = error_file_layer(path)?;
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(error_layer)
        .with(console.with_filter(env_filter))
        .try_init()
        .context("failed to install tracing subscriber")?;

    Ok(Telemetry {
        _error_guard: error_guard,
    })
}

type BoxedLayer = Box<dyn Layer<tracing_subscriber::Registry> + Send + Sync>;

fn error_file_layer(root: &Path) -> anyhow::Result<(BoxedLayer, WorkerGuard)> {
    let dir = root.join("error");
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("error")
        .filename_suffix("log")
        .build(&dir)
        .context("failed to open error log")?;
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(LevelFilter::ERROR)
        .boxed();

    Ok((layer, guard))
}
