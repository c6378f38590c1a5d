//! `tracing` subscriber setup

use crate::config::{LogRotation, LoggingOptions};
use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::OnceLock;
use tracing_appender::non_blocking::{NonBlocking, NonBlockingBuilder, WorkerGuard};
use tracing_appender::rolling;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

/// Environment variable that overrides the configured level
pub const LEVEL_ENV: &str = "SOCIALQR_LOG_LEVEL";

static FILE_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// Install the global subscriber: stderr always, plus the log file when configured.
///
/// Stdout is left to command output. Later calls are no-ops.
pub fn init(options: &LoggingOptions) -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let filter = level_filter(options)?;

    let mut sinks: Vec<BoxedLayer> = vec![
        fmt::layer()
            .with_timer(UtcTime::rfc_3339())
            .with_writer(io::stderr)
            .with_ansi(options.color)
            .boxed(),
    ];

    if let Some(path) = options.file.as_deref() {
        let (writer, guard) = file_writer(path, options.rotation)?;
        let _ = FILE_GUARD.set(guard);
        sinks.push(
            fmt::layer()
                .with_timer(UtcTime::rfc_3339())
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry()
        .with(sinks.with_filter(filter))
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to install tracing subscriber: {e}")))
}

fn level_filter(options: &LoggingOptions) -> Result<EnvFilter> {
    let level = std::env::var(LEVEL_ENV).unwrap_or_else(|_| options.level.clone());
    EnvFilter::try_new(level.as_str())
        .map_err(|e| Error::Config(format!("Invalid log level '{level}': {e}")))
}

/// Non-blocking writer appending to `path`, rolled over when `rotation` is set
fn file_writer(path: &Path, rotation: Option<LogRotation>) -> Result<(NonBlocking, WorkerGuard)> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Config(format!("Failed to create log directory {}: {e}", dir.display())))?;

    let builder = NonBlockingBuilder::default().lossy(false);
    let Some(rotation) = rotation else {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .map_err(|e| Error::Config(format!("Failed to open log file {}: {e}", path.display())))?;
        return Ok(builder.finish(file));
    };

    let file_name = path.file_name().ok_or_else(|| {
        Error::Config(format!(
            "Log file path '{}' needs a file name for rotation",
            path.display()
        ))
    })?;
    let appender = match rotation {
        LogRotation::Hourly => rolling::hourly(dir, file_name),
        LogRotation::Daily => rolling::daily(dir, file_name),
    };
    Ok(builder.finish(appender))
}
