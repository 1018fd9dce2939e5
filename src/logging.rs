use std::fs::OpenOptions;
use std::io::{self, BufWriter};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{self, EnvFilter, util::SubscriberInitExt};

/// Opaque holder for the writer guards returned to main.
#[derive(Debug, Default)]
pub struct Guard {
    _inner: Vec<WorkerGuard>,
}

fn log_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("could not determine a local data directory")?;
    Ok(base.join("hoist").join("logs"))
}

/// Sends events to a dated file under the platform data directory; `verbose`
/// mirrors them to stderr. The returned guard must live until exit so the
/// non-blocking writers flush.
pub fn init(verbose: bool) -> Result<(Guard, PathBuf)> {
    let dir = log_dir()?;
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("failed to create log directory {}", dir.display()))?;

    // One file per day; appending keeps runs from the same day together.
    let log_path = dir.join(format!("hoist-{}.log", chrono::Local::now().format("%Y%m%d")));

    let (file_writer, file_guard) = tracing_appender::non_blocking(BufWriter::new(
        OpenOptions::new()
            .append(true)
            .create(true)
            .open(&log_path)
            .with_context(|| format!("failed to open log file {}", log_path.display()))?,
    ));

    let mut guards = vec![file_guard];

    let stderr_layer = verbose.then(|| {
        let (stderr_writer, stderr_guard) = tracing_appender::non_blocking(io::stderr());
        guards.push(stderr_guard);
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_writer(stderr_writer)
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("hoist=debug")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(file_writer),
        )
        .with(stderr_layer)
        .try_init()?;

    Ok((Guard { _inner: guards }, log_path))
}
