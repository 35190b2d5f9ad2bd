/// File logging via tracing.
///
/// The terminal belongs to the renderer, so log lines only ever go to
/// `<log_dir>/fire-and-water.log`. `RUST_LOG` overrides the default
/// `info` level.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

pub const LOG_FILE: &str = "fire-and-water.log";

/// Install the global subscriber. Returns the log file path.
pub fn setup_logging(log_dir: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("cannot create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_thread_names(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .try_init()
        .context("logging already initialized")?;

    // The writer thread must outlive main's return paths.
    std::mem::forget(guard);

    Ok(log_dir.join(LOG_FILE))
}
