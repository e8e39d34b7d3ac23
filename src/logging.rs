use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE: &str = "gtasks.log";

/// Get the default log directory.
pub fn default_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir().ok_or_else(|| eyre!("Could not determine data directory"))?;
  Ok(data_dir.join("gtasks").join("logs"))
}

/// Install the global subscriber.
///
/// Everything goes to a daily rolling file. `RUST_LOG` overrides the level,
/// which is `info` or `debug` with `--debug`. With `--debug` the same
/// events are also written to stderr. Keep the guard alive until exit so
/// buffered lines get flushed.
pub fn init(dir: &Path, debug: bool) -> Result<WorkerGuard> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE);
  let (writer, guard) = tracing_appender::non_blocking(file_appender);

  let level = if debug { "debug" } else { "info" };
  let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

  let file_layer = fmt::layer()
    .with_writer(writer)
    .with_ansi(false)
    .with_filter(filter());

  let stderr_layer = debug.then(|| {
    fmt::layer()
      .with_writer(std::io::stderr)
      .with_target(false)
      .with_filter(filter())
  });

  tracing_subscriber::registry()
    .with(file_layer)
    .with(stderr_layer)
    .try_init()
    .map_err(|e| eyre!("Failed to initialize logging: {}", e))?;

  Ok(guard)
}
