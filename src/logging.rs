//! File logging. The terminal belongs to the UI, so nothing is written to
//! stdout or stderr while it runs.

use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Env var holding the log filter, e.g. `siteadmin=debug`
pub const LOG_ENV: &str = "SITEADMIN_LOG";

/// Default log directory: `<data dir>/siteadmin/logs`
pub fn log_dir() -> PathBuf {
  dirs::data_dir()
    .unwrap_or_else(std::env::temp_dir)
    .join("siteadmin")
    .join("logs")
}

/// Install a daily-rolling file subscriber.
///
/// Keep the returned guard alive for the whole process; dropping it flushes
/// and stops the background writer.
pub fn init(dir: Option<PathBuf>) -> Result<WorkerGuard> {
  let dir = dir.unwrap_or_else(log_dir);
  std::fs::create_dir_all(&dir)
    .map_err(|e| eyre!("Failed to create log directory {}: {}", dir.display(), e))?;

  let appender = tracing_appender::rolling::daily(&dir, "siteadmin.log");
  let (writer, guard) = tracing_appender::non_blocking(appender);

  let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

  tracing_subscriber::registry()
    .with(filter)
    .with(
      tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false),
    )
    .try_init()
    .map_err(|e| eyre!("Failed to install log subscriber: {}", e))?;

  Ok(guard)
}
