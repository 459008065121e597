use crate::config::LoggingConfig;
use crate::error::Result;
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const LOG_FILE_PREFIX: &str = "fortune500.log";
const DEFAULT_FILTER: &str = "fortune500_dash=info,tower_http=info,warn";

/// Installs the global subscriber: JSON lines into a daily-rotated file under
/// `config.dir`, human-readable lines on stderr.
///
/// `RUST_LOG` replaces the default filter. Keep the returned guard alive
/// until exit or buffered file output is lost. Calling this twice leaves the
/// first subscriber in place.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.dir)?;

    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&config.dir, LOG_FILE_PREFIX));

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_writer(file_writer))
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .try_init();

    Ok(guard)
}
