use color_eyre::Result;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::APP_ID;

/// File layer (non-blocking, everything the filter lets through) plus a
/// console layer on stderr for warnings and errors only.
///
/// `RUST_LOG` wins over the configured `log_level`. Keep the returned guard
/// alive until exit or buffered lines are lost.
pub fn init(config: &Config) -> Result<WorkerGuard> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)?,
    };

    // <logs_dir>/desk.log
    let file_appender =
        tracing_appender::rolling::never(&config.logs_dir, format!("{APP_ID}.log"));
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::Layer::default()
        .with_target(false)
        .with_ansi(false)
        .with_writer(non_blocking);

    let console_level = LevelFilter::WARN;
    let console_layer = fmt::Layer::default()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(filter_fn(move |metadata| metadata.level() <= &console_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()?;

    Ok(guard)
}
