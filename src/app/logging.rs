use crate::config::LogConfig;
use crate::{Error, Result};
use rolling_file::{BasicRollingFileAppender, RollingConditionBasic};
use std::fs;
use std::path::Path;
use tracing::Dispatch;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Console + size-rotated file subscriber for one run. Hand `dispatch` to
/// `tracing::dispatcher::with_default`; keep the value alive until the run
/// ends or buffered file lines are lost.
pub struct Logging {
    pub dispatch: Dispatch,
    _file_guard: WorkerGuard,
}

pub fn build(config: &LogConfig) -> Result<Logging> {
    fs::create_dir_all(&config.dir)
        .map_err(|err| Error::config(format!("log dir {} create failed: {err}", config.dir)))?;
    // The live file rolls to `<file>.1`, `<file>.2` ... once it reaches max_bytes.
    let appender = BasicRollingFileAppender::new(
        Path::new(&config.dir).join(&config.file),
        RollingConditionBasic::new().max_size(config.max_bytes),
        config.max_files,
    )
    .map_err(|err| Error::config(format!("log file init failed: {err}")))?;
    let (file_writer, file_guard) = tracing_appender::non_blocking(appender);

    let console_layer = match log_format().as_str() {
        "json" => fmt::layer()
            .json()
            .with_target(false)
            .with_filter(env_filter())
            .boxed(),
        _ => fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(env_filter())
            .boxed(),
    };
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_filter(env_filter());

    let subscriber = tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer);

    Ok(Logging {
        dispatch: Dispatch::new(subscriber),
        _file_guard: file_guard,
    })
}

fn env_filter() -> EnvFilter {
    let override_level = std::env::var("FIRSTFILL_LOG")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| std::env::var("RUST_LOG").ok());

    match override_level {
        Some(value) => EnvFilter::new(value),
        None => EnvFilter::new("info"),
    }
}

fn log_format() -> String {
    std::env::var("FIRSTFILL_LOG_FORMAT")
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| "plain".to_string())
}
