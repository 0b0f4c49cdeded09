//! Logging bootstrap for VacationStay.
//!
//! Every crate logs through `tracing`. The binary calls [`init_from_config`]
//! once at startup; tests and tools can use [`init`].

use std::str::FromStr;

use tracing::{error, info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use vacationstay_config::LoggingConfig;

/// Initialize the tracing subscriber at INFO.
///
/// ```
/// use vacationstay_common::logging;
///
/// logging::init();
/// ```
pub fn init() {
    init_with_level(Level::INFO);
}

/// Initialize a stdout-only subscriber at `level`.
pub fn init_with_level(level: Level) {
    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(filter_for(level))
        .try_init();

    // try_init fails when a global subscriber is already set; that is fine.
    if result.is_ok() {
        info!("Logging initialized at level: {}", level);
    }
}

/// Initialize logging from the `[logging]` config section.
///
/// Adds a daily rolling file when `directory` is set and a journald layer when
/// `journald` is true (Linux only). The returned guard flushes the file writer
/// and must be kept alive for the lifetime of the process.
pub fn init_from_config(config: &LoggingConfig) -> Option<WorkerGuard> {
    let level = config
        .level
        .as_deref()
        .and_then(|l| Level::from_str(l).ok())
        .unwrap_or(Level::INFO);

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "vacationstay.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    #[cfg(target_os = "linux")]
    let journald_layer = if config.journald {
        match tracing_journald::layer() {
            Ok(layer) => Some(layer.with_syslog_identifier("vacationstay".to_string())),
            Err(e) => {
                eprintln!("journald unavailable, continuing without it: {}", e);
                None
            }
        }
    } else {
        None
    };
    #[cfg(not(target_os = "linux"))]
    let journald_layer: Option<tracing_subscriber::layer::Identity> = None;

    let result = tracing_subscriber::registry()
        .with(stdout_layer())
        .with(file_layer)
        .with(journald_layer)
        .with(filter_for(level))
        .try_init();

    if result.is_ok() {
        info!(
            "Logging initialized at level: {} (file: {}, journald: {})",
            level,
            config.directory.as_deref().unwrap_or("off"),
            config.journald
        );
    }

    guard
}

fn stdout_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .with_thread_ids(true)
        .with_thread_names(true)
}

/// `RUST_LOG` wins; otherwise our crates and the HTTP tracing layer log at `level`.
fn filter_for(level: Level) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,vacationstay={lvl},tower_http={lvl}",
            lvl = level.as_str().to_lowercase()
        ))
    })
}

/// Log an error with context at the ERROR level.
pub fn log_error<E: std::fmt::Display>(error: E, context: &str) {
    error!("{}: {}", context, error);
}

/// Log a result, at INFO on success and at ERROR on failure, and hand it back.
pub fn log_result<T, E: std::fmt::Display>(
    result: Result<T, E>,
    success_message: &str,
    error_context: &str,
) -> Result<T, E> {
    match &result {
        Ok(_) => info!("{}", success_message),
        Err(e) => log_error(e, error_context),
    }
    result
}
