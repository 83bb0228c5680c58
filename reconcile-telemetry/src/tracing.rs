use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;

use reconcile_config::Environment;
use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

/// Directory, relative to the working directory, that receives the rolling log files.
pub const LOG_DIRECTORY: &str = "logs";

const LOG_FILE_SUFFIX: &str = "log";

/// Number of daily log files kept before the oldest is removed.
pub const MAX_LOG_FILES: usize = 14;

/// Filter used when `RUST_LOG` is not set.
const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Flushes buffered log lines to the log file when dropped.
///
/// Hold it for the whole lifetime of the process.
pub type LogFlusher = WorkerGuard;

#[derive(Debug, Error)]
pub enum TracingError {
    #[error("failed to create log directory `{path}`: {source}")]
    LogDirectory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to initialize the rolling log file: {0}")]
    RollingFile(#[from] InitError),

    #[error("failed to forward `log` records to tracing: {0}")]
    LogBridge(#[from] tracing_log::log::SetLoggerError),

    #[error("failed to install the global tracing subscriber: {0}")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Installs the global subscriber for `app_name`, writing to stdout and `logs/`.
pub fn init_tracing(app_name: &str, environment: Environment) -> Result<LogFlusher, TracingError> {
    init_tracing_in(app_name, environment, Path::new(LOG_DIRECTORY))
}

/// Same as [`init_tracing`] with an explicit log directory.
///
/// Stdout lines are human readable in [`Environment::Dev`] and JSON elsewhere; the file always
/// gets plain text without ANSI colors. Both honor `RUST_LOG`.
pub fn init_tracing_in(
    app_name: &str,
    environment: Environment,
    log_directory: &Path,
) -> Result<LogFlusher, TracingError> {
    let (file_writer, flusher) = rolling_file_writer(app_name, log_directory)?;

    let stdout_layer = if environment.uses_structured_logs() {
        fmt::layer().json().with_current_span(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    let file_layer = fmt::layer()
        .with_ansi(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(file_writer)
        .boxed();

    let subscriber = tracing_subscriber::registry()
        .with(env_filter())
        .with(stdout_layer)
        .with(file_layer);

    LogTracer::init()?;
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(flusher)
}

/// Installs a stdout subscriber once per test binary. Repeated calls are no-ops.
pub fn init_test_tracing() {
    static INIT: Once = Once::new();

    INIT.call_once(|| {
        let _ = fmt()
            .with_env_filter(env_filter())
            .with_test_writer()
            .try_init();
    });
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_DIRECTIVE))
}

/// Creates a non-blocking writer onto `<log_directory>/<app_name>.<date>.log`, rotated at
/// midnight with at most [`MAX_LOG_FILES`] files kept.
fn rolling_file_writer(
    app_name: &str,
    log_directory: &Path,
) -> Result<(NonBlocking, WorkerGuard), TracingError> {
    std::fs::create_dir_all(log_directory).map_err(|source| TracingError::LogDirectory {
        path: log_directory.to_path_buf(),
        source,
    })?;

    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(app_name)
        .filename_suffix(LOG_FILE_SUFFIX)
        .max_log_files(MAX_LOG_FILES)
        .build(log_directory)?;

    Ok(tracing_appender::non_blocking(appender))
}
