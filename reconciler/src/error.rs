use std::backtrace::Backtrace;
use std::error::Error;
use std::fmt;

use reconcile::error::ReconcileError;
use reconcile::pipeline::RunReport;

/// Returns whether terminal output should include backtraces.
fn should_render_backtrace() -> bool {
    matches!(
        std::env::var("RUST_BACKTRACE").as_deref(),
        Ok("1") | Ok("full")
    )
}

pub type ReconcilerResult<T> = Result<T, ReconcilerError>;

/// Captured backtrace wrapper to avoid thiserror's unstable feature detection.
pub struct CapturedBacktrace(Backtrace);

impl CapturedBacktrace {
    fn capture() -> Self {
        Self(Backtrace::capture())
    }
}

impl fmt::Debug for CapturedBacktrace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type of the reconciler binary.
#[derive(Debug)]
pub enum ReconcilerError {
    /// Read, diff or schema error raised by the pipeline.
    Reconcile(ReconcileError),
    /// Configuration could not be loaded or is invalid.
    Config(Box<dyn Error + Send + Sync>, CapturedBacktrace),
    /// A database could not be reached.
    Connection(sqlx::Error, CapturedBacktrace),
    /// I/O error.
    Io(std::io::Error, CapturedBacktrace),
    /// The run completed but some mutations failed.
    Incomplete(RunReport),
}

impl ReconcilerError {
    /// Returns a short category label for this error.
    pub fn category(&self) -> &'static str {
        match self {
            ReconcilerError::Reconcile(_) => "reconciliation error",
            ReconcilerError::Config(_, _) => "configuration error",
            ReconcilerError::Connection(_, _) => "connection error",
            ReconcilerError::Io(_, _) => "i/o error",
            ReconcilerError::Incomplete(_) => "incomplete run",
        }
    }

    pub fn backtrace(&self) -> Option<&Backtrace> {
        match self {
            ReconcilerError::Reconcile(err) => Some(err.backtrace()),
            ReconcilerError::Config(_, cb) => Some(&cb.0),
            ReconcilerError::Connection(_, cb) => Some(&cb.0),
            ReconcilerError::Io(_, cb) => Some(&cb.0),
            ReconcilerError::Incomplete(_) => None,
        }
    }

    /// Creates a configuration error from any error type.
    pub fn config<E: Error + Send + Sync + 'static>(err: E) -> Self {
        ReconcilerError::Config(Box::new(err), CapturedBacktrace::capture())
    }

    /// Returns a user-oriented report for terminal output.
    pub fn render_report(&self) -> String {
        let mut out = String::new();
        out.push_str("reconciler failed\n");
        out.push_str(&format!("category: {}\n", self.category()));
        out.push_str(&format!("error: {}\n", self));

        let mut source = Error::source(self);
        let mut idx = 1usize;
        while let Some(err) = source {
            out.push_str(&format!("cause {idx}: {err}\n"));
            source = err.source();
            idx += 1;
        }

        if should_render_backtrace()
            && let Some(backtrace) = self.backtrace()
        {
            out.push_str("backtrace:\n");
            out.push_str(&backtrace.to_string());
            if !out.ends_with('\n') {
                out.push('\n');
            }
        }

        out
    }
}

impl fmt::Display for ReconcilerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReconcilerError::Reconcile(err) => write!(f, "{err}"),
            ReconcilerError::Config(source, _) => write!(f, "configuration error: {source}"),
            ReconcilerError::Connection(source, _) => write!(f, "connection error: {source}"),
            ReconcilerError::Io(source, _) => write!(f, "i/o error: {source}"),
            ReconcilerError::Incomplete(report) => write!(
                f,
                "{} mutations failed (inserts: {}, updates: {}, deletes: {})",
                report.failed(),
                report.insert.failed,
                report.update.failed,
                report.delete.failed
            ),
        }
    }
}

impl Error for ReconcilerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ReconcilerError::Reconcile(err) => err.source(),
            ReconcilerError::Config(source, _) => Some(source.as_ref()),
            ReconcilerError::Connection(source, _) => Some(source),
            ReconcilerError::Io(source, _) => Some(source),
            ReconcilerError::Incomplete(_) => None,
        }
    }
}

impl From<sqlx::Error> for ReconcilerError {
    fn from(err: sqlx::Error) -> Self {
        ReconcilerError::Connection(err, CapturedBacktrace::capture())
    }
}

impl From<std::io::Error> for ReconcilerError {
    fn from(err: std::io::Error) -> Self {
        ReconcilerError::Io(err, CapturedBacktrace::capture())
    }
}

impl From<ReconcileError> for ReconcilerError {
    fn from(err: ReconcileError) -> Self {
        ReconcilerError::Reconcile(err)
    }
}
