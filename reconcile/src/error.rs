//! Error types and result definitions for reconciliation.
//!
//! [`ReconcileError`] carries an [`ErrorKind`] that tells the pipeline how to react: connection
//! and schema failures abort a run before anything is diffed, format failures skip one row and
//! mutation failures skip one statement.

use std::backtrace::Backtrace;
use std::borrow::Cow;
use std::error;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use reconcile_mysql::db::TableLookupError;

/// Result type used throughout the crate.
pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[derive(Debug, Clone)]
struct ErrorPayload {
    kind: ErrorKind,
    description: Cow<'static, str>,
    detail: Option<Cow<'static, str>>,
    source: Option<Arc<dyn error::Error + Send + Sync>>,
    location: &'static Location<'static>,
    backtrace: Arc<Backtrace>,
}

/// Main error type of the crate.
///
/// Carries a kind, a description, an optional detail and an optional source error.
#[derive(Debug, Clone)]
pub struct ReconcileError {
    payload: Box<ErrorPayload>,
}

/// Categories of failures that can happen during a reconciliation run.
#[derive(PartialEq, Eq, Copy, Clone, Debug, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    /// A store could not be reached or the connection was lost.
    ConnectionFailed,
    /// A statement was rejected for a reason other than the schema.
    QueryFailed,
    /// A table or column is missing.
    SchemaError,
    /// A value could not be transcoded, e.g. a malformed MAC address.
    InvalidFormat,
    /// An insert, update or delete against the destination failed.
    MutationFailed,
    /// Two source rows share a join key, so only the first one can be reconciled.
    DuplicateJoinKey,
    /// A stored value could not be decoded into a cell.
    ConversionError,
    ConfigError,
}

impl ReconcileError {
    /// Returns the [`ErrorKind`] of this error.
    pub fn kind(&self) -> ErrorKind {
        self.payload.kind
    }

    pub fn description(&self) -> &str {
        &self.payload.description
    }

    pub fn detail(&self) -> Option<&str> {
        self.payload.detail.as_deref()
    }

    pub fn backtrace(&self) -> &Backtrace {
        self.payload.backtrace.as_ref()
    }

    pub fn location(&self) -> &'static Location<'static> {
        self.payload.location
    }

    /// Attaches the originating error.
    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: error::Error + Send + Sync + 'static,
    {
        self.payload.source = Some(Arc::new(source));
        self
    }

    /// Returns a copy of this error with `kind` replaced, keeping everything else.
    ///
    /// Used to classify a lower level failure by the operation it interrupted.
    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.payload.kind = kind;
        self
    }

    #[track_caller]
    fn from_components(
        kind: ErrorKind,
        description: Cow<'static, str>,
        detail: Option<Cow<'static, str>>,
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    ) -> Self {
        ReconcileError {
            payload: Box::new(ErrorPayload {
                kind,
                description,
                detail,
                source,
                location: Location::caller(),
                backtrace: Arc::new(Backtrace::capture()),
            }),
        }
    }
}

impl PartialEq for ReconcileError {
    fn eq(&self, other: &ReconcileError) -> bool {
        self.payload.kind == other.payload.kind
    }
}

impl fmt::Display for ReconcileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = &self.payload;
        let location = payload.location;
        write!(
            f,
            "[{:?}] {} @ {}:{}:{}",
            payload.kind,
            payload.description,
            location.file(),
            location.line(),
            location.column()
        )?;

        if let Some(detail) = payload.detail.as_deref() {
            write!(f, "\n  Detail:")?;
            for line in detail.lines() {
                write!(f, "\n    {line}")?;
            }
        }

        Ok(())
    }
}

impl error::Error for ReconcileError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.payload
            .source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn error::Error + 'static))
    }
}

impl From<(ErrorKind, &'static str)> for ReconcileError {
    #[track_caller]
    fn from((kind, desc): (ErrorKind, &'static str)) -> ReconcileError {
        ReconcileError::from_components(kind, Cow::Borrowed(desc), None, None)
    }
}

impl<D> From<(ErrorKind, &'static str, D)> for ReconcileError
where
    D: Into<Cow<'static, str>>,
{
    #[track_caller]
    fn from((kind, desc, detail): (ErrorKind, &'static str, D)) -> ReconcileError {
        ReconcileError::from_components(kind, Cow::Borrowed(desc), Some(detail.into()), None)
    }
}

/// Converts [`sqlx::Error`] into a [`ReconcileError`].
///
/// Transport and pool failures map to [`ErrorKind::ConnectionFailed`], missing tables and
/// columns (SQLSTATE `42S02`, `42S22`) to [`ErrorKind::SchemaError`], rejected credentials
/// (`28000`) to [`ErrorKind::ConnectionFailed`] and decode failures to
/// [`ErrorKind::ConversionError`].
impl From<sqlx::Error> for ReconcileError {
    #[track_caller]
    fn from(err: sqlx::Error) -> ReconcileError {
        let (kind, description) = match &err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => {
                (ErrorKind::ConnectionFailed, "MySQL connection failed")
            }
            sqlx::Error::Database(database_error) => match database_error.code().as_deref() {
                Some("42S02") | Some("42S22") => {
                    (ErrorKind::SchemaError, "MySQL schema object not found")
                }
                Some("28000") => (ErrorKind::ConnectionFailed, "MySQL authentication failed"),
                _ => (ErrorKind::QueryFailed, "MySQL statement failed"),
            },
            sqlx::Error::ColumnNotFound(_) | sqlx::Error::ColumnIndexOutOfBounds { .. } => {
                (ErrorKind::SchemaError, "MySQL column not found")
            }
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                (ErrorKind::ConversionError, "MySQL value decoding failed")
            }
            sqlx::Error::Configuration(_) => {
                (ErrorKind::ConfigError, "MySQL connection options are invalid")
            }
            _ => (ErrorKind::QueryFailed, "MySQL operation failed"),
        };

        let detail = err.to_string();
        ReconcileError::from_components(
            kind,
            Cow::Borrowed(description),
            Some(Cow::Owned(detail)),
            Some(Arc::new(err)),
        )
    }
}

impl From<TableLookupError> for ReconcileError {
    #[track_caller]
    fn from(err: TableLookupError) -> ReconcileError {
        match err {
            TableLookupError::Database(err) => err.into(),
            TableLookupError::TableNotFound(table_name) => ReconcileError::from_components(
                ErrorKind::SchemaError,
                Cow::Borrowed("Table not found"),
                Some(Cow::Owned(format!("table `{table_name}` does not exist"))),
                None,
            ),
        }
    }
}
