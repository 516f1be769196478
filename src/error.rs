use std::fmt;

use thiserror::Error;

use crate::native::NativeError;

/// Which native handle reported a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorOrigin {
    /// The session handle owned by a [`crate::Connection`].
    Session,
    /// A prepared statement handle owned by a [`crate::Statement`].
    Statement,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorOrigin::Session => f.write_str("session"),
            ErrorOrigin::Statement => f.write_str("statement"),
        }
    }
}

/// Which side of a statement a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Parameters,
    Results,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Parameters => f.write_str("parameter"),
            Side::Results => f.write_str("result"),
        }
    }
}

/// Copy of a native handle's last-error state.
///
/// Holds no reference into the backend; it is captured at the moment the
/// native call reports failure and never changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendError {
    pub code: i32,
    pub message: String,
    pub origin: ErrorOrigin,
}

impl BackendError {
    #[must_use]
    pub fn from_session(err: &NativeError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            origin: ErrorOrigin::Session,
        }
    }

    #[must_use]
    pub fn from_statement(err: &NativeError) -> Self {
        Self {
            code: err.code,
            message: err.message.clone(),
            origin: ErrorOrigin::Statement,
        }
    }
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} error {}: {}", self.origin, self.code, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SqlBindError {
    /// Template/placeholder mismatch; only raised while building a statement.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Session establishment or loss. The connection needs a reconnect.
    #[error("Connection error: {0}")]
    ConnectionError(BackendError),

    /// Prepare, bind, execute or fetch failure local to one call.
    #[error("Statement error: {0}")]
    StatementError(BackendError),

    /// A converter could not translate a field; aborts the current call only.
    #[error("Conversion error in {side} slot {index}: {message}")]
    ConversionError {
        side: Side,
        index: usize,
        message: String,
    },

    /// The worker pool or a shared lock is unavailable.
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl SqlBindError {
    pub(crate) fn session(err: &NativeError) -> Self {
        SqlBindError::ConnectionError(BackendError::from_session(err))
    }

    pub(crate) fn statement(err: &NativeError) -> Self {
        SqlBindError::StatementError(BackendError::from_statement(err))
    }

    pub(crate) fn conversion(side: Side, index: usize, message: impl Into<String>) -> Self {
        SqlBindError::ConversionError {
            side,
            index,
            message: message.into(),
        }
    }

    /// Backend error code, when the failure came from a native handle.
    #[must_use]
    pub fn code(&self) -> Option<i32> {
        match self {
            SqlBindError::ConnectionError(err) | SqlBindError::StatementError(err) => {
                Some(err.code)
            }
            _ => None,
        }
    }
}

pub(crate) fn poisoned(what: &str) -> SqlBindError {
    SqlBindError::WorkerError(format!("{what} mutex poisoned"))
}
