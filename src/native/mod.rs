// Native client layer
//
// Handle-level access to the embedded engine, shaped like a C client library:
// - session: session handle (open, prepare, batch execution)
// - statement: prepared statement handle (bind, execute, fetch, metadata)
// - value: bind arrays and result bind descriptors
// - time: composite calendar representation used by temporal buffers

pub mod session;
pub mod statement;
pub mod time;
pub mod value;

use std::fmt;

pub use session::SessionHandle;
pub use statement::{BoundParameters, StatementHandle};
pub use time::{NativeTime, TimeKind};
pub use value::{BindArray, BufferType, FixedValue, NativeValue, ResultBind};

/// Client-side error codes, numbered after the usual client library range.
pub mod codes {
    pub const UNKNOWN: i32 = 2000;
    pub const UNKNOWN_HOST: i32 = 2005;
    pub const UNSUPPORTED_CHARSET: i32 = 2019;
    pub const INVALID_PARAMETER_NO: i32 = 2034;
    pub const UNSUPPORTED_PARAM_TYPE: i32 = 2036;
    pub const NO_CURRENT_ROW: i32 = 2051;
    pub const INVALID_COLUMN: i32 = 2052;
    pub const TYPE_MISMATCH: i32 = 2061;
    pub const OUT_OF_RANGE: i32 = 2062;
}

/// Last-error state of a native handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub code: i32,
    pub message: String,
}

impl NativeError {
    #[must_use]
    pub fn client(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for NativeError {}

impl From<rusqlite::Error> for NativeError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(failure, message) => Self {
                code: failure.extended_code,
                message: message.clone().unwrap_or_else(|| failure.to_string()),
            },
            _ => Self::client(codes::UNKNOWN, err.to_string()),
        }
    }
}
