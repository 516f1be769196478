//! Convenient imports for common functionality.
//!
//! Brings the connection, statement and record types into scope together
//! with the `sql_record!` macro.

pub use crate::binding::{Column, FixedText, Null, Record, WideText};
pub use crate::config::{ClientFlags, ConnectOptions};
pub use crate::connection::Connection;
pub use crate::error::SqlBindError;
pub use crate::sql_record;
pub use crate::statement::{
    AsyncOutcome, OutParams, RowSink, SharedOutParams, Statement, StatementState,
};
