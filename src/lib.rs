//! Typed prepared statements over an embedded SQL engine.
//!
//! A [`Statement`] is built once from query text plus parameter and result
//! templates (any [`Record`]: tuples, `()` or structs declared with
//! [`sql_record!`]). Executions refresh positional binding tables from a
//! parameter record and read rows back into result records, converting
//! text, bytes, UTF-16 text, JSON and calendar values at the boundary.
//! Executions run synchronously or are queued on the [`Connection`]'s
//! worker pool.
//!
//! ```rust
//! use sqlbind::prelude::*;
//!
//! # fn main() -> Result<(), SqlBindError> {
//! let conn = Connection::connect(ConnectOptions::new(":memory:"))?;
//! conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")?;
//!
//! let insert = Statement::<(String,), ()>::prepare(&conn, "INSERT INTO t (name) VALUES (?)")?;
//! insert.execute(&("alpha".to_string(),), None, OutParams::none())?;
//!
//! let select = Statement::<(i64,), (i64, String)>::prepare(&conn, "SELECT id, name FROM t WHERE id = ?")?;
//! let rows = select.fetch_all(&(1,))?;
//! assert_eq!(rows, vec![(1, "alpha".to_string())]);
//! # Ok(())
//! # }
//! ```

pub mod binding;
pub mod config;
pub mod connection;
pub mod error;
pub mod native;
pub mod placeholders;
pub mod prelude;
pub mod statement;

pub use binding::{
    ByteWidth, Column, FieldMut, FieldRef, FixedText, Null, Record, Representation, SemanticType,
    SlotDescriptor, SqlType, WideText,
};
pub use config::{ClientFlags, ConnectOptions, ConnectOptionsBuilder};
pub use connection::Connection;
pub use error::{BackendError, ErrorOrigin, Side, SqlBindError};
pub use statement::{
    AsyncOutcome, OutParams, RowSink, SharedOutParams, Statement, StatementState,
};
