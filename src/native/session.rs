use std::collections::VecDeque;

use rusqlite::types::{ToSqlOutput, Value, ValueRef};
use rusqlite::{OpenFlags, ToSql};
use tracing::debug;

use crate::config::ConnectOptions;

use super::statement::{StatementHandle, StoredValue};
use super::value::NativeValue;
use super::{NativeError, codes};

const UTF8_CHARSETS: [&str; 3] = ["utf8", "utf8mb4", "utf-8"];

/// Exclusively owned session with the embedded engine.
///
/// Closed when dropped. Not `Sync`; callers serialize access.
pub struct SessionHandle {
    conn: rusqlite::Connection,
    last_error: Option<NativeError>,
}

/// Stored outcome of one execution.
pub(super) struct Execution {
    pub(super) rows: VecDeque<Vec<StoredValue>>,
    pub(super) affected_rows: u64,
    pub(super) insert_id: u64,
}

impl SessionHandle {
    /// Open a session using the supplied options.
    ///
    /// # Errors
    ///
    /// Returns a [`NativeError`] if the host is not local, the charset is not
    /// UTF-8 or the engine refuses to open the database.
    pub fn open(opts: &ConnectOptions) -> Result<Self, NativeError> {
        match opts.host.as_deref() {
            None | Some("" | "localhost" | "127.0.0.1" | "::1") => {}
            Some(other) => {
                return Err(NativeError::client(
                    codes::UNKNOWN_HOST,
                    format!("host {other:?} is not reachable by the embedded engine"),
                ));
            }
        }
        let charset = opts.charset.to_ascii_lowercase();
        if !UTF8_CHARSETS.contains(&charset.as_str()) {
            return Err(NativeError::client(
                codes::UNSUPPORTED_CHARSET,
                format!("unsupported connection charset {:?}", opts.charset),
            ));
        }
        if opts.user.is_some() || opts.unix_socket.is_some() || opts.port != 0 {
            debug!(
                database = %opts.database,
                "user, port and socket settings are not used by the embedded engine"
            );
        }

        let mut flags = OpenFlags::SQLITE_OPEN_NO_MUTEX;
        if opts.flags.read_only {
            flags |= OpenFlags::SQLITE_OPEN_READ_ONLY;
        } else {
            flags |= OpenFlags::SQLITE_OPEN_READ_WRITE;
            if opts.flags.create {
                flags |= OpenFlags::SQLITE_OPEN_CREATE;
            }
        }
        if opts.flags.shared_cache {
            flags |= OpenFlags::SQLITE_OPEN_SHARED_CACHE;
        }
        if opts.flags.uri {
            flags |= OpenFlags::SQLITE_OPEN_URI;
        }

        let conn = rusqlite::Connection::open_with_flags(&opts.database, flags)?;
        conn.set_prepared_statement_cache_capacity(opts.statement_cache_capacity);
        Ok(Self {
            conn,
            last_error: None,
        })
    }

    /// Prepare `sql`, reporting the engine's parameter and column counts.
    ///
    /// # Errors
    ///
    /// Returns the engine's error when the SQL text is rejected.
    pub fn prepare(&mut self, sql: &str) -> Result<StatementHandle, NativeError> {
        let described = match self.conn.prepare_cached(sql) {
            Ok(stmt) => Ok((
                stmt.parameter_count(),
                stmt.column_count(),
                stmt.column_names()
                    .into_iter()
                    .map(str::to_owned)
                    .collect::<Vec<_>>(),
            )),
            Err(err) => Err(NativeError::from(err)),
        };
        let (param_count, column_count, column_names) = described.map_err(|err| self.fail(err))?;
        Ok(StatementHandle::new(
            sql,
            param_count,
            column_count,
            column_names,
        ))
    }

    /// Run a script of one or more statements without parameters.
    ///
    /// # Errors
    ///
    /// Returns the engine's error for the first failing statement.
    pub fn execute_batch(&mut self, sql: &str) -> Result<(), NativeError> {
        let result = self.conn.execute_batch(sql).map_err(NativeError::from);
        result.map_err(|err| self.fail(err))
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&NativeError> {
        self.last_error.as_ref()
    }

    /// Execute `sql` with bound values and store every produced row.
    pub(super) fn run(
        &mut self,
        sql: &str,
        column_count: usize,
        params: &[NativeValue<'_>],
    ) -> Result<Execution, NativeError> {
        let outputs = params
            .iter()
            .map(to_sql_output)
            .collect::<Result<Vec<_>, _>>()?;
        let param_refs: Vec<&dyn ToSql> = outputs.iter().map(|o| o as &dyn ToSql).collect();

        let before = self.conn.last_insert_rowid();
        let mut stmt = self.conn.prepare_cached(sql)?;
        if column_count == 0 {
            let changed = stmt.execute(&param_refs[..])?;
            return Ok(Execution {
                rows: VecDeque::new(),
                affected_rows: changed as u64,
                insert_id: if changed > 0 { rowid(&self.conn) } else { 0 },
            });
        }

        let mut rows_iter = stmt.query(&param_refs[..])?;
        let mut rows = VecDeque::new();
        while let Some(row) = rows_iter.next()? {
            let mut values = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                values.push(StoredValue::from(row.get_ref(idx)?));
            }
            rows.push_back(values);
        }
        drop(rows_iter);

        // Only `INSERT .. RETURNING` moves the rowid on the query path.
        let after = self.conn.last_insert_rowid();
        Ok(Execution {
            affected_rows: rows.len() as u64,
            rows,
            insert_id: if after == before { 0 } else { rowid(&self.conn) },
        })
    }

    fn fail(&mut self, err: NativeError) -> NativeError {
        self.last_error = Some(err.clone());
        err
    }
}

/// Rowid of the most recent insert on the session, or 0 when none applies.
fn rowid(conn: &rusqlite::Connection) -> u64 {
    u64::try_from(conn.last_insert_rowid()).unwrap_or(0)
}

fn to_sql_output<'a>(value: &NativeValue<'a>) -> Result<ToSqlOutput<'a>, NativeError> {
    Ok(match *value {
        NativeValue::Null => ToSqlOutput::Owned(Value::Null),
        NativeValue::Integer(i) => ToSqlOutput::Owned(Value::Integer(i)),
        NativeValue::Unsigned(u) => {
            let i = i64::try_from(u).map_err(|_| {
                NativeError::client(
                    codes::OUT_OF_RANGE,
                    format!("unsigned value {u} exceeds the engine's integer range"),
                )
            })?;
            ToSqlOutput::Owned(Value::Integer(i))
        }
        NativeValue::Double(f) => ToSqlOutput::Owned(Value::Real(f)),
        NativeValue::Text(bytes) => ToSqlOutput::Borrowed(ValueRef::Text(bytes)),
        NativeValue::Blob(bytes) => ToSqlOutput::Borrowed(ValueRef::Blob(bytes)),
        NativeValue::Time(t) => ToSqlOutput::Owned(Value::Text(t.to_text())),
    })
}
