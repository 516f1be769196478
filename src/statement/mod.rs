// Statement
//
// Typed prepared statements bound to a connection:
// - execute: bind, execute and fetch against the binding tables
// - queue: asynchronous execution through the connection's worker pool
// - sink: row sinks and numeric out-parameters

mod execute;
mod queue;
mod sink;

use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::binding::{Record, SlotDescriptor, build_slots};
use crate::connection::Connection;
use crate::error::{BackendError, Side, SqlBindError};
use crate::placeholders::count_placeholders;

use execute::Prepared;

pub use sink::{AsyncOutcome, OutParams, RowSink, SharedOutParams};

/// Lifecycle state of a [`Statement`]. Closing consumes the statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementState {
    Unbound,
    Prepared,
}

/// A prepared statement with parameter record `P` and result record `R`.
///
/// Clones share the prepared state; executions through any clone (and
/// queued jobs) are serialized.
pub struct Statement<P, R> {
    inner: Arc<StatementInner<P, R>>,
}

struct StatementInner<P, R> {
    connection: Connection,
    exec: Mutex<Option<Prepared>>,
    _records: PhantomData<fn(&P) -> R>,
}

impl<P, R> Clone for Statement<P, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: Record, R: Record> Statement<P, R> {
    /// A statement on `connection` that has not been prepared yet.
    #[must_use]
    pub fn unbound(connection: &Connection) -> Self {
        Self {
            inner: Arc::new(StatementInner {
                connection: connection.clone(),
                exec: Mutex::new(None),
                _records: PhantomData,
            }),
        }
    }

    /// Prepare `sql` using default-valued records as templates.
    ///
    /// # Errors
    ///
    /// See [`Statement::init`].
    pub fn prepare(connection: &Connection, sql: &str) -> Result<Self, SqlBindError>
    where
        P: Default,
        R: Default,
    {
        Self::prepare_with(connection, sql, &P::default(), &R::default())
    }

    /// Prepare `sql` using the given parameter and result templates.
    ///
    /// # Errors
    ///
    /// See [`Statement::init`].
    pub fn prepare_with(
        connection: &Connection,
        sql: &str,
        param_template: &P,
        result_template: &R,
    ) -> Result<Self, SqlBindError> {
        let statement = Self::unbound(connection);
        statement.init(sql, param_template, result_template)?;
        Ok(statement)
    }

    /// Prepare `sql` and build both binding tables from the templates.
    ///
    /// Re-initializing a prepared statement replaces its prepared state.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when the parameter template does not match the
    /// placeholders in `sql` or the result template does not match the
    /// columns the statement produces, and `StatementError` when the engine
    /// rejects `sql`.
    pub fn init(&self, sql: &str, param_template: &P, result_template: &R) -> Result<(), SqlBindError> {
        let mut exec = self.lock();
        let placeholders = count_placeholders(sql);
        let handle = self
            .inner
            .connection
            .session()?
            .prepare(sql)
            .map_err(|err| SqlBindError::StatementError(BackendError::from_session(&err)))?;
        if handle.param_count() != placeholders {
            return Err(SqlBindError::ConfigError(format!(
                "found {placeholders} placeholders but the engine expects {} parameters",
                handle.param_count()
            )));
        }
        let param_slots = build_slots(param_template, placeholders, Side::Parameters)?;
        let result_slots = build_slots(result_template, handle.column_count(), Side::Results)?;
        debug!(
            connection = self.inner.connection.id(),
            sql,
            parameters = param_slots.len(),
            columns = result_slots.len(),
            "statement prepared"
        );
        *exec = Some(Prepared::new(handle, param_slots, result_slots));
        Ok(())
    }

    #[must_use]
    pub fn state(&self) -> StatementState {
        if self.with_prepared(|_| ()).is_some() {
            StatementState::Prepared
        } else {
            StatementState::Unbound
        }
    }

    #[must_use]
    pub fn connection(&self) -> &Connection {
        &self.inner.connection
    }

    #[must_use]
    pub fn sql(&self) -> Option<String> {
        self.with_prepared(|prepared| prepared.handle.sql().to_owned())
    }

    #[must_use]
    pub fn parameter_slots(&self) -> Option<Arc<[SlotDescriptor]>> {
        self.with_prepared(|prepared| Arc::clone(&prepared.param_slots))
    }

    #[must_use]
    pub fn result_slots(&self) -> Option<Arc<[SlotDescriptor]>> {
        self.with_prepared(|prepared| Arc::clone(&prepared.result_slots))
    }

    /// Release this handle. The backend statement is freed once no clone or
    /// queued job refers to it.
    pub fn close(self) {
        debug!(connection = self.inner.connection.id(), "statement closed");
    }

    /// Execute once, fetching rows into `sink` when one is given.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` on an unprepared statement, `ConversionError`
    /// when a field cannot be translated and `StatementError` for engine
    /// failures. Rows fetched before a failure stay in `sink`.
    pub fn execute(
        &self,
        params: &P,
        sink: Option<&mut dyn RowSink<R>>,
        out: OutParams<'_>,
    ) -> Result<(), SqlBindError>
    where
        R: Default,
    {
        let mut exec = self.lock();
        let prepared = exec.as_mut().ok_or_else(not_prepared)?;
        prepared.run(&self.inner.connection, params)?;
        prepared.report(out);
        match sink {
            Some(sink) => prepared.drain::<R, _>(sink),
            None => Ok(()),
        }
    }

    /// Execute and read at most one row into `row`.
    ///
    /// Returns whether a row was produced; `row` is untouched otherwise.
    ///
    /// # Errors
    ///
    /// As for [`Statement::execute`].
    pub fn execute_one(&self, params: &P, row: &mut R) -> Result<bool, SqlBindError> {
        let mut exec = self.lock();
        let prepared = exec.as_mut().ok_or_else(not_prepared)?;
        prepared.run(&self.inner.connection, params)?;
        if !prepared.produces_rows() {
            return Ok(false);
        }
        prepared.fetch(row)
    }

    /// Execute and collect every row.
    ///
    /// # Errors
    ///
    /// As for [`Statement::execute`].
    pub fn fetch_all(&self, params: &P) -> Result<Vec<R>, SqlBindError>
    where
        R: Default,
    {
        let mut rows = Vec::new();
        self.execute(params, Some(&mut rows), OutParams::none())?;
        Ok(rows)
    }

    /// Lock the prepared state. A panic during an earlier execution leaves
    /// the handle mid-result, so its stored result is dropped on recovery.
    fn lock(&self) -> MutexGuard<'_, Option<Prepared>> {
        match self.inner.exec.lock() {
            Ok(guard) => guard,
            Err(err) => {
                let mut guard = err.into_inner();
                if let Some(prepared) = guard.as_mut() {
                    prepared.handle.free_result();
                }
                self.inner.exec.clear_poison();
                warn!(
                    connection = self.inner.connection.id(),
                    "recovered statement after a panicked execution"
                );
                guard
            }
        }
    }

    fn with_prepared<T>(&self, f: impl FnOnce(&Prepared) -> T) -> Option<T> {
        self.lock().as_ref().map(f)
    }
}

fn not_prepared() -> SqlBindError {
    SqlBindError::ConfigError("statement has not been prepared".into())
}

impl<P, R> fmt::Debug for Statement<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("connection", &self.inner.connection.id())
            .finish_non_exhaustive()
    }
}
