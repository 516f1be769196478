// Connection
//
// One native session plus the worker pool that drains its job queue.
// - worker: fixed-size thread pool and its FIFO command channel

pub(crate) mod worker;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::info;

use crate::config::ConnectOptions;
use crate::error::{BackendError, SqlBindError, poisoned};
use crate::native::SessionHandle;

use worker::{Task, WorkerPool};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Shared handle to a session and its worker pool.
///
/// Cloning is cheap; the session closes and the workers stop when the last
/// clone (including those held by statements) is dropped.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

struct ConnectionInner {
    id: u64,
    options: ConnectOptions,
    session: Mutex<SessionHandle>,
    workers: WorkerPool,
}

impl Connection {
    /// Open a session and start `options.worker_threads` workers.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for invalid options, `ConnectionError` if the
    /// session cannot be opened and `WorkerError` if a worker thread cannot
    /// be spawned.
    pub fn connect(options: ConnectOptions) -> Result<Self, SqlBindError> {
        options.validate()?;
        let session = SessionHandle::open(&options).map_err(|err| SqlBindError::session(&err))?;
        let id = NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed);
        let workers = WorkerPool::spawn(id, options.worker_threads)?;
        info!(
            connection = id,
            database = %options.database,
            workers = options.worker_threads,
            "connected"
        );
        Ok(Self {
            inner: Arc::new(ConnectionInner {
                id,
                options,
                session: Mutex::new(session),
                workers,
            }),
        })
    }

    /// Replace the session with a freshly opened one using the stored options.
    ///
    /// Prepared statements stay usable; they are re-prepared against the new
    /// session on their next execution.
    ///
    /// # Errors
    ///
    /// Returns `ConnectionError` if the session cannot be re-opened; the old
    /// session is kept in that case.
    pub fn reconnect(&self) -> Result<(), SqlBindError> {
        let fresh =
            SessionHandle::open(&self.inner.options).map_err(|err| SqlBindError::session(&err))?;
        *self.session()? = fresh;
        info!(connection = self.inner.id, "reconnected");
        Ok(())
    }

    /// Run one or more `;`-separated statements without binding.
    ///
    /// # Errors
    ///
    /// Returns `StatementError` with the engine's error.
    pub fn execute_batch(&self, sql: &str) -> Result<(), SqlBindError> {
        self.session()?
            .execute_batch(sql)
            .map_err(|err| SqlBindError::StatementError(BackendError::from_session(&err)))
    }

    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[must_use]
    pub fn options(&self) -> &ConnectOptions {
        &self.inner.options
    }

    #[must_use]
    pub fn worker_count(&self) -> usize {
        self.inner.workers.size()
    }

    pub(crate) fn session(&self) -> Result<MutexGuard<'_, SessionHandle>, SqlBindError> {
        self.inner.session.lock().map_err(|_| poisoned("session"))
    }

    pub(crate) fn submit(&self, task: Box<dyn Task>) {
        self.inner.workers.submit(task);
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("database", &self.inner.options.database)
            .field("workers", &self.inner.workers.size())
            .finish()
    }
}
