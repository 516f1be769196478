use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;
use tracing::trace;

use crate::binding::Record;
use crate::connection::worker::{Task, panic_message};
use crate::error::{SqlBindError, poisoned};

use super::Statement;
use super::sink::{AsyncOutcome, RowSink, SharedOutParams};

/// One queued execution and the callback that reports it.
struct QueuedExecution<P, R, S, F> {
    statement: Statement<P, R>,
    params: Arc<P>,
    sink: Option<Arc<Mutex<S>>>,
    out: SharedOutParams,
    callback: F,
}

impl<P, R, S, F> Task for QueuedExecution<P, R, S, F>
where
    P: Record + Send + Sync + 'static,
    R: Record + Default + Send + 'static,
    S: RowSink<R> + Send + 'static,
    F: FnOnce(Result<(), SqlBindError>) + Send + 'static,
{
    fn run(self: Box<Self>) {
        let QueuedExecution {
            statement,
            params,
            sink,
            out,
            callback,
        } = *self;
        // Panics inside the execution are reported through the callback.
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            statement.execute_shared(&params, sink.as_deref(), &out)
        }))
        .unwrap_or_else(|payload| {
            Err(SqlBindError::WorkerError(format!(
                "queued execution panicked: {}",
                panic_message(payload.as_ref())
            )))
        });
        if let Err(err) = &result {
            trace!(error = %err, "queued execution failed");
        }
        callback(result);
    }

    fn abandon(self: Box<Self>, err: SqlBindError) {
        (self.callback)(Err(err));
    }
}

impl<P, R> Statement<P, R>
where
    P: Record + Send + Sync + 'static,
    R: Record + Default + Send + 'static,
{
    /// Queue an execution on the connection's worker pool.
    ///
    /// `callback` runs on a worker thread exactly once, with `Ok(())` on
    /// success (including when no rows were produced) or the failure. Rows
    /// are appended to `sink` and the requested numeric values are stored in
    /// `out` before the callback runs.
    pub fn queue<S, F>(
        &self,
        params: Arc<P>,
        sink: Option<Arc<Mutex<S>>>,
        out: SharedOutParams,
        callback: F,
    ) where
        S: RowSink<R> + Send + 'static,
        F: FnOnce(Result<(), SqlBindError>) + Send + 'static,
    {
        let job = QueuedExecution {
            statement: self.clone(),
            params,
            sink,
            out,
            callback,
        };
        self.inner.connection.submit(Box::new(job));
    }

    /// Queue an execution whose rows, if any, are discarded.
    pub fn queue_discarding<F>(&self, params: Arc<P>, out: SharedOutParams, callback: F)
    where
        F: FnOnce(Result<(), SqlBindError>) + Send + 'static,
    {
        self.queue::<Vec<R>, F>(params, None, out, callback);
    }

    /// Run through the worker pool and await the collected outcome.
    ///
    /// # Errors
    ///
    /// Returns the execution's failure, or `WorkerError` when the job was
    /// dropped without reporting.
    pub async fn execute_async(&self, params: Arc<P>) -> Result<AsyncOutcome<R>, SqlBindError> {
        let rows = Arc::new(Mutex::new(Vec::new()));
        let out = SharedOutParams::both();
        let (tx, rx) = oneshot::channel();
        self.queue(params, Some(Arc::clone(&rows)), out.clone(), move |result| {
            let _ = tx.send(result);
        });
        rx.await.map_err(|_| {
            SqlBindError::WorkerError("worker dropped the job without reporting".into())
        })??;
        let rows = std::mem::take(&mut *rows.lock().map_err(|_| poisoned("result sink"))?);
        Ok(AsyncOutcome {
            rows,
            insert_id: out.insert_id().unwrap_or_default(),
            affected_rows: out.affected_rows().unwrap_or_default(),
        })
    }

    fn execute_shared<S>(
        &self,
        params: &P,
        sink: Option<&Mutex<S>>,
        out: &SharedOutParams,
    ) -> Result<(), SqlBindError>
    where
        S: RowSink<R> + ?Sized,
    {
        let mut exec = self.lock();
        let prepared = exec.as_mut().ok_or_else(super::not_prepared)?;
        prepared.run(self.connection(), params)?;
        prepared.report_shared(out);
        if let Some(sink) = sink {
            let mut sink = sink.lock().map_err(|_| poisoned("result sink"))?;
            prepared.drain::<R, S>(&mut *sink)?;
        }
        Ok(())
    }
}
