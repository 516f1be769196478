// Worker pool
//
// N threads drain one FIFO command channel shared through a mutex-guarded
// receiver:
// - channel: task trait and command enum
// - dispatcher: the per-thread receive loop

mod channel;
mod dispatcher;

use std::sync::mpsc::{self, SendError, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tokio::runtime::Handle;
use tracing::{trace, warn};

use crate::error::SqlBindError;

pub(crate) use channel::Task;
use channel::Command;
use dispatcher::run_worker;
pub(crate) use dispatcher::panic_message;

/// Fixed-size pool of worker threads owned by one connection.
pub(crate) struct WorkerPool {
    connection: u64,
    sender: Sender<Command>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub(crate) fn spawn(connection: u64, size: usize) -> Result<Self, SqlBindError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let receiver = Arc::new(Mutex::new(receiver));
        let runtime = Handle::try_current().ok();
        let mut pool = Self {
            connection,
            sender,
            handles: Vec::with_capacity(size),
        };
        for worker in 0..size {
            let receiver = Arc::clone(&receiver);
            let runtime = runtime.clone();
            let handle = thread::Builder::new()
                .name(format!("sqlbind-worker-{connection}-{worker}"))
                .spawn(move || {
                    let runtime_guard = runtime.as_ref().map(Handle::enter);
                    run_worker(connection, worker, &receiver);
                    drop(runtime_guard);
                })
                .map_err(|err| {
                    SqlBindError::WorkerError(format!("failed to spawn worker thread: {err}"))
                })?;
            pool.handles.push(handle);
        }
        Ok(pool)
    }

    pub(crate) fn size(&self) -> usize {
        self.handles.len()
    }

    /// Append a task to the shared FIFO queue.
    ///
    /// If no worker can receive it, the task is abandoned inline.
    pub(crate) fn submit(&self, task: Box<dyn Task>) {
        trace!(connection = self.connection, "job queued");
        if let Err(SendError(command)) = self.sender.send(Command::Execute(task)) {
            warn!(connection = self.connection, "worker pool closed; abandoning job");
            if let Command::Execute(task) = command {
                task.abandon(SqlBindError::WorkerError("worker pool is shut down".into()));
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Shutdowns queue behind pending jobs, so those still run.
        for _ in 0..self.handles.len() {
            let _ = self.sender.send(Command::Shutdown);
        }
        let current = thread::current().id();
        for handle in self.handles.drain(..) {
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!(connection = self.connection, "worker thread exited by panic");
            }
        }
    }
}
