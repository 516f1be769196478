use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

use tracing::{debug, error, trace};

use super::channel::Command;

pub(super) fn run_worker(connection: u64, worker: usize, receiver: &Arc<Mutex<Receiver<Command>>>) {
    debug!(connection, worker, "worker started");
    let mut jobs: u64 = 0;
    loop {
        // Only the dequeue happens under the lock; jobs run unlocked.
        let next = match receiver.lock() {
            Ok(guard) => guard.recv(),
            Err(poisoned) => poisoned.into_inner().recv(),
        };
        match next {
            Ok(Command::Execute(task)) => {
                jobs = jobs.saturating_add(1);
                trace!(connection, worker, job = jobs, "running queued job");
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.run())) {
                    error!(
                        connection,
                        worker,
                        panic = %panic_message(payload.as_ref()),
                        "queued job panicked; worker continues"
                    );
                }
            }
            Ok(Command::Shutdown) | Err(_) => break,
        }
    }
    debug!(connection, worker, jobs, "worker stopped");
}

pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}
