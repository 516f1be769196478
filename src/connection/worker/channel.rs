use crate::error::SqlBindError;

/// Unit of work a pool worker runs to completion.
///
/// Exactly one of `run` or `abandon` is called for every task handed to
/// the pool.
pub(crate) trait Task: Send {
    fn run(self: Box<Self>);

    /// Called instead of `run` when the task can no longer reach a worker.
    fn abandon(self: Box<Self>, err: SqlBindError);
}

pub(super) enum Command {
    Execute(Box<dyn Task>),
    Shutdown,
}
