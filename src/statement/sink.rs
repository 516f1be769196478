use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Destination for rows fetched by an execution.
///
/// Multi-row sinks accept every row; single-row sinks stop the fetch loop
/// once they hold a row.
pub trait RowSink<R> {
    /// Whether another row should be fetched.
    fn accepts_more(&self) -> bool {
        true
    }

    fn push_row(&mut self, row: R);
}

impl<R> RowSink<R> for Vec<R> {
    fn push_row(&mut self, row: R) {
        self.push(row);
    }
}

impl<R> RowSink<R> for VecDeque<R> {
    fn push_row(&mut self, row: R) {
        self.push_back(row);
    }
}

impl<R> RowSink<R> for Option<R> {
    fn accepts_more(&self) -> bool {
        self.is_none()
    }

    fn push_row(&mut self, row: R) {
        *self = Some(row);
    }
}

/// Numeric out-parameters of a synchronous execution.
///
/// A `None` field is never written.
#[derive(Debug, Default)]
pub struct OutParams<'a> {
    pub insert_id: Option<&'a mut u64>,
    pub affected_rows: Option<&'a mut u64>,
}

impl<'a> OutParams<'a> {
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn insert_id(mut self, slot: &'a mut u64) -> Self {
        self.insert_id = Some(slot);
        self
    }

    #[must_use]
    pub fn affected_rows(mut self, slot: &'a mut u64) -> Self {
        self.affected_rows = Some(slot);
        self
    }
}

/// Numeric out-parameters of a queued execution.
///
/// Clones share their counters, so a caller keeps one clone to read the
/// values once the job's callback has fired.
#[derive(Debug, Clone, Default)]
pub struct SharedOutParams {
    insert_id: Option<Arc<AtomicU64>>,
    affected_rows: Option<Arc<AtomicU64>>,
}

impl SharedOutParams {
    /// Request neither value.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn both() -> Self {
        Self::none().with_insert_id().with_affected_rows()
    }

    #[must_use]
    pub fn with_insert_id(mut self) -> Self {
        self.insert_id = Some(Arc::default());
        self
    }

    #[must_use]
    pub fn with_affected_rows(mut self) -> Self {
        self.affected_rows = Some(Arc::default());
        self
    }

    #[must_use]
    pub fn insert_id(&self) -> Option<u64> {
        self.insert_id.as_ref().map(|v| v.load(Ordering::Acquire))
    }

    #[must_use]
    pub fn affected_rows(&self) -> Option<u64> {
        self.affected_rows.as_ref().map(|v| v.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, insert_id: u64, affected_rows: u64) {
        if let Some(slot) = &self.insert_id {
            slot.store(insert_id, Ordering::Release);
        }
        if let Some(slot) = &self.affected_rows {
            slot.store(affected_rows, Ordering::Release);
        }
    }
}

/// Everything an awaited execution produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AsyncOutcome<R> {
    pub rows: Vec<R>,
    pub insert_id: u64,
    pub affected_rows: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_sink_holds_one_row() {
        let mut sink: Option<i32> = None;
        assert!(sink.accepts_more());
        sink.push_row(4);
        assert!(!sink.accepts_more());
    }

    #[test]
    fn shared_out_params_only_report_requested_values() {
        let out = SharedOutParams::none().with_affected_rows();
        out.clone().store(9, 3);
        assert_eq!(out.insert_id(), None);
        assert_eq!(out.affected_rows(), Some(3));
    }
}
