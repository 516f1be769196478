use std::sync::Arc;

use tracing::trace;

use crate::binding::table::{ParamBindings, ResultBindings};
use crate::binding::{Record, SlotDescriptor};
use crate::connection::Connection;
use crate::error::SqlBindError;
use crate::native::StatementHandle;

use super::sink::{OutParams, RowSink, SharedOutParams};

/// Backend statement plus the binding tables built for it.
#[derive(Debug)]
pub(super) struct Prepared {
    pub(super) handle: StatementHandle,
    pub(super) param_slots: Arc<[SlotDescriptor]>,
    pub(super) result_slots: Arc<[SlotDescriptor]>,
    pub(super) params: ParamBindings,
    pub(super) results: ResultBindings,
}

impl Prepared {
    pub(super) fn new(
        handle: StatementHandle,
        param_slots: Arc<[SlotDescriptor]>,
        result_slots: Arc<[SlotDescriptor]>,
    ) -> Self {
        Self {
            params: ParamBindings::new(&param_slots),
            results: ResultBindings::new(&result_slots),
            handle,
            param_slots,
            result_slots,
        }
    }

    /// Refresh the parameter table, bind it and execute.
    ///
    /// The session is locked only for the engine call; the result set stays
    /// stored in the handle for fetching.
    pub(super) fn run<P: Record + ?Sized>(
        &mut self,
        connection: &Connection,
        params: &P,
    ) -> Result<(), SqlBindError> {
        self.handle.free_result();
        let binds = self.params.refresh(params)?;
        let bound = self
            .handle
            .bind_parameters(binds)
            .map_err(|err| SqlBindError::statement(&err))?;
        let mut session = connection.session()?;
        self.handle
            .execute(&mut session, &bound)
            .map_err(|err| SqlBindError::statement(&err))?;
        trace!(
            sql = %self.handle.sql(),
            bound_bytes = self.params.bound_bytes(),
            affected_rows = self.handle.affected_rows(),
            "statement executed"
        );
        Ok(())
    }

    pub(super) fn produces_rows(&self) -> bool {
        self.handle.column_count() > 0
    }

    /// Fetch the next stored row into `row`.
    pub(super) fn fetch<R: Record + ?Sized>(&mut self, row: &mut R) -> Result<bool, SqlBindError> {
        self.results.read_row(&mut self.handle, row)
    }

    /// Fetch rows into `sink` until it is satisfied or the result is exhausted.
    pub(super) fn drain<R, S>(&mut self, sink: &mut S) -> Result<(), SqlBindError>
    where
        R: Record + Default,
        S: RowSink<R> + ?Sized,
    {
        if !self.produces_rows() {
            return Ok(());
        }
        while sink.accepts_more() {
            let mut row = R::default();
            if !self.fetch(&mut row)? {
                break;
            }
            sink.push_row(row);
        }
        Ok(())
    }

    pub(super) fn report(&self, out: OutParams<'_>) {
        if let Some(slot) = out.insert_id {
            *slot = self.handle.last_insert_id();
        }
        if let Some(slot) = out.affected_rows {
            *slot = self.handle.affected_rows();
        }
    }

    pub(super) fn report_shared(&self, out: &SharedOutParams) {
        out.store(self.handle.last_insert_id(), self.handle.affected_rows());
    }
}
