use std::borrow::Cow;
use std::collections::VecDeque;
use std::sync::Arc;

use rusqlite::types::ValueRef;

use super::session::SessionHandle;
use super::time::NativeTime;
use super::value::{BindArray, BufferType, FixedValue, NativeValue, ResultBind};
use super::{NativeError, codes};

/// One column value held by the stored result set.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum StoredValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(Vec<u8>),
    Blob(Vec<u8>),
}

impl From<ValueRef<'_>> for StoredValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => StoredValue::Null,
            ValueRef::Integer(i) => StoredValue::Integer(i),
            ValueRef::Real(f) => StoredValue::Real(f),
            ValueRef::Text(bytes) => StoredValue::Text(bytes.to_vec()),
            ValueRef::Blob(bytes) => StoredValue::Blob(bytes.to_vec()),
        }
    }
}

impl StoredValue {
    /// Byte rendering used by chunked buffers.
    fn bytes(&self) -> Cow<'_, [u8]> {
        match self {
            StoredValue::Null => Cow::Borrowed(&[]),
            StoredValue::Integer(i) => Cow::Owned(i.to_string().into_bytes()),
            StoredValue::Real(f) => Cow::Owned(f.to_string().into_bytes()),
            StoredValue::Text(bytes) | StoredValue::Blob(bytes) => Cow::Borrowed(bytes),
        }
    }

    fn text_str(&self) -> Option<&str> {
        match self {
            StoredValue::Text(bytes) => std::str::from_utf8(bytes).ok().map(str::trim),
            _ => None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            StoredValue::Null => "null",
            StoredValue::Integer(_) => "integer",
            StoredValue::Real(_) => "real",
            StoredValue::Text(_) => "text",
            StoredValue::Blob(_) => "blob",
        }
    }
}

/// Parameter values validated against a statement handle.
#[derive(Debug)]
pub struct BoundParameters<'a> {
    values: Vec<NativeValue<'a>>,
}

/// Exclusively owned prepared statement.
///
/// Executing stores the complete result set in the handle; rows are then
/// pulled one at a time with [`StatementHandle::fetch_row`].
#[derive(Debug)]
pub struct StatementHandle {
    sql: Arc<str>,
    param_count: usize,
    column_count: usize,
    column_names: Vec<String>,
    rows: VecDeque<Vec<StoredValue>>,
    current: Option<Vec<StoredValue>>,
    insert_id: u64,
    affected_rows: u64,
    last_error: Option<NativeError>,
}

impl StatementHandle {
    pub(super) fn new(
        sql: &str,
        param_count: usize,
        column_count: usize,
        column_names: Vec<String>,
    ) -> Self {
        Self {
            sql: Arc::from(sql),
            param_count,
            column_count,
            column_names,
            rows: VecDeque::new(),
            current: None,
            insert_id: 0,
            affected_rows: 0,
            last_error: None,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn param_count(&self) -> usize {
        self.param_count
    }

    #[must_use]
    pub fn column_count(&self) -> usize {
        self.column_count
    }

    #[must_use]
    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    #[must_use]
    pub fn last_insert_id(&self) -> u64 {
        self.insert_id
    }

    /// Rows changed by DML, or rows produced by a query.
    #[must_use]
    pub fn affected_rows(&self) -> u64 {
        self.affected_rows
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&NativeError> {
        self.last_error.as_ref()
    }

    /// Check a bind array against the statement's parameter count.
    ///
    /// # Errors
    ///
    /// Returns `INVALID_PARAMETER_NO` on a count mismatch and `OUT_OF_RANGE`
    /// for unsigned values the engine cannot store.
    pub fn bind_parameters<'a>(
        &mut self,
        binds: BindArray<'a>,
    ) -> Result<BoundParameters<'a>, NativeError> {
        if binds.len() != self.param_count {
            return Err(self.fail(NativeError::client(
                codes::INVALID_PARAMETER_NO,
                format!(
                    "statement expects {} parameters, {} bound",
                    self.param_count,
                    binds.len()
                ),
            )));
        }
        let out_of_range = binds.as_slice().iter().position(
            |value| matches!(value, NativeValue::Unsigned(u) if i64::try_from(*u).is_err()),
        );
        if let Some(idx) = out_of_range {
            return Err(self.fail(NativeError::client(
                codes::OUT_OF_RANGE,
                format!("parameter {idx} exceeds the engine's integer range"),
            )));
        }
        Ok(BoundParameters {
            values: binds.into_values(),
        })
    }

    /// Execute with previously bound parameters, replacing any stored result.
    ///
    /// # Errors
    ///
    /// Returns the engine's error; it is also kept as the handle's last error.
    pub fn execute(
        &mut self,
        session: &mut SessionHandle,
        params: &BoundParameters<'_>,
    ) -> Result<(), NativeError> {
        self.free_result();
        match session.run(&self.sql, self.column_count, &params.values) {
            Ok(execution) => {
                self.rows = execution.rows;
                self.affected_rows = execution.affected_rows;
                self.insert_id = execution.insert_id;
                Ok(())
            }
            Err(err) => Err(self.fail(err)),
        }
    }

    /// Advance to the next stored row and fill `binds` for it.
    ///
    /// Returns `false` once the result set is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a native error when the bind count is wrong or a value cannot
    /// be represented in its column's buffer type.
    pub fn fetch_row(&mut self, binds: &mut [ResultBind]) -> Result<bool, NativeError> {
        if binds.len() != self.column_count {
            return Err(self.fail(NativeError::client(
                codes::INVALID_COLUMN,
                format!(
                    "statement produces {} columns, {} result binds supplied",
                    self.column_count,
                    binds.len()
                ),
            )));
        }
        let Some(row) = self.rows.pop_front() else {
            self.current = None;
            return Ok(false);
        };
        let filled = binds
            .iter_mut()
            .zip(&row)
            .enumerate()
            .try_for_each(|(column, (bind, value))| fill_bind(column, bind, value));
        self.current = Some(row);
        filled.map_err(|err| self.fail(err))?;
        Ok(true)
    }

    /// Copy bytes of `column` in the current row, starting at `offset`.
    ///
    /// Returns the number of bytes written into `buf`.
    ///
    /// # Errors
    ///
    /// Returns `NO_CURRENT_ROW` before the first fetch or after exhaustion and
    /// `INVALID_COLUMN` for an out-of-range column.
    pub fn fetch_column(
        &mut self,
        column: usize,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, NativeError> {
        let copied = match self.current.as_ref() {
            None => Err(NativeError::client(
                codes::NO_CURRENT_ROW,
                "no current row to fetch a column from",
            )),
            Some(row) => match row.get(column) {
                None => Err(NativeError::client(
                    codes::INVALID_COLUMN,
                    format!("column {column} out of range"),
                )),
                Some(value) => {
                    let bytes = value.bytes();
                    let available = bytes.get(offset..).unwrap_or(&[]);
                    let n = available.len().min(buf.len());
                    buf[..n].copy_from_slice(&available[..n]);
                    Ok(n)
                }
            },
        };
        copied.map_err(|err| self.fail(err))
    }

    /// Discard any stored result rows.
    pub fn free_result(&mut self) {
        self.rows.clear();
        self.current = None;
    }

    fn fail(&mut self, err: NativeError) -> NativeError {
        self.last_error = Some(err.clone());
        err
    }
}

fn fill_bind(column: usize, bind: &mut ResultBind, value: &StoredValue) -> Result<(), NativeError> {
    bind.clear();
    if matches!(value, StoredValue::Null) {
        bind.is_null = true;
        return Ok(());
    }
    match bind.buffer_type {
        BufferType::Null => {}
        BufferType::Integer => {
            let integer = match value {
                StoredValue::Integer(i) => Some(*i),
                StoredValue::Real(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Some(*f as i64),
                _ => value.text_str().and_then(|s| s.parse().ok()),
            };
            bind.value = FixedValue::Integer(integer.ok_or_else(|| mismatch(column, "integer", value))?);
            bind.length = std::mem::size_of::<i64>();
        }
        BufferType::Double => {
            let double = match value {
                StoredValue::Integer(i) => Some(*i as f64),
                StoredValue::Real(f) => Some(*f),
                _ => value.text_str().and_then(|s| s.parse().ok()),
            };
            bind.value = FixedValue::Double(double.ok_or_else(|| mismatch(column, "double", value))?);
            bind.length = std::mem::size_of::<f64>();
        }
        BufferType::Text | BufferType::Blob => {
            bind.length = value.bytes().len();
            bind.truncated = bind.length > 0;
        }
        BufferType::Temporal(_) => {
            let text = value
                .text_str()
                .ok_or_else(|| mismatch(column, "temporal", value))?;
            bind.value = FixedValue::Time(NativeTime::parse(text)?);
            bind.length = std::mem::size_of::<NativeTime>();
        }
    }
    Ok(())
}

fn mismatch(column: usize, wanted: &str, value: &StoredValue) -> NativeError {
    NativeError::client(
        codes::TYPE_MISMATCH,
        format!("column {column}: cannot fetch {} value into {wanted} buffer", value.kind()),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_binds_report_length_only() {
        let mut bind = ResultBind::new(BufferType::Blob);
        fill_bind(0, &mut bind, &StoredValue::Blob(vec![7; 300])).unwrap();
        assert_eq!(bind.length, 300);
        assert!(bind.truncated);
        assert_eq!(bind.value, FixedValue::Empty);
    }

    #[test]
    fn integer_buffer_rejects_blob() {
        let mut bind = ResultBind::new(BufferType::Integer);
        let err = fill_bind(2, &mut bind, &StoredValue::Blob(vec![1])).unwrap_err();
        assert_eq!(err.code, codes::TYPE_MISMATCH);
    }

    #[test]
    fn numeric_text_fills_integer_buffer() {
        let mut bind = ResultBind::new(BufferType::Integer);
        fill_bind(0, &mut bind, &StoredValue::Text(b" 42 ".to_vec())).unwrap();
        assert_eq!(bind.value, FixedValue::Integer(42));
    }
}
