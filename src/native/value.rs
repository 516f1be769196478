use super::time::{NativeTime, TimeKind};

/// Buffer type of one bind entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferType {
    /// Always NULL on the way out; values are discarded on the way in.
    Null,
    Integer,
    Double,
    Text,
    Blob,
    Temporal(TimeKind),
}

impl BufferType {
    /// Chunked buffers are probed for their length before being fetched.
    #[must_use]
    pub fn is_chunked(self) -> bool {
        matches!(self, BufferType::Text | BufferType::Blob)
    }
}

/// One outgoing parameter value. Chunked values borrow their bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NativeValue<'a> {
    Null,
    Integer(i64),
    Unsigned(u64),
    Double(f64),
    Text(&'a [u8]),
    Blob(&'a [u8]),
    Time(&'a NativeTime),
}

impl NativeValue<'_> {
    #[must_use]
    pub fn buffer_type(&self) -> BufferType {
        match self {
            NativeValue::Null => BufferType::Null,
            NativeValue::Integer(_) | NativeValue::Unsigned(_) => BufferType::Integer,
            NativeValue::Double(_) => BufferType::Double,
            NativeValue::Text(_) => BufferType::Text,
            NativeValue::Blob(_) => BufferType::Blob,
            NativeValue::Time(t) => BufferType::Temporal(t.kind),
        }
    }
}

/// Positional parameter bind array handed to a statement handle.
#[derive(Debug, Default)]
pub struct BindArray<'a> {
    values: Vec<NativeValue<'a>>,
}

impl<'a> BindArray<'a> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, value: NativeValue<'a>) {
        self.values.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[NativeValue<'a>] {
        &self.values
    }

    pub(crate) fn into_values(self) -> Vec<NativeValue<'a>> {
        self.values
    }
}

impl<'a> FromIterator<NativeValue<'a>> for BindArray<'a> {
    fn from_iter<I: IntoIterator<Item = NativeValue<'a>>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Fixed-size payload written by a fetch.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FixedValue {
    #[default]
    Empty,
    Integer(i64),
    Double(f64),
    Time(NativeTime),
}

/// Result bind descriptor for one column.
///
/// Chunked buffer types have zero capacity: a fetch only reports their true
/// `length` and sets `truncated`; the bytes are read with
/// [`super::StatementHandle::fetch_column`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResultBind {
    pub buffer_type: BufferType,
    pub value: FixedValue,
    pub length: usize,
    pub is_null: bool,
    pub truncated: bool,
}

impl ResultBind {
    #[must_use]
    pub fn new(buffer_type: BufferType) -> Self {
        Self {
            buffer_type,
            value: FixedValue::Empty,
            length: 0,
            is_null: false,
            truncated: false,
        }
    }

    pub(crate) fn clear(&mut self) {
        self.value = FixedValue::Empty;
        self.length = 0;
        self.is_null = false;
        self.truncated = false;
    }
}
