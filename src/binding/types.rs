use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::Value as JsonValue;

/// Semantic type of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticType {
    Integer,
    Float,
    FixedText,
    VariableText,
    VariableBytes,
    Date,
    Time,
    DateTime,
    NullFlag,
}

/// Declared byte width of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteWidth {
    Fixed(usize),
    Unbounded,
}

/// External representation of a text slot inside the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Representation {
    /// Stored as the backend stores it (UTF-8 bytes or plain values).
    Native,
    /// UTF-16 code units, transcoded at the boundary.
    Utf16,
    /// A JSON document serialized to text at the boundary.
    Json,
}

/// Type information a [`Column`] contributes to a slot descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SqlType {
    pub semantic: SemanticType,
    pub width: ByteWidth,
    pub nullable: bool,
    pub representation: Representation,
}

impl SqlType {
    #[must_use]
    pub const fn new(semantic: SemanticType, width: ByteWidth) -> Self {
        Self {
            semantic,
            width,
            nullable: false,
            representation: Representation::Native,
        }
    }

    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[must_use]
    pub const fn represented_as(mut self, representation: Representation) -> Self {
        self.representation = representation;
        self
    }
}

/// Text held as UTF-16 code units.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct WideText(pub Vec<u16>);

impl WideText {
    #[must_use]
    pub fn from_text(text: &str) -> Self {
        Self(text.encode_utf16().collect())
    }

    #[must_use]
    pub fn units(&self) -> &[u16] {
        &self.0
    }

    /// Decode to a `String`; `None` if the units hold an unpaired surrogate.
    #[must_use]
    pub fn to_string_lossless(&self) -> Option<String> {
        String::from_utf16(&self.0).ok()
    }
}

impl From<&str> for WideText {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

/// Inline text of at most `N` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedText<const N: usize> {
    buf: [u8; N],
    len: usize,
}

impl<const N: usize> Default for FixedText<N> {
    fn default() -> Self {
        Self {
            buf: [0; N],
            len: 0,
        }
    }
}

impl<const N: usize> FixedText<N> {
    /// `None` if `bytes` is longer than `N`.
    #[must_use]
    pub fn new(bytes: &[u8]) -> Option<Self> {
        let mut out = Self::default();
        out.assign(bytes).ok()?;
        Some(out)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(self.as_bytes()).ok()
    }

    fn assign(&mut self, bytes: &[u8]) -> Result<(), String> {
        if bytes.len() > N {
            return Err(format!(
                "value of {} bytes exceeds fixed width {N}",
                bytes.len()
            ));
        }
        self.buf[..bytes.len()].copy_from_slice(bytes);
        self.buf[bytes.len()..].fill(0);
        self.len = bytes.len();
        Ok(())
    }
}

/// Marker column that always binds NULL and only accepts NULL back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Null;

/// Read-only view of a record field, used when binding parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldRef<'a> {
    Null,
    Int(i64),
    UInt(u64),
    Float(f64),
    FixedText(&'a [u8]),
    Text(&'a str),
    Bytes(&'a [u8]),
    Wide(&'a [u16]),
    Json(&'a JsonValue),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

/// Writable destination for a field of type `T`.
#[derive(Debug)]
pub enum Target<'a, T> {
    Required(&'a mut T),
    Nullable(&'a mut Option<T>),
}

impl<T> Target<'_, T> {
    /// Store `value`; `None` into a required field is an error.
    ///
    /// # Errors
    ///
    /// Returns a message when NULL is written to a non-nullable field.
    pub fn set(&mut self, value: Option<T>) -> Result<(), String> {
        match (self, value) {
            (Target::Required(slot), Some(v)) => **slot = v,
            (Target::Nullable(slot), v) => **slot = v,
            (Target::Required(_), None) => {
                return Err("NULL fetched into a non-nullable field".into());
            }
        }
        Ok(())
    }
}

impl<T: Default> Target<'_, T> {
    /// Take the current value (or a default) so its allocation can be reused.
    pub fn take(&mut self) -> T {
        match self {
            Target::Required(slot) => std::mem::take(*slot),
            Target::Nullable(slot) => slot.take().unwrap_or_default(),
        }
    }
}

/// Destination for fixed-width text fields of any capacity.
pub trait FixedTextSlot {
    fn capacity(&self) -> usize;

    /// # Errors
    ///
    /// Returns a message when the value does not fit or NULL is not allowed.
    fn set_bytes(&mut self, bytes: Option<&[u8]>) -> Result<(), String>;
}

impl<const N: usize> FixedTextSlot for FixedText<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn set_bytes(&mut self, bytes: Option<&[u8]>) -> Result<(), String> {
        match bytes {
            Some(bytes) => self.assign(bytes),
            None => Err("NULL fetched into a non-nullable field".into()),
        }
    }
}

impl<const N: usize> FixedTextSlot for Option<FixedText<N>> {
    fn capacity(&self) -> usize {
        N
    }

    fn set_bytes(&mut self, bytes: Option<&[u8]>) -> Result<(), String> {
        match bytes {
            Some(bytes) => {
                let mut text = FixedText::<N>::default();
                text.assign(bytes)?;
                *self = Some(text);
            }
            None => *self = None,
        }
        Ok(())
    }
}

/// Mutable view of a record field, used when reading results.
pub enum FieldMut<'a> {
    Null,
    Bool(Target<'a, bool>),
    I8(Target<'a, i8>),
    I16(Target<'a, i16>),
    I32(Target<'a, i32>),
    I64(Target<'a, i64>),
    U8(Target<'a, u8>),
    U16(Target<'a, u16>),
    U32(Target<'a, u32>),
    U64(Target<'a, u64>),
    F32(Target<'a, f32>),
    F64(Target<'a, f64>),
    FixedText(&'a mut dyn FixedTextSlot),
    Text(Target<'a, String>),
    Bytes(Target<'a, Vec<u8>>),
    Wide(Target<'a, WideText>),
    Json(Target<'a, JsonValue>),
    Date(Target<'a, NaiveDate>),
    Time(Target<'a, NaiveTime>),
    DateTime(Target<'a, NaiveDateTime>),
}

/// A Rust type that maps onto one statement slot.
pub trait Column {
    const SQL_TYPE: SqlType;

    fn field(&self) -> FieldRef<'_>;

    fn field_mut(&mut self) -> FieldMut<'_>;
}

/// Slot type of a column value, for macro-generated records.
#[must_use]
pub fn sql_type_of<C: Column>(_: &C) -> SqlType {
    C::SQL_TYPE
}

macro_rules! impl_column {
    ($ty:ty, $sql:expr, $variant:ident, |$v:ident| $to_field:expr) => {
        impl Column for $ty {
            const SQL_TYPE: SqlType = $sql;

            fn field(&self) -> FieldRef<'_> {
                let $v = self;
                $to_field
            }

            fn field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::$variant(Target::Required(self))
            }
        }

        impl Column for Option<$ty> {
            const SQL_TYPE: SqlType = $sql.nullable();

            fn field(&self) -> FieldRef<'_> {
                match self {
                    Some($v) => $to_field,
                    None => FieldRef::Null,
                }
            }

            fn field_mut(&mut self) -> FieldMut<'_> {
                FieldMut::$variant(Target::Nullable(self))
            }
        }
    };
}

const fn fixed(semantic: SemanticType, width: usize) -> SqlType {
    SqlType::new(semantic, ByteWidth::Fixed(width))
}

const fn unbounded(semantic: SemanticType) -> SqlType {
    SqlType::new(semantic, ByteWidth::Unbounded)
}

const TIME_WIDTH: usize = std::mem::size_of::<crate::native::NativeTime>();

impl_column!(bool, fixed(SemanticType::Integer, 1), Bool, |v| FieldRef::Int(i64::from(*v)));
impl_column!(i8, fixed(SemanticType::Integer, 1), I8, |v| FieldRef::Int(i64::from(*v)));
impl_column!(i16, fixed(SemanticType::Integer, 2), I16, |v| FieldRef::Int(i64::from(*v)));
impl_column!(i32, fixed(SemanticType::Integer, 4), I32, |v| FieldRef::Int(i64::from(*v)));
impl_column!(i64, fixed(SemanticType::Integer, 8), I64, |v| FieldRef::Int(*v));
impl_column!(u8, fixed(SemanticType::Integer, 1), U8, |v| FieldRef::UInt(u64::from(*v)));
impl_column!(u16, fixed(SemanticType::Integer, 2), U16, |v| FieldRef::UInt(u64::from(*v)));
impl_column!(u32, fixed(SemanticType::Integer, 4), U32, |v| FieldRef::UInt(u64::from(*v)));
impl_column!(u64, fixed(SemanticType::Integer, 8), U64, |v| FieldRef::UInt(*v));
impl_column!(f32, fixed(SemanticType::Float, 4), F32, |v| FieldRef::Float(f64::from(*v)));
impl_column!(f64, fixed(SemanticType::Float, 8), F64, |v| FieldRef::Float(*v));
impl_column!(String, unbounded(SemanticType::VariableText), Text, |v| FieldRef::Text(v.as_str()));
impl_column!(Vec<u8>, unbounded(SemanticType::VariableBytes), Bytes, |v| FieldRef::Bytes(v.as_slice()));
impl_column!(
    WideText,
    unbounded(SemanticType::VariableText).represented_as(Representation::Utf16),
    Wide,
    |v| FieldRef::Wide(v.units())
);
impl_column!(
    JsonValue,
    unbounded(SemanticType::VariableText).represented_as(Representation::Json),
    Json,
    |v| FieldRef::Json(v)
);
impl_column!(NaiveDate, fixed(SemanticType::Date, TIME_WIDTH), Date, |v| FieldRef::Date(*v));
impl_column!(NaiveTime, fixed(SemanticType::Time, TIME_WIDTH), Time, |v| FieldRef::Time(*v));
impl_column!(NaiveDateTime, fixed(SemanticType::DateTime, TIME_WIDTH), DateTime, |v| {
    FieldRef::DateTime(*v)
});

impl<const N: usize> Column for FixedText<N> {
    const SQL_TYPE: SqlType = fixed(SemanticType::FixedText, N);

    fn field(&self) -> FieldRef<'_> {
        FieldRef::FixedText(self.as_bytes())
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::FixedText(self)
    }
}

impl<const N: usize> Column for Option<FixedText<N>> {
    const SQL_TYPE: SqlType = fixed(SemanticType::FixedText, N).nullable();

    fn field(&self) -> FieldRef<'_> {
        match self {
            Some(text) => FieldRef::FixedText(text.as_bytes()),
            None => FieldRef::Null,
        }
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::FixedText(self)
    }
}

impl Column for Null {
    const SQL_TYPE: SqlType = fixed(SemanticType::NullFlag, 0).nullable();

    fn field(&self) -> FieldRef<'_> {
        FieldRef::Null
    }

    fn field_mut(&mut self) -> FieldMut<'_> {
        FieldMut::Null
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_columns_are_nullable() {
        assert!(!<i32 as Column>::SQL_TYPE.nullable);
        assert!(<Option<i32> as Column>::SQL_TYPE.nullable);
        assert_eq!(<Option<String> as Column>::SQL_TYPE.width, ByteWidth::Unbounded);
    }

    #[test]
    fn fixed_text_rejects_overflow() {
        assert!(FixedText::<3>::new(b"abcd").is_none());
        let text = FixedText::<4>::new(b"ab").unwrap();
        assert_eq!(text.as_str(), Some("ab"));
    }

    #[test]
    fn required_target_rejects_null() {
        let mut value = 5i64;
        let mut target = Target::Required(&mut value);
        assert!(target.set(None).is_err());
        assert!(target.set(Some(9)).is_ok());
        assert_eq!(value, 9);
    }
}
