use crate::error::{Side, SqlBindError};
use crate::native::{BindArray, BufferType, FixedValue, NativeValue, ResultBind, StatementHandle};

use super::converter::{Converter, Failure, buffer_type_for};
use super::descriptor::SlotDescriptor;
use super::record::Record;
use super::types::{FieldMut, FieldRef};

/// Length and null indicator of one parameter entry, as last bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BindEntry {
    pub(crate) buffer_type: BufferType,
    pub(crate) length: usize,
    pub(crate) is_null: bool,
}

/// Parameter-side binding table. Entry `i` always corresponds to slot `i`.
#[derive(Debug)]
pub(crate) struct ParamBindings {
    entries: Vec<BindEntry>,
    converters: Vec<Option<Converter>>,
}

impl ParamBindings {
    pub(crate) fn new(slots: &[SlotDescriptor]) -> Self {
        Self {
            entries: slots
                .iter()
                .map(|slot| BindEntry {
                    buffer_type: buffer_type_for(slot),
                    length: 0,
                    is_null: false,
                })
                .collect(),
            converters: slots.iter().map(Converter::for_slot).collect(),
        }
    }

    /// Bytes carried by the non-null entries of the last refresh.
    pub(crate) fn bound_bytes(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| !entry.is_null)
            .map(|entry| entry.length)
            .sum()
    }

    #[cfg(test)]
    pub(crate) fn entries(&self) -> &[BindEntry] {
        &self.entries
    }

    /// Refresh every entry from `record` and build the outgoing bind array.
    ///
    /// Converted values borrow the converters' scratch buffers; unconverted
    /// text and bytes borrow the record itself.
    pub(crate) fn refresh<'a, P: Record + ?Sized>(
        &'a mut self,
        record: &'a P,
    ) -> Result<BindArray<'a>, SqlBindError> {
        let mut binds = BindArray::with_capacity(self.entries.len());
        let slots = self.entries.iter_mut().zip(self.converters.iter_mut());
        for (index, (entry, converter)) in slots.enumerate() {
            let field = record.field(index).ok_or_else(|| {
                SqlBindError::conversion(Side::Parameters, index, "record has no field at this slot")
            })?;
            let value = match (field, converter) {
                (FieldRef::Null, _) => NativeValue::Null,
                (field, Some(converter)) => converter
                    .bind_param(field)
                    .map_err(|message| SqlBindError::conversion(Side::Parameters, index, message))?,
                (field, None) => direct_value(field).ok_or_else(|| {
                    SqlBindError::conversion(
                        Side::Parameters,
                        index,
                        format!("field {field:?} cannot be bound directly"),
                    )
                })?,
            };
            let kind = value.buffer_type();
            if kind != BufferType::Null && kind != entry.buffer_type {
                return Err(SqlBindError::conversion(
                    Side::Parameters,
                    index,
                    format!("{kind:?} value does not fit a {:?} slot", entry.buffer_type),
                ));
            }
            entry.is_null = kind == BufferType::Null;
            entry.length = value_length(&value);
            binds.push(value);
        }
        Ok(binds)
    }
}

fn direct_value(field: FieldRef<'_>) -> Option<NativeValue<'static>> {
    match field {
        FieldRef::Null => Some(NativeValue::Null),
        FieldRef::Int(i) => Some(NativeValue::Integer(i)),
        FieldRef::UInt(u) => Some(NativeValue::Unsigned(u)),
        FieldRef::Float(f) => Some(NativeValue::Double(f)),
        _ => None,
    }
}

fn value_length(value: &NativeValue<'_>) -> usize {
    match value {
        NativeValue::Null => 0,
        NativeValue::Integer(_) | NativeValue::Unsigned(_) | NativeValue::Double(_) => 8,
        NativeValue::Text(bytes) | NativeValue::Blob(bytes) => bytes.len(),
        NativeValue::Time(_) => std::mem::size_of::<crate::native::NativeTime>(),
    }
}

/// Result-side binding table. Bind `i` always corresponds to column `i`.
#[derive(Debug)]
pub(crate) struct ResultBindings {
    binds: Vec<ResultBind>,
    converters: Vec<Option<Converter>>,
}

impl ResultBindings {
    pub(crate) fn new(slots: &[SlotDescriptor]) -> Self {
        Self {
            binds: slots
                .iter()
                .map(|slot| ResultBind::new(buffer_type_for(slot)))
                .collect(),
            converters: slots.iter().map(Converter::for_slot).collect(),
        }
    }

    /// Fetch the next row into `record`. Returns `false` when exhausted.
    pub(crate) fn read_row<R: Record + ?Sized>(
        &mut self,
        handle: &mut StatementHandle,
        record: &mut R,
    ) -> Result<bool, SqlBindError> {
        if !handle
            .fetch_row(&mut self.binds)
            .map_err(|err| SqlBindError::statement(&err))?
        {
            return Ok(false);
        }
        let columns = self.binds.iter().zip(self.converters.iter_mut());
        for (index, (bind, converter)) in columns.enumerate() {
            let target = record.field_mut(index).ok_or_else(|| {
                SqlBindError::conversion(Side::Results, index, "record has no field at this slot")
            })?;
            let stored = if bind.is_null {
                set_null(target).map_err(Failure::Conversion)
            } else if let Some(converter) = converter {
                converter.store_result(handle, index, bind, target)
            } else {
                store_direct(bind, target).map_err(Failure::Conversion)
            };
            stored.map_err(|failure| match failure {
                Failure::Native(err) => SqlBindError::statement(&err),
                Failure::Conversion(message) => {
                    SqlBindError::conversion(Side::Results, index, message)
                }
            })?;
        }
        Ok(true)
    }
}

fn set_null(target: FieldMut<'_>) -> Result<(), String> {
    match target {
        FieldMut::Null => Ok(()),
        FieldMut::Bool(mut t) => t.set(None),
        FieldMut::I8(mut t) => t.set(None),
        FieldMut::I16(mut t) => t.set(None),
        FieldMut::I32(mut t) => t.set(None),
        FieldMut::I64(mut t) => t.set(None),
        FieldMut::U8(mut t) => t.set(None),
        FieldMut::U16(mut t) => t.set(None),
        FieldMut::U32(mut t) => t.set(None),
        FieldMut::U64(mut t) => t.set(None),
        FieldMut::F32(mut t) => t.set(None),
        FieldMut::F64(mut t) => t.set(None),
        FieldMut::FixedText(slot) => slot.set_bytes(None),
        FieldMut::Text(mut t) => t.set(None),
        FieldMut::Bytes(mut t) => t.set(None),
        FieldMut::Wide(mut t) => t.set(None),
        FieldMut::Json(mut t) => t.set(None),
        FieldMut::Date(mut t) => t.set(None),
        FieldMut::Time(mut t) => t.set(None),
        FieldMut::DateTime(mut t) => t.set(None),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64) -> Result<T, String> {
    T::try_from(value).map_err(|_| {
        format!(
            "value {value} out of range for {}",
            std::any::type_name::<T>()
        )
    })
}

#[allow(clippy::cast_possible_truncation)]
fn store_direct(bind: &ResultBind, target: FieldMut<'_>) -> Result<(), String> {
    match (bind.value, target) {
        (FixedValue::Integer(i), FieldMut::Bool(mut t)) => t.set(Some(i != 0)),
        (FixedValue::Integer(i), FieldMut::I8(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Integer(i), FieldMut::I16(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Integer(i), FieldMut::I32(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Integer(i), FieldMut::I64(mut t)) => t.set(Some(i)),
        (FixedValue::Integer(i), FieldMut::U8(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Integer(i), FieldMut::U16(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Integer(i), FieldMut::U32(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Integer(i), FieldMut::U64(mut t)) => t.set(Some(narrow(i)?)),
        (FixedValue::Double(f), FieldMut::F32(mut t)) => t.set(Some(f as f32)),
        (FixedValue::Double(f), FieldMut::F64(mut t)) => t.set(Some(f)),
        (_, FieldMut::Null) => Err("NULL-only column received a value".into()),
        (value, _) => Err(format!("fetched {value:?} does not match the field type")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::descriptor::build_slots;
    use crate::binding::types::{FixedText, WideText};

    fn params_for<P: Record>(template: &P) -> ParamBindings {
        let slots = build_slots(template, template.slot_count(), Side::Parameters).unwrap();
        ParamBindings::new(&slots)
    }

    #[test]
    fn refresh_tracks_lengths_and_nulls() {
        let record = (42i64, String::from("hello"), None::<Vec<u8>>);
        let mut table = params_for(&record);
        let binds = table.refresh(&record).unwrap();
        assert_eq!(binds.as_slice()[1], NativeValue::Text(b"hello"));
        assert_eq!(binds.as_slice()[2], NativeValue::Null);
        drop(binds);
        let entries = table.entries();
        assert_eq!(entries[1].length, 5);
        assert!(entries[2].is_null);
        assert_eq!(entries[2].buffer_type, BufferType::Blob);
    }

    #[test]
    fn wide_text_is_transcoded_before_binding() {
        let record = (WideText::from_text("grüße"),);
        let mut table = params_for(&record);
        let binds = table.refresh(&record).unwrap();
        assert_eq!(binds.as_slice()[0], NativeValue::Text("grüße".as_bytes()));
    }

    #[test]
    fn unpaired_surrogate_fails_the_parameter() {
        let record = (1i32, WideText(vec![0xDC00]));
        let mut table = params_for(&record);
        let err = table.refresh(&record).unwrap_err();
        assert!(matches!(
            err,
            SqlBindError::ConversionError {
                side: Side::Parameters,
                index: 1,
                ..
            }
        ));
    }

    #[test]
    fn fixed_text_is_copied_through_scratch() {
        let record = (FixedText::<8>::new(b"abc").unwrap(),);
        let mut table = params_for(&record);
        let binds = table.refresh(&record).unwrap();
        assert_eq!(binds.as_slice()[0], NativeValue::Text(b"abc"));
    }

    #[test]
    fn integer_narrowing_is_range_checked() {
        let mut small = 0i8;
        let mut bind = ResultBind::new(BufferType::Integer);
        bind.value = FixedValue::Integer(300);
        let err = store_direct(&bind, FieldMut::I8(crate::binding::Target::Required(&mut small)));
        assert!(err.is_err());
        bind.value = FixedValue::Integer(-7);
        store_direct(&bind, FieldMut::I8(crate::binding::Target::Required(&mut small))).unwrap();
        assert_eq!(small, -7);
    }

    #[test]
    fn null_into_required_field_is_rejected() {
        let mut value = String::from("keep");
        assert!(set_null(FieldMut::Text(crate::binding::Target::Required(&mut value))).is_err());
        let mut maybe = Some(3u16);
        set_null(FieldMut::U16(crate::binding::Target::Nullable(&mut maybe))).unwrap();
        assert_eq!(maybe, None);
    }
}
