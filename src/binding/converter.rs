use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::native::{
    BufferType, FixedValue, NativeError, NativeTime, NativeValue, ResultBind, StatementHandle,
    TimeKind,
};

use super::descriptor::SlotDescriptor;
use super::types::{ByteWidth, FieldMut, FieldRef, Representation, SemanticType};

/// Why a converter could not complete.
#[derive(Debug)]
pub(crate) enum Failure {
    Native(NativeError),
    Conversion(String),
}

impl From<NativeError> for Failure {
    fn from(err: NativeError) -> Self {
        Failure::Native(err)
    }
}

impl From<String> for Failure {
    fn from(message: String) -> Self {
        Failure::Conversion(message)
    }
}

/// Buffer type a slot is bound with.
pub(crate) fn buffer_type_for(slot: &SlotDescriptor) -> BufferType {
    match slot.semantic {
        SemanticType::Integer => BufferType::Integer,
        SemanticType::Float => BufferType::Double,
        SemanticType::FixedText | SemanticType::VariableText => BufferType::Text,
        SemanticType::VariableBytes => BufferType::Blob,
        SemanticType::Date => BufferType::Temporal(TimeKind::Date),
        SemanticType::Time => BufferType::Temporal(TimeKind::Time),
        SemanticType::DateTime => BufferType::Temporal(TimeKind::DateTime),
        SemanticType::NullFlag => BufferType::Null,
    }
}

/// Translator between a record field and a backend buffer.
///
/// Selected once per slot when the statement is prepared. Scratch buffers
/// live as long as the statement and are reused by every execution.
#[derive(Debug)]
pub(crate) enum Converter {
    /// Fixed-width text copied through a scratch buffer of the slot's width.
    DirectCopy { width: usize, scratch: Vec<u8> },
    /// Bytes bound in place and fetched at their probed length.
    ChunkedBytes,
    /// UTF-8 text bound in place and validated on fetch.
    ChunkedText,
    /// Text transcoded between the record's representation and UTF-8.
    Reencoded {
        representation: Representation,
        scratch: Vec<u8>,
    },
    Temporal { internal: NativeTime },
}

impl Converter {
    pub(crate) fn for_slot(slot: &SlotDescriptor) -> Option<Self> {
        if !slot.requires_conversion {
            return None;
        }
        Some(match (slot.semantic, slot.representation) {
            (SemanticType::FixedText, _) => {
                let width = match slot.width {
                    ByteWidth::Fixed(width) => width,
                    ByteWidth::Unbounded => 0,
                };
                Converter::DirectCopy {
                    width,
                    scratch: Vec::with_capacity(width),
                }
            }
            (SemanticType::VariableBytes, _) => Converter::ChunkedBytes,
            (SemanticType::VariableText, Representation::Native) => Converter::ChunkedText,
            (SemanticType::VariableText, representation) => Converter::Reencoded {
                representation,
                scratch: Vec::new(),
            },
            (SemanticType::Date, _) => Converter::temporal(TimeKind::Date),
            (SemanticType::Time, _) => Converter::temporal(TimeKind::Time),
            (SemanticType::DateTime, _) => Converter::temporal(TimeKind::DateTime),
            (SemanticType::Integer | SemanticType::Float | SemanticType::NullFlag, _) => {
                return None;
            }
        })
    }

    fn temporal(kind: TimeKind) -> Self {
        Converter::Temporal {
            internal: NativeTime {
                kind,
                ..NativeTime::default()
            },
        }
    }

    /// Produce the outgoing value for a non-null field.
    pub(crate) fn bind_param<'a>(
        &'a mut self,
        field: FieldRef<'a>,
    ) -> Result<NativeValue<'a>, String> {
        match (self, field) {
            (Converter::DirectCopy { width, scratch }, FieldRef::FixedText(bytes)) => {
                if bytes.len() > *width {
                    return Err(format!(
                        "value of {} bytes exceeds fixed width {width}",
                        bytes.len()
                    ));
                }
                scratch.clear();
                scratch.extend_from_slice(bytes);
                Ok(NativeValue::Text(scratch))
            }
            (Converter::ChunkedBytes, FieldRef::Bytes(bytes)) => Ok(NativeValue::Blob(bytes)),
            (Converter::ChunkedText, FieldRef::Text(text)) => Ok(NativeValue::Text(text.as_bytes())),
            (Converter::Reencoded { scratch, .. }, FieldRef::Wide(units)) => {
                utf16_to_utf8(units, scratch)?;
                Ok(NativeValue::Text(scratch))
            }
            (Converter::Reencoded { scratch, .. }, FieldRef::Json(value)) => {
                scratch.clear();
                serde_json::to_writer(&mut *scratch, value)
                    .map_err(|err| format!("JSON serialization failed: {err}"))?;
                Ok(NativeValue::Text(scratch))
            }
            (Converter::Temporal { internal }, FieldRef::Date(date)) => {
                *internal = native_date(date);
                Ok(NativeValue::Time(internal))
            }
            (Converter::Temporal { internal }, FieldRef::Time(time)) => {
                *internal = native_time(time)?;
                Ok(NativeValue::Time(internal))
            }
            (Converter::Temporal { internal }, FieldRef::DateTime(dt)) => {
                *internal = native_datetime(dt)?;
                Ok(NativeValue::Time(internal))
            }
            (_, field) => Err(format!("field {field:?} does not match the slot's converter")),
        }
    }

    /// Move a fetched non-null column into the record field.
    pub(crate) fn store_result(
        &mut self,
        handle: &mut StatementHandle,
        column: usize,
        bind: &ResultBind,
        target: FieldMut<'_>,
    ) -> Result<(), Failure> {
        match (self, target) {
            (Converter::DirectCopy { scratch, .. }, FieldMut::FixedText(slot)) => {
                if bind.length > slot.capacity() {
                    return Err(Failure::Conversion(format!(
                        "value of {} bytes exceeds fixed width {}",
                        bind.length,
                        slot.capacity()
                    )));
                }
                fetch_into(handle, column, bind.length, scratch)?;
                slot.set_bytes(Some(scratch.as_slice()))?;
            }
            (Converter::ChunkedBytes, FieldMut::Bytes(mut target)) => {
                let mut data = target.take();
                data.clear();
                data.resize(bind.length, 0);
                let n = handle.fetch_column(column, 0, &mut data)?;
                data.truncate(n);
                target.set(Some(data))?;
            }
            (Converter::ChunkedText, FieldMut::Text(mut target)) => {
                let mut data = target.take().into_bytes();
                data.clear();
                data.resize(bind.length, 0);
                let n = handle.fetch_column(column, 0, &mut data)?;
                data.truncate(n);
                let text = String::from_utf8(data)
                    .map_err(|err| utf8_failure(err.utf8_error()))?;
                target.set(Some(text))?;
            }
            (
                Converter::Reencoded {
                    representation: Representation::Utf16,
                    scratch,
                },
                FieldMut::Wide(mut target),
            ) => {
                fetch_into(handle, column, bind.length, scratch)?;
                let text = std::str::from_utf8(scratch).map_err(utf8_failure)?;
                let mut wide = target.take();
                wide.0.clear();
                wide.0.extend(text.encode_utf16());
                target.set(Some(wide))?;
            }
            (
                Converter::Reencoded {
                    representation: Representation::Json,
                    scratch,
                },
                FieldMut::Json(mut target),
            ) => {
                fetch_into(handle, column, bind.length, scratch)?;
                let value = serde_json::from_slice(scratch)
                    .map_err(|err| format!("JSON parse failed: {err}"))?;
                target.set(Some(value))?;
            }
            (Converter::Temporal { internal }, target) => {
                let FixedValue::Time(fetched) = bind.value else {
                    return Err(Failure::Conversion("temporal buffer holds no value".into()));
                };
                *internal = fetched;
                store_temporal(internal, target)?;
            }
            (_, _) => {
                return Err(Failure::Conversion(
                    "field does not match the slot's converter".into(),
                ));
            }
        }
        Ok(())
    }
}

fn fetch_into(
    handle: &mut StatementHandle,
    column: usize,
    length: usize,
    scratch: &mut Vec<u8>,
) -> Result<(), NativeError> {
    scratch.clear();
    scratch.resize(length, 0);
    let n = handle.fetch_column(column, 0, scratch)?;
    scratch.truncate(n);
    Ok(())
}

/// Transcode UTF-16 code units into `out`, stopping at the first unpaired surrogate.
fn utf16_to_utf8(units: &[u16], out: &mut Vec<u8>) -> Result<(), String> {
    out.clear();
    out.reserve(units.len());
    let mut position = 0usize;
    let mut encoded = [0u8; 4];
    for decoded in char::decode_utf16(units.iter().copied()) {
        let ch = decoded.map_err(|err| {
            format!(
                "unpaired surrogate 0x{:04X} at code unit {position}",
                err.unpaired_surrogate()
            )
        })?;
        out.extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
        position += ch.len_utf16();
    }
    Ok(())
}

fn utf8_failure(err: std::str::Utf8Error) -> String {
    match err.error_len() {
        None => format!(
            "incomplete multi-byte sequence at byte {}",
            err.valid_up_to()
        ),
        Some(len) => format!(
            "invalid {len}-byte sequence at byte {}",
            err.valid_up_to()
        ),
    }
}

fn native_date(date: NaiveDate) -> NativeTime {
    NativeTime {
        year: date.year(),
        month: date.month(),
        day: date.day(),
        kind: TimeKind::Date,
        ..NativeTime::default()
    }
}

/// Leap seconds have no storage form and are rejected.
fn native_time(time: NaiveTime) -> Result<NativeTime, String> {
    if time.nanosecond() >= 1_000_000_000 {
        return Err(format!("leap second {time} cannot be stored"));
    }
    Ok(NativeTime {
        hour: time.hour(),
        minute: time.minute(),
        second: time.second(),
        microsecond: time.nanosecond() / 1_000,
        kind: TimeKind::Time,
        ..NativeTime::default()
    })
}

fn native_datetime(dt: NaiveDateTime) -> Result<NativeTime, String> {
    let date = native_date(dt.date());
    let time = native_time(dt.time())?;
    Ok(NativeTime {
        hour: time.hour,
        minute: time.minute,
        second: time.second,
        microsecond: time.microsecond,
        kind: TimeKind::DateTime,
        ..date
    })
}

fn date_of(t: &NativeTime) -> Result<NaiveDate, String> {
    if t.kind == TimeKind::Time {
        return Err("time-of-day value has no calendar date".into());
    }
    NaiveDate::from_ymd_opt(t.year, t.month, t.day)
        .ok_or_else(|| format!("invalid date {:04}-{:02}-{:02}", t.year, t.month, t.day))
}

fn time_of(t: &NativeTime) -> Result<NaiveTime, String> {
    NaiveTime::from_hms_micro_opt(t.hour, t.minute, t.second, t.microsecond).ok_or_else(|| {
        format!(
            "invalid time {:02}:{:02}:{:02}.{:06}",
            t.hour, t.minute, t.second, t.microsecond
        )
    })
}

fn store_temporal(t: &NativeTime, target: FieldMut<'_>) -> Result<(), String> {
    match target {
        FieldMut::Date(mut target) => target.set(Some(date_of(t)?)),
        FieldMut::Time(mut target) => target.set(Some(time_of(t)?)),
        FieldMut::DateTime(mut target) => {
            target.set(Some(NaiveDateTime::new(date_of(t)?, time_of(t)?)))
        }
        _ => Err("field is not a date, time or datetime".into()),
    }
}
