use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use super::{NativeError, codes};

/// Which calendar fields of a [`NativeTime`] are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeKind {
    Date,
    Time,
    DateTime,
}

/// Composite calendar value exchanged with temporal buffers.
///
/// Unused fields are zero: a `Date` carries no clock fields and a `Time`
/// carries no calendar fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub microsecond: u32,
    pub kind: TimeKind,
}

impl Default for NativeTime {
    fn default() -> Self {
        Self {
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            microsecond: 0,
            kind: TimeKind::DateTime,
        }
    }
}

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

impl NativeTime {
    /// Storage text for the engine (ISO-8601, microseconds only when non-zero).
    #[must_use]
    pub fn to_text(&self) -> String {
        let date = format!("{:04}-{:02}-{:02}", self.year, self.month, self.day);
        let mut clock = format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second);
        if self.microsecond != 0 {
            clock.push_str(&format!(".{:06}", self.microsecond));
        }
        match self.kind {
            TimeKind::Date => date,
            TimeKind::Time => clock,
            TimeKind::DateTime => format!("{date} {clock}"),
        }
    }

    /// Parse storage text; the detected layout decides the kind.
    ///
    /// # Errors
    ///
    /// Returns a `TYPE_MISMATCH` native error when the text is not a date,
    /// time or datetime.
    pub fn parse(text: &str) -> Result<Self, NativeError> {
        let text = text.trim();
        for format in DATETIME_FORMATS {
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
                return Ok(Self::from_parts(Some(dt.date()), Some(dt.time())));
            }
        }
        if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
            return Ok(Self::from_parts(Some(date), None));
        }
        if let Ok(time) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
            return Ok(Self::from_parts(None, Some(time)));
        }
        Err(NativeError::client(
            codes::TYPE_MISMATCH,
            format!("value {text:?} is not a date, time or datetime"),
        ))
    }

    fn from_parts(date: Option<NaiveDate>, time: Option<NaiveTime>) -> Self {
        let mut out = Self {
            kind: match (date, time) {
                (Some(_), None) => TimeKind::Date,
                (None, Some(_)) => TimeKind::Time,
                _ => TimeKind::DateTime,
            },
            ..Self::default()
        };
        if let Some(date) = date {
            out.year = date.year();
            out.month = date.month();
            out.day = date.day();
        }
        if let Some(time) = time {
            out.hour = time.hour();
            out.minute = time.minute();
            out.second = time.second();
            out.microsecond = time.nanosecond() / 1_000;
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datetime_text_round_trip() {
        let parsed = NativeTime::parse("2024-02-29 23:59:58.000125").unwrap();
        assert_eq!(parsed.kind, TimeKind::DateTime);
        assert_eq!(parsed.microsecond, 125);
        assert_eq!(parsed.to_text(), "2024-02-29 23:59:58.000125");
    }

    #[test]
    fn date_and_time_layouts() {
        let date = NativeTime::parse("1999-12-31").unwrap();
        assert_eq!(date.kind, TimeKind::Date);
        assert_eq!((date.hour, date.minute), (0, 0));
        assert_eq!(date.to_text(), "1999-12-31");

        let time = NativeTime::parse("07:05:00").unwrap();
        assert_eq!(time.kind, TimeKind::Time);
        assert_eq!(time.year, 0);
        assert_eq!(time.to_text(), "07:05:00");
    }

    #[test]
    fn rejects_non_temporal_text() {
        let err = NativeTime::parse("tomorrow").unwrap_err();
        assert_eq!(err.code, codes::TYPE_MISMATCH);
    }
}
