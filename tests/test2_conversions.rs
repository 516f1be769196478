use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::json;
use sqlbind::prelude::*;
use sqlbind::Side;

fn memory() -> Result<Connection, SqlBindError> {
    Connection::connect(ConnectOptions::new(":memory:"))
}

fn echo<T>(conn: &Connection, value: T) -> Result<T, SqlBindError>
where
    T: Column + Default + Clone,
{
    let stmt = Statement::<(T,), (T,)>::prepare(conn, "SELECT ?")?;
    let mut row = (T::default(),);
    assert!(stmt.execute_one(&(value,), &mut row)?);
    Ok(row.0)
}

#[test]
fn scalar_values_round_trip() -> Result<(), SqlBindError> {
    let conn = memory()?;
    assert!(echo(&conn, true)?);
    assert_eq!(echo(&conn, -12i8)?, -12);
    assert_eq!(echo(&conn, 40_000u32)?, 40_000);
    assert_eq!(echo(&conn, i64::MIN)?, i64::MIN);
    assert_eq!(echo(&conn, 2.5f32)?, 2.5);
    assert_eq!(echo(&conn, Some(7u16))?, Some(7));
    assert_eq!(echo(&conn, None::<f64>)?, None);
    Ok(())
}

#[test]
fn chunked_values_keep_exact_lengths() -> Result<(), SqlBindError> {
    let conn = memory()?;
    for len in [0usize, 1, 255, 1 << 20] {
        let bytes: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        assert_eq!(echo(&conn, bytes.clone())?, bytes, "blob of {len} bytes");

        let text: String = "ab€".chars().cycle().take(len).collect();
        assert_eq!(echo(&conn, text.clone())?, text, "text of {len} chars");
    }
    assert_eq!(echo(&conn, None::<Vec<u8>>)?, None);
    Ok(())
}

#[test]
fn wide_text_is_transcoded_both_ways() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let wide = WideText::from_text("naïve 🦀 text");
    assert_eq!(echo(&conn, wide.clone())?, wide);

    let as_utf8 = Statement::<(WideText,), (String,)>::prepare(&conn, "SELECT ?")?;
    assert_eq!(as_utf8.fetch_all(&(wide,))?, vec![("naïve 🦀 text".to_string(),)]);
    Ok(())
}

#[test]
fn unpaired_surrogate_fails_only_that_execution() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let stmt = Statement::<(WideText,), (String,)>::prepare(&conn, "SELECT ?")?;
    let err = stmt.fetch_all(&(WideText(vec![0x0041, 0xD83D]),)).unwrap_err();
    assert!(
        matches!(err, SqlBindError::ConversionError { side: Side::Parameters, index: 0, .. }),
        "{err:?}"
    );
    assert_eq!(stmt.fetch_all(&(WideText::from("ok"),))?, vec![("ok".to_string(),)]);
    Ok(())
}

#[test]
fn invalid_utf8_from_engine_is_conversion_error() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let wide = Statement::<(), (WideText,)>::prepare(&conn, "SELECT X'41E282'")?;
    let err = wide.fetch_all(&()).unwrap_err();
    assert!(
        matches!(err, SqlBindError::ConversionError { side: Side::Results, index: 0, .. }),
        "{err:?}"
    );

    let text = Statement::<(), (String,)>::prepare(&conn, "SELECT X'FF'")?;
    assert!(matches!(
        text.fetch_all(&()),
        Err(SqlBindError::ConversionError { side: Side::Results, .. })
    ));
    Ok(())
}

#[test]
fn json_documents_are_serialized_as_text() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let doc = json!({"name": "widget", "tags": ["a", "b"], "qty": 3});
    assert_eq!(echo(&conn, doc.clone())?, doc);

    let stmt = Statement::<(serde_json::Value,), (i64,)>::prepare(&conn, "SELECT json_extract(?, '$.qty')")?;
    assert_eq!(stmt.fetch_all(&(doc,))?, vec![(3,)]);
    Ok(())
}

#[test]
fn temporal_values_round_trip() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let date = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
    let time = NaiveTime::from_hms_micro_opt(23, 59, 58, 125_000).unwrap();
    let stamp = NaiveDateTime::new(date, time);
    assert_eq!(echo(&conn, date)?, date);
    assert_eq!(echo(&conn, time)?, time);
    assert_eq!(echo(&conn, stamp)?, stamp);
    assert_eq!(echo(&conn, None::<NaiveDate>)?, None);

    let stored = Statement::<(), (NaiveDateTime,)>::prepare(&conn, "SELECT '2024-02-29T06:07:08'")?;
    let expected = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap().and_hms_opt(6, 7, 8).unwrap();
    assert_eq!(stored.fetch_all(&())?, vec![(expected,)]);

    let time_as_date = Statement::<(), (NaiveDate,)>::prepare(&conn, "SELECT '10:11:12'")?;
    assert!(matches!(
        time_as_date.fetch_all(&()),
        Err(SqlBindError::ConversionError { .. })
    ));
    Ok(())
}

#[test]
fn leap_seconds_are_rejected_on_bind() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let leap = NaiveTime::from_hms_micro_opt(23, 59, 59, 1_500_000).unwrap();
    let stmt = Statement::<(NaiveTime,), (NaiveTime,)>::prepare(&conn, "SELECT ?")?;
    let err = stmt.fetch_all(&(leap,)).unwrap_err();
    assert!(
        matches!(err, SqlBindError::ConversionError { side: Side::Parameters, index: 0, .. }),
        "{err:?}"
    );

    let stamp = NaiveDate::from_ymd_opt(2016, 12, 31).unwrap().and_time(leap);
    let stamps = Statement::<(NaiveDateTime,), (NaiveDateTime,)>::prepare(&conn, "SELECT ?")?;
    assert!(matches!(
        stamps.fetch_all(&(stamp,)),
        Err(SqlBindError::ConversionError { side: Side::Parameters, .. })
    ));

    let ordinary = NaiveTime::from_hms_micro_opt(23, 59, 59, 500_000).unwrap();
    assert_eq!(stmt.fetch_all(&(ordinary,))?, vec![(ordinary,)]);
    Ok(())
}

#[test]
fn fixed_text_never_truncates() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let short = FixedText::<8>::new(b"abc").unwrap();
    assert_eq!(echo(&conn, short)?.as_str(), Some("abc"));

    let stmt = Statement::<(), (FixedText<4>,)>::prepare(&conn, "SELECT 'abcdef'")?;
    assert!(matches!(
        stmt.fetch_all(&()),
        Err(SqlBindError::ConversionError { side: Side::Results, index: 0, .. })
    ));

    let nullable = Statement::<(), (Option<FixedText<4>>,)>::prepare(&conn, "SELECT NULL")?;
    assert_eq!(nullable.fetch_all(&())?, vec![(None,)]);
    Ok(())
}

#[test]
fn null_and_range_violations_are_conversion_errors() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let required = Statement::<(), (i64,)>::prepare(&conn, "SELECT NULL")?;
    assert!(matches!(
        required.fetch_all(&()),
        Err(SqlBindError::ConversionError { .. })
    ));

    let narrow = Statement::<(), (i8,)>::prepare(&conn, "SELECT 300")?;
    assert!(matches!(narrow.fetch_all(&()), Err(SqlBindError::ConversionError { .. })));

    let flag = Statement::<(), (Null, i32)>::prepare(&conn, "SELECT NULL, 5")?;
    assert_eq!(flag.fetch_all(&())?, vec![(Null, 5)]);
    Ok(())
}

#[test]
fn engine_type_mismatch_is_statement_error() -> Result<(), SqlBindError> {
    let conn = memory()?;
    let stmt = Statement::<(), (i64,)>::prepare(&conn, "SELECT 'not a number'")?;
    assert!(matches!(stmt.fetch_all(&()), Err(SqlBindError::StatementError(_))));

    let unsigned = Statement::<(u64,), (i64,)>::prepare(&conn, "SELECT ?")?;
    let err = unsigned.fetch_all(&(u64::MAX,)).unwrap_err();
    assert_eq!(err.code(), Some(sqlbind::native::codes::OUT_OF_RANGE));
    Ok(())
}
