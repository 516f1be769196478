use sqlbind::native::codes;
use sqlbind::prelude::*;
use sqlbind::ErrorOrigin;

#[test]
fn options_load_from_json_with_defaults() -> Result<(), SqlBindError> {
    let opts = ConnectOptions::from_json(r#"{"database": ":memory:", "worker_threads": 3}"#)?;
    assert_eq!(opts.worker_threads, 3);
    assert_eq!(opts.charset, "utf8");
    assert!(opts.flags.create);

    let conn = Connection::connect(opts)?;
    assert_eq!(conn.worker_count(), 3);
    Ok(())
}

#[test]
fn remote_host_and_foreign_charset_are_connection_errors() {
    let err = ConnectOptions::builder(":memory:")
        .host("db.example.com")
        .connect()
        .unwrap_err();
    match err {
        SqlBindError::ConnectionError(backend) => {
            assert_eq!(backend.code, codes::UNKNOWN_HOST);
            assert_eq!(backend.origin, ErrorOrigin::Session);
        }
        other => panic!("expected connection error, got {other:?}"),
    }

    let err = ConnectOptions::builder(":memory:")
        .charset("latin1")
        .connect()
        .unwrap_err();
    assert_eq!(err.code(), Some(codes::UNSUPPORTED_CHARSET));
}

#[test]
fn file_database_survives_reconnect() -> Result<(), SqlBindError> {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("store.db");
    let conn = ConnectOptions::builder(path.to_string_lossy())
        .credentials("app", "secret")
        .port(3306)
        .connect()?;
    conn.execute_batch("CREATE TABLE kv (k TEXT PRIMARY KEY, v BLOB)")?;

    let put = Statement::<(String, Vec<u8>), ()>::prepare(&conn, "INSERT INTO kv (k, v) VALUES (?, ?)")?;
    put.execute(&("alpha".into(), vec![1, 2, 3]), None, OutParams::none())?;

    conn.reconnect()?;
    let get = Statement::<(String,), (Vec<u8>,)>::prepare(&conn, "SELECT v FROM kv WHERE k = ?")?;
    assert_eq!(get.fetch_all(&("alpha".into(),))?, vec![(vec![1, 2, 3],)]);

    // statements prepared before the reconnect keep working
    put.execute(&("beta".into(), Vec::new()), None, OutParams::none())?;
    assert_eq!(get.fetch_all(&("beta".into(),))?, vec![(Vec::new(),)]);
    Ok(())
}

#[test]
fn read_only_session_rejects_writes() -> Result<(), SqlBindError> {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("ro.db");
    let path = path.to_string_lossy().into_owned();
    Connection::connect(ConnectOptions::new(path.clone()))?
        .execute_batch("CREATE TABLE t (x INTEGER)")?;

    let conn = ConnectOptions::builder(path)
        .flags(ClientFlags { read_only: true, ..ClientFlags::default() })
        .connect()?;
    let err = conn.execute_batch("INSERT INTO t VALUES (1)").unwrap_err();
    assert!(matches!(err, SqlBindError::StatementError(_)), "{err:?}");
    Ok(())
}
