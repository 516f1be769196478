use sqlbind::prelude::*;

#[derive(Debug, Default, Clone, PartialEq)]
struct Person {
    id: i64,
    name: String,
    age: Option<i32>,
}

sql_record!(Person { id, name, age });

fn people() -> Result<Connection, SqlBindError> {
    let conn = Connection::connect(ConnectOptions::new(":memory:"))?;
    conn.execute_batch(
        "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER);
         INSERT INTO people (name, age) VALUES ('ada', 36), ('brian', NULL), ('cleo', 29);",
    )?;
    Ok(conn)
}

#[test]
fn fetch_all_reads_every_row_in_order() -> Result<(), SqlBindError> {
    let conn = people()?;
    let stmt = Statement::<(), Person>::prepare(&conn, "SELECT id, name, age FROM people ORDER BY id")?;
    let rows = stmt.fetch_all(&())?;
    assert_eq!(
        rows,
        vec![
            Person { id: 1, name: "ada".into(), age: Some(36) },
            Person { id: 2, name: "brian".into(), age: None },
            Person { id: 3, name: "cleo".into(), age: Some(29) },
        ]
    );
    Ok(())
}

#[test]
fn execute_one_distinguishes_no_rows_from_failure() -> Result<(), SqlBindError> {
    let conn = people()?;
    let stmt = Statement::<(i64,), Person>::prepare(&conn, "SELECT id, name, age FROM people WHERE id = ?")?;

    let mut row = Person::default();
    assert!(stmt.execute_one(&(2,), &mut row)?);
    assert_eq!(row.name, "brian");
    assert_eq!(row.age, None);

    let mut missing = Person { id: -1, ..Person::default() };
    assert!(!stmt.execute_one(&(99,), &mut missing)?);
    assert_eq!(missing.id, -1, "row must stay untouched when nothing matched");
    Ok(())
}

#[test]
fn single_row_sink_stops_after_first_row() -> Result<(), SqlBindError> {
    let conn = people()?;
    let stmt = Statement::<(), (String,)>::prepare(&conn, "SELECT name FROM people ORDER BY id DESC")?;
    let mut first: Option<(String,)> = None;
    stmt.execute(&(), Some(&mut first), OutParams::none())?;
    assert_eq!(first, Some(("cleo".to_string(),)));
    Ok(())
}

#[test]
fn repeated_execution_yields_identical_rows() -> Result<(), SqlBindError> {
    let conn = people()?;
    let stmt = Statement::<(i32,), Person>::prepare(
        &conn,
        "SELECT id, name, age FROM people WHERE age IS NULL OR age > ? ORDER BY id",
    )?;
    let first = stmt.fetch_all(&(30,))?;
    let second = stmt.fetch_all(&(30,))?;
    assert_eq!(first.len(), 2);
    assert_eq!(first, second);
    Ok(())
}

#[test]
fn out_params_report_insert_id_and_affected_rows() -> Result<(), SqlBindError> {
    let conn = people()?;
    let insert = Statement::<(String, Option<i32>), ()>::prepare(
        &conn,
        "INSERT INTO people (name, age) VALUES (?, ?)",
    )?;
    let mut insert_id = 0u64;
    insert.execute(
        &("dora".to_string(), Some(41)),
        None,
        OutParams::none().insert_id(&mut insert_id),
    )?;
    assert_eq!(insert_id, 4);

    let update = Statement::<(i32,), ()>::prepare(&conn, "UPDATE people SET age = ? WHERE age IS NOT NULL")?;
    let mut affected = 0u64;
    update.execute(&(50,), None, OutParams::none().affected_rows(&mut affected))?;
    assert_eq!(affected, 3);
    Ok(())
}

#[test]
fn insert_id_is_zero_when_nothing_was_inserted() -> Result<(), SqlBindError> {
    let conn = people()?;
    let insert = Statement::<(String,), ()>::prepare(&conn, "INSERT INTO people (name) VALUES (?)")?;
    let mut insert_id = 0u64;
    insert.execute(&("eve".to_string(),), None, OutParams::none().insert_id(&mut insert_id))?;
    assert_eq!(insert_id, 4);

    let select = Statement::<(), (i64,)>::prepare(&conn, "SELECT id FROM people")?;
    let mut rows: Vec<(i64,)> = Vec::new();
    let mut select_id = 99u64;
    select.execute(&(), Some(&mut rows), OutParams::none().insert_id(&mut select_id))?;
    assert_eq!(rows.len(), 4);
    assert_eq!(select_id, 0);

    let noop = Statement::<(), ()>::prepare(&conn, "UPDATE people SET age = 1 WHERE id < 0")?;
    let mut noop_id = 99u64;
    noop.execute(&(), None, OutParams::none().insert_id(&mut noop_id))?;
    assert_eq!(noop_id, 0);

    let returning = Statement::<(String,), (i64,)>::prepare(
        &conn,
        "INSERT INTO people (name) VALUES (?) RETURNING id",
    )?;
    let mut returned: Vec<(i64,)> = Vec::new();
    let mut returning_id = 0u64;
    returning.execute(
        &("finn".to_string(),),
        Some(&mut returned),
        OutParams::none().insert_id(&mut returning_id),
    )?;
    assert_eq!(returned, vec![(5,)]);
    assert_eq!(returning_id, 5);
    Ok(())
}

#[test]
fn template_mismatch_is_configuration_error() -> Result<(), SqlBindError> {
    let conn = people()?;

    let err = Statement::<(i64, i64), ()>::prepare(&conn, "DELETE FROM people WHERE id = ?").unwrap_err();
    assert!(matches!(err, SqlBindError::ConfigError(_)), "{err:?}");

    let err = Statement::<(), (i64,)>::prepare(&conn, "SELECT id, name FROM people").unwrap_err();
    assert!(matches!(err, SqlBindError::ConfigError(_)), "{err:?}");
    Ok(())
}

#[test]
fn numbered_and_quoted_placeholders_are_counted_like_the_engine() -> Result<(), SqlBindError> {
    let conn = people()?;
    let stmt = Statement::<(String, i64), (i64,)>::prepare(
        &conn,
        "SELECT count(*) FROM people WHERE name <> '?' AND (name = ?1 OR id = ?2 OR name = ?1)",
    )?;
    assert_eq!(stmt.fetch_all(&("ada".into(), 3))?, vec![(2,)]);

    let commented = Statement::<(i64,), (i64,)>::prepare(&conn, "SELECT /* a /* b */ ?")?;
    assert_eq!(commented.fetch_all(&(7,))?, vec![(7,)]);
    Ok(())
}

#[test]
fn unbound_statement_reports_state_and_refuses_execution() -> Result<(), SqlBindError> {
    let conn = people()?;
    let stmt = Statement::<(), (i64,)>::unbound(&conn);
    assert_eq!(stmt.state(), StatementState::Unbound);
    assert!(stmt.sql().is_none());
    assert!(matches!(stmt.fetch_all(&()), Err(SqlBindError::ConfigError(_))));

    stmt.init("SELECT count(*) FROM people", &(), &(0,))?;
    assert_eq!(stmt.state(), StatementState::Prepared);
    assert_eq!(stmt.result_slots().map(|slots| slots.len()), Some(1));
    assert_eq!(stmt.fetch_all(&())?, vec![(3,)]);
    stmt.close();
    Ok(())
}

#[test]
fn engine_errors_are_statement_errors_and_connection_survives() -> Result<(), SqlBindError> {
    let conn = people()?;
    let err = Statement::<(), ()>::prepare(&conn, "SELEC nonsense").unwrap_err();
    assert!(matches!(err, SqlBindError::StatementError(_)), "{err:?}");
    assert!(err.code().is_some());

    let insert = Statement::<(Option<String>,), ()>::prepare(&conn, "INSERT INTO people (name) VALUES (?)")?;
    let err = insert.execute(&(None,), None, OutParams::none()).unwrap_err();
    assert!(matches!(err, SqlBindError::StatementError(_)), "{err:?}");

    let count = Statement::<(), (i64,)>::prepare(&conn, "SELECT count(*) FROM people")?;
    assert_eq!(count.fetch_all(&())?, vec![(3,)]);
    Ok(())
}
