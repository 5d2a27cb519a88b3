mod common;

use common::{Person, open_counting, open_memory};
use surreal_bridge::prelude::*;

#[test]
fn failing_statement_only_affects_its_slot() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let response = db.query(
        "CREATE person:1 CONTENT {name: 'Tobie', tags: []}; THROW 'boom'; SELECT * FROM person",
    )?;
    assert_eq!(response.len(), 3);

    assert!(response.take(0)?.is_array());
    match response.take(1) {
        Err(SurrealBridgeError::QueryError { index, message }) => {
            assert_eq!(index, 1);
            assert!(message.contains("boom"), "{message}");
        }
        other => panic!("expected a query error, got {other:?}"),
    }
    let people: Vec<Person> = response.take_as(2)?;
    assert_eq!(people.len(), 1);
    assert_eq!(people[0].name, "Tobie");
    Ok(())
}

#[test]
fn slots_are_read_once_and_cached() -> Result<(), SurrealBridgeError> {
    let (db, boundary) = open_counting();
    let response = db.query("RETURN 1; THROW 'nope'")?;
    let takes = boundary.response_takes();

    let first = response.take(0)?.handle();
    let again = response.take(0)?.handle();
    assert_eq!(first, again);
    assert!(response.take(1).is_err());
    assert!(response.take(1).is_err());
    assert_eq!(boundary.response_takes(), takes + 2);
    Ok(())
}

#[test]
fn index_past_the_end_is_reported() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let response = db.query("RETURN 1; RETURN 2")?;
    assert!(matches!(
        response.take(2),
        Err(SurrealBridgeError::StatementIndex { index: 2, len: 2 })
    ));
    assert!(!response.is_empty());
    Ok(())
}

#[test]
fn errors_and_check_follow_statement_order() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let response = db.query("THROW 'first'; RETURN 1; THROW 'second'")?;
    let errors = response.errors();
    assert_eq!(errors.len(), 2);
    assert!(matches!(
        &errors[0],
        SurrealBridgeError::QueryError { index: 0, .. }
    ));
    assert!(matches!(
        &errors[1],
        SurrealBridgeError::QueryError { index: 2, .. }
    ));
    assert!(matches!(
        response.check(),
        Err(SurrealBridgeError::QueryError { index: 0, .. })
    ));

    db.query("RETURN 1; RETURN 2")?.check()?;
    Ok(())
}

#[test]
fn bound_parameters_reach_the_statements() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let response = db.query_bind(
        "LET $who = $name; CREATE person:ada CONTENT {name: $who, tags: $tags}; RETURN $missing",
        [
            ("name", serde_json::json!("Ada")),
            ("tags", serde_json::json!(["math"])),
        ],
    )?;
    let created: Vec<Person> = response.take_as(1)?;
    assert_eq!(created[0].tags, vec!["math".to_string()]);
    assert!(response.take(2)?.is_none());
    Ok(())
}

#[test]
fn named_schemas_project_known_fields() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let mut db = db;
    db.converter_mut().register::<Person>();
    let response = db.query("RETURN {name: 'Ada', tags: [], extra: true}")?;
    let projected = response.take_named(0, "Person")?;
    assert_eq!(projected.get("name").and_then(EngineValue::as_str), Some("Ada"));
    assert!(!projected.contains_key("extra"));

    assert!(matches!(
        response.take_named(0, "Unknown"),
        Err(SurrealBridgeError::ConversionError(ConversionError::UnsupportedType(_)))
    ));
    Ok(())
}

#[test]
fn syntax_errors_fail_the_whole_script() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    assert!(matches!(
        db.query("CREATE person:1 CONTENT {name: 'A', tags: []}; SELEC * FROM person"),
        Err(SurrealBridgeError::QueryError { .. })
    ));
    // Nothing ran.
    assert!(db.select(&RecordKey::new("person", 1))?.is_none());
    assert_eq!(db.query("RETURN 3")?.take_as::<i64>(0)?, 3);
    Ok(())
}
