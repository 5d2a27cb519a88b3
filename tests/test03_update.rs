mod common;

use common::{Person, open_memory};
use serde_json::json;
use surreal_bridge::prelude::*;

#[test]
fn merge_keeps_unmentioned_fields() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", 1);
    db.create(&key, &json!({"name": "Tobie", "age": 30, "tags": ["a"]}))?;

    let merged = db
        .update(&key, UpdateKind::Merge, &json!({"name": "Jaime"}))?
        .expect("record exists");
    assert_eq!(merged.field("name").as_str(), Some("Jaime"));
    assert_eq!(merged.field("age").as_int(), Some(30));
    assert_eq!(merged.field("id").as_record_id(), Some(&key));
    Ok(())
}

#[test]
fn content_and_replace_drop_unmentioned_fields() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", "tobie");
    db.create(&key, &json!({"name": "Tobie", "age": 30}))?;

    let replaced = db
        .update(&key, UpdateKind::Content, &json!({"name": "Jaime"}))?
        .expect("record exists");
    assert_eq!(replaced.field("name").as_str(), Some("Jaime"));
    assert!(replaced.field("age").is_none());

    let replaced = db
        .update(&key, UpdateKind::Replace, &json!({"nickname": "J"}))?
        .expect("record exists");
    assert!(replaced.field("name").is_none());
    assert_eq!(replaced.field("id").as_record_id(), Some(&key));
    Ok(())
}

#[test]
fn patch_applies_operations_in_order() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", 2);
    db.create(&key, &json!({"name": "Tobie", "age": 30, "tags": ["a"]}))?;

    let patched = db
        .update(
            &key,
            UpdateKind::Patch,
            &json!([
                {"op": "replace", "path": "/name", "value": "Jaime"},
                {"op": "add", "path": "/nickname", "value": "J"},
                {"op": "remove", "path": "/age"}
            ]),
        )?
        .expect("record exists");
    assert_eq!(patched.field("nickname").as_str(), Some("J"));
    let person: Person = patched.get()?;
    assert_eq!(person.name, "Jaime");
    assert_eq!(person.tags, vec!["a".to_string()]);
    assert_eq!(person.age, TriState::Absent);

    let failed = db.update(
        &key,
        UpdateKind::Patch,
        &json!([{"op": "test", "path": "/name", "value": "Tobie"}]),
    );
    assert!(matches!(failed, Err(SurrealBridgeError::QueryError { .. })));
    let unchanged: Person = db.select_as(&key)?.expect("record exists");
    assert_eq!(unchanged.name, "Jaime");
    Ok(())
}

#[test]
fn create_update_select_end_to_end() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", 1);

    let mut tobie = Person::new("Tobie");
    tobie.age = TriState::Present(33);
    let created = db.create_as(&key, &tobie)?;
    assert_eq!(created.id, Some(key.clone()));

    let updated: Option<Person> =
        db.update_as(&key, UpdateKind::Merge, &json!({"name": "Jaime"}))?;
    assert_eq!(updated.map(|p| p.name), Some("Jaime".to_string()));

    let selected = db.select_as::<Person>(&key)?.expect("record exists");
    assert_eq!(selected.name, "Jaime");
    assert_eq!(selected.age, TriState::Present(33));
    Ok(())
}

#[test]
fn update_of_missing_record_is_none() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", "ghost");
    assert!(
        db.update(&key, UpdateKind::Merge, &json!({"name": "Nobody"}))?
            .is_none()
    );
    assert!(db.select(&key)?.is_none());
    Ok(())
}

#[test]
fn upsert_creates_then_updates() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", "new");

    let created = db.upsert_as::<Person, _>(&key, UpdateKind::Merge, &json!({"name": "Ada", "tags": []}))?;
    assert_eq!(created.name, "Ada");
    assert_eq!(created.id, Some(key.clone()));

    let merged = db.upsert(&key, UpdateKind::Merge, &json!({"tags": ["x"]}))?;
    assert_eq!(merged.field("name").as_str(), Some("Ada"));
    assert_eq!(merged.field("tags").as_array().map(<[_]>::len), Some(1));
    Ok(())
}

#[test]
fn creating_an_existing_record_fails() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let key = RecordKey::new("person", 1);
    db.create(&key, &Person::new("Tobie"))?;
    let again = db.create(&key, &Person::new("Tobie"));
    match again {
        Err(SurrealBridgeError::QueryError { message, .. }) => {
            assert!(message.contains("already exists"), "{message}");
        }
        other => panic!("expected a query error, got {other:?}"),
    }
    Ok(())
}

#[test]
fn update_targets_streams_every_updated_record() -> Result<(), SurrealBridgeError> {
    let (db, _engine) = open_memory();
    let people = Target::table("person")?;
    db.create_many(&people, &[Person::new("A"), Person::new("B"), Person::new("C")])?;

    let cursor = db.update_targets_as::<Person, _>(
        &[people.clone()],
        UpdateKind::Merge,
        &json!({"tags": ["seen"]}),
    )?;
    let updated = cursor.collect::<Result<Vec<Person>, _>>()?;
    assert_eq!(updated.len(), 3);
    assert!(updated.iter().all(|p| p.tags == vec!["seen".to_string()]));

    let snapshot = db.upsert_targets_sync(
        &[Target::from(RecordKey::new("person", "late"))],
        UpdateKind::Content,
        &json!({"name": "Late", "tags": []}),
    )?;
    let rows = snapshot.collect_values()?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].field("name").as_str(), Some("Late"));
    Ok(())
}
