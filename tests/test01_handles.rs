mod common;

use std::sync::Arc;

use common::{open_counting, open_memory};
use surreal_bridge::prelude::*;

#[test]
fn no_handle_is_not_acquired() {
    let engine: Arc<dyn Boundary> = Arc::new(MemoryEngine::default());
    assert!(HandleResource::acquire(engine, NO_HANDLE).is_none());
}

#[test]
fn explicit_release_then_drop_disposes_once() -> Result<(), SurrealBridgeError> {
    let (db, boundary) = open_counting();
    let response = db.query("RETURN 1")?;
    let handle = response.handle();

    response.release()?;
    assert_eq!(boundary.releases_of(handle), 1);
    Ok(())
}

#[test]
fn repeated_release_is_guarded() -> Result<(), SurrealBridgeError> {
    let (db, boundary) = open_counting();
    let raw = boundary.new_connection()?;
    let mut resource = HandleResource::acquire(boundary.clone(), raw).expect("live handle");

    resource.release()?;
    resource.release()?;
    drop(resource);
    assert_eq!(boundary.releases_of(raw), 1);
    drop(db);
    Ok(())
}

#[test]
fn released_handle_is_unreachable() -> Result<(), SurrealBridgeError> {
    let (_db, boundary) = open_counting();
    let raw = boundary.new_connection()?;
    let mut resource = HandleResource::acquire(boundary.clone(), raw).expect("live handle");
    assert_eq!(resource.raw()?, raw);
    resource.release()?;
    assert!(resource.is_released());
    assert!(matches!(
        resource.raw(),
        Err(SurrealBridgeError::HandleError(_))
    ));
    Ok(())
}

#[test]
fn dropping_wrappers_returns_engine_to_baseline() -> Result<(), SurrealBridgeError> {
    let (db, engine) = open_memory();
    let baseline = engine.live_handles();
    {
        let key = RecordKey::new("person", 1);
        let created = db.create(&key, &serde_json::json!({"name": "Tobie"}))?;
        let selected = db.select(&key)?.expect("record exists");
        let cursor = db.select_all(&[Target::table("person")?])?;
        let staged = db.value(&serde_json::json!({"x": 1}))?;
        let response = db.query("RETURN 1; RETURN 2")?;
        response.take(0)?;
        assert!(engine.live_handles() > baseline);
        drop((created, selected, cursor, staged, response));
    }
    assert_eq!(engine.live_handles(), baseline);
    Ok(())
}

#[test]
fn closing_the_connection_invalidates_derived_handles() -> Result<(), SurrealBridgeError> {
    let (db, boundary) = open_counting();
    let cursor = db.select_all(&[Target::table("person")?])?;
    let conn = db.handle();
    db.close()?;
    assert_eq!(boundary.releases_of(conn), 1);
    assert_eq!(boundary.engine().live_handles(), 0);

    // The cursor outlived its connection: pulls report a handle failure and
    // its own release is attempted once and reported, not retried.
    assert!(matches!(
        cursor.has_next(),
        Err(SurrealBridgeError::HandleError(_))
    ));
    let handle = cursor.handle();
    drop(cursor);
    assert_eq!(boundary.releases_of(handle), 1);
    Ok(())
}

#[test]
fn mutable_values_are_consumed_by_writes() -> Result<(), SurrealBridgeError> {
    let (db, engine) = open_memory();
    let baseline = engine.live_handles();
    db.create(&RecordKey::new("person", 7), &serde_json::json!({"name": "Ada"}))?;
    // The staged content went to the engine with the call, and the created
    // value was dropped right away.
    assert_eq!(engine.live_handles(), baseline);
    Ok(())
}
