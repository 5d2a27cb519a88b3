use crate::boundary::RawHandle;
use crate::convert::{FromEngine, IntoEngine};
use crate::cursor::{CursorPolicy, RawCursor, Synchronized, TypedRawCursor, Unsynchronized};
use crate::error::SurrealBridgeError;
use crate::record::{RecordKey, Target, is_table_name};
use crate::types::UpdateKind;
use crate::value::Value;

use super::Surreal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Update,
    Upsert,
}

fn check_table(table: &str) -> Result<(), SurrealBridgeError> {
    if is_table_name(table) {
        Ok(())
    } else {
        Err(SurrealBridgeError::ConfigError(format!(
            "invalid table name `{table}`"
        )))
    }
}

impl Surreal {
    /// Create one record with the given content.
    ///
    /// # Errors
    /// Conversion failures, or the engine's failure (e.g. the record exists).
    pub fn create<C: IntoEngine + ?Sized>(
        &self,
        key: &RecordKey,
        content: &C,
    ) -> Result<Value, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let value = self.stage_raw(content)?;
        let handle = self
            .boundary
            .create_record(conn, &key.to_string(), value)?;
        self.required_value(handle, "created record")
    }

    /// # Errors
    /// See [`Surreal::create`].
    pub fn create_as<T: IntoEngine + FromEngine>(
        &self,
        key: &RecordKey,
        content: &T,
    ) -> Result<T, SurrealBridgeError> {
        self.converter.decode(&self.create(key, content)?)
    }

    /// Create one record per content item in `target`, with generated ids
    /// unless the content carries an `id`.
    ///
    /// # Errors
    /// Conversion failures, or the engine's failure.
    pub fn create_many<C: IntoEngine>(
        &self,
        target: &Target,
        contents: &[C],
    ) -> Result<Vec<Value>, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let values = self.stage_all(contents)?;
        let handles = self
            .boundary
            .create_target(conn, target.as_str(), &values)?;
        self.values(handles)
    }

    /// Like [`Surreal::create_many`], decoding every created record on its
    /// own: a record that does not fit `T` yields an `Err` in its slot.
    ///
    /// # Errors
    /// See [`Surreal::create_many`].
    pub fn create_many_as<T: IntoEngine + FromEngine>(
        &self,
        target: &Target,
        contents: &[T],
    ) -> Result<Vec<Result<T, SurrealBridgeError>>, SurrealBridgeError> {
        Ok(self.decode_each(&self.create_many(target, contents)?))
    }

    /// Insert records into `target`.
    ///
    /// # Errors
    /// Conversion failures, or the engine's failure.
    pub fn insert<C: IntoEngine>(
        &self,
        target: &Target,
        contents: &[C],
    ) -> Result<Vec<Value>, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let values = self.stage_all(contents)?;
        let handles = self
            .boundary
            .insert_target(conn, target.as_str(), &values)?;
        self.values(handles)
    }

    /// Like [`Surreal::insert`], with a decode result per inserted record.
    ///
    /// # Errors
    /// See [`Surreal::insert`].
    pub fn insert_as<T: IntoEngine + FromEngine>(
        &self,
        target: &Target,
        contents: &[T],
    ) -> Result<Vec<Result<T, SurrealBridgeError>>, SurrealBridgeError> {
        Ok(self.decode_each(&self.insert(target, contents)?))
    }

    /// Insert one relation; the content must carry `in` and `out` record ids.
    ///
    /// # Errors
    /// [`SurrealBridgeError::ConfigError`] for an invalid table name, otherwise
    /// conversion or engine failures.
    pub fn insert_relation<C: IntoEngine + ?Sized>(
        &self,
        table: &str,
        relation: &C,
    ) -> Result<Value, SurrealBridgeError> {
        check_table(table)?;
        let conn = self.connection_handle()?;
        let value = self.stage_raw(relation)?;
        let handles = self.boundary.insert_relations(conn, table, &[value])?;
        self.values(handles)?.pop().ok_or_else(|| {
            SurrealBridgeError::UnexpectedResponse("engine inserted no relation".into())
        })
    }

    /// # Errors
    /// See [`Surreal::insert_relation`].
    pub fn insert_relation_as<T: IntoEngine + FromEngine>(
        &self,
        table: &str,
        relation: &T,
    ) -> Result<T, SurrealBridgeError> {
        self.converter.decode(&self.insert_relation(table, relation)?)
    }

    /// # Errors
    /// See [`Surreal::insert_relation`].
    pub fn insert_relations<C: IntoEngine>(
        &self,
        table: &str,
        relations: &[C],
    ) -> Result<Vec<Value>, SurrealBridgeError> {
        check_table(table)?;
        let conn = self.connection_handle()?;
        let values = self.stage_all(relations)?;
        let handles = self.boundary.insert_relations(conn, table, &values)?;
        self.values(handles)
    }

    /// Like [`Surreal::insert_relations`], with a decode result per relation.
    ///
    /// # Errors
    /// See [`Surreal::insert_relation`].
    pub fn insert_relations_as<T: IntoEngine + FromEngine>(
        &self,
        table: &str,
        relations: &[T],
    ) -> Result<Vec<Result<T, SurrealBridgeError>>, SurrealBridgeError> {
        Ok(self.decode_each(&self.insert_relations(table, relations)?))
    }

    fn relate_raw(
        &self,
        from: &RecordKey,
        edge_table: &str,
        to: &RecordKey,
        content: Option<RawHandle>,
    ) -> Result<Value, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let handle = self.boundary.relate(
            conn,
            &from.to_string(),
            edge_table,
            &to.to_string(),
            content,
        )?;
        self.required_value(handle, "relation")
    }

    /// Create an edge record `from -> edge_table -> to`.
    ///
    /// # Errors
    /// [`SurrealBridgeError::ConfigError`] for an invalid edge table, otherwise
    /// engine failures.
    pub fn relate(
        &self,
        from: &RecordKey,
        edge_table: &str,
        to: &RecordKey,
    ) -> Result<Value, SurrealBridgeError> {
        check_table(edge_table)?;
        self.relate_raw(from, edge_table, to, None)
    }

    /// Like [`Surreal::relate`], storing `content` on the edge.
    ///
    /// # Errors
    /// See [`Surreal::relate`].
    pub fn relate_with<C: IntoEngine + ?Sized>(
        &self,
        from: &RecordKey,
        edge_table: &str,
        to: &RecordKey,
        content: &C,
    ) -> Result<Value, SurrealBridgeError> {
        check_table(edge_table)?;
        let value = self.stage_raw(content)?;
        self.relate_raw(from, edge_table, to, Some(value))
    }

    /// # Errors
    /// See [`Surreal::relate`].
    pub fn relate_as<T: IntoEngine + FromEngine>(
        &self,
        from: &RecordKey,
        edge_table: &str,
        to: &RecordKey,
        content: &T,
    ) -> Result<T, SurrealBridgeError> {
        self.converter
            .decode(&self.relate_with(from, edge_table, to, content)?)
    }

    fn write_record<C: IntoEngine + ?Sized>(
        &self,
        write: WriteMode,
        key: &RecordKey,
        kind: UpdateKind,
        content: &C,
    ) -> Result<RawHandle, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let value = self.stage_raw(content)?;
        let key = key.to_string();
        let handle = match write {
            WriteMode::Update => self.boundary.update_record(conn, &key, kind.code(), value)?,
            WriteMode::Upsert => self.boundary.upsert_record(conn, &key, kind.code(), value)?,
        };
        Ok(handle)
    }

    fn write_targets<P: CursorPolicy, C: IntoEngine + ?Sized>(
        &self,
        write: WriteMode,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<RawCursor<P>, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let value = self.stage_raw(content)?;
        let targets: Vec<&str> = targets.iter().map(Target::as_str).collect();
        let cursor = match write {
            WriteMode::Update => {
                self.boundary
                    .update_targets(conn, &targets, kind.code(), value, P::SNAPSHOT)?
            }
            WriteMode::Upsert => {
                self.boundary
                    .upsert_targets(conn, &targets, kind.code(), value, P::SNAPSHOT)?
            }
        };
        RawCursor::from_handle(&self.boundary, cursor)
    }

    /// Update one existing record. Returns `None` when the record does not exist.
    ///
    /// # Errors
    /// Conversion failures, or the engine's failure (e.g. a malformed patch).
    pub fn update<C: IntoEngine + ?Sized>(
        &self,
        key: &RecordKey,
        kind: UpdateKind,
        content: &C,
    ) -> Result<Option<Value>, SurrealBridgeError> {
        let handle = self.write_record(WriteMode::Update, key, kind, content)?;
        self.optional_value(handle)
    }

    /// # Errors
    /// See [`Surreal::update`].
    pub fn update_as<T: FromEngine, C: IntoEngine + ?Sized>(
        &self,
        key: &RecordKey,
        kind: UpdateKind,
        content: &C,
    ) -> Result<Option<T>, SurrealBridgeError> {
        self.update(key, kind, content)?
            .map(|value| self.converter.decode(&value))
            .transpose()
    }

    /// Update every record in `targets`; the updated records stream through the cursor.
    ///
    /// # Errors
    /// Conversion failures, or the engine's failure to issue the statement.
    pub fn update_targets<C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<RawCursor<Unsynchronized>, SurrealBridgeError> {
        self.write_targets(WriteMode::Update, targets, kind, content)
    }

    /// Like [`Surreal::update_targets`], but the statement finishes before the
    /// call returns and the cursor can be shared between threads.
    ///
    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn update_targets_sync<C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<RawCursor<Synchronized>, SurrealBridgeError> {
        self.write_targets(WriteMode::Update, targets, kind, content)
    }

    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn update_targets_as<T: FromEngine, C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<TypedRawCursor<T, Unsynchronized>, SurrealBridgeError> {
        let cursor = self.update_targets(targets, kind, content)?;
        Ok(TypedRawCursor::new(cursor, self.converter.clone()))
    }

    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn update_targets_sync_as<T: FromEngine, C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<TypedRawCursor<T, Synchronized>, SurrealBridgeError> {
        let cursor = self.update_targets_sync(targets, kind, content)?;
        Ok(TypedRawCursor::new(cursor, self.converter.clone()))
    }

    /// Update the record, creating it first when it does not exist.
    ///
    /// # Errors
    /// Conversion failures, or the engine's failure.
    pub fn upsert<C: IntoEngine + ?Sized>(
        &self,
        key: &RecordKey,
        kind: UpdateKind,
        content: &C,
    ) -> Result<Value, SurrealBridgeError> {
        let handle = self.write_record(WriteMode::Upsert, key, kind, content)?;
        self.required_value(handle, "upserted record")
    }

    /// # Errors
    /// See [`Surreal::upsert`].
    pub fn upsert_as<T: FromEngine, C: IntoEngine + ?Sized>(
        &self,
        key: &RecordKey,
        kind: UpdateKind,
        content: &C,
    ) -> Result<T, SurrealBridgeError> {
        self.converter.decode(&self.upsert(key, kind, content)?)
    }

    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn upsert_targets<C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<RawCursor<Unsynchronized>, SurrealBridgeError> {
        self.write_targets(WriteMode::Upsert, targets, kind, content)
    }

    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn upsert_targets_sync<C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<RawCursor<Synchronized>, SurrealBridgeError> {
        self.write_targets(WriteMode::Upsert, targets, kind, content)
    }

    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn upsert_targets_as<T: FromEngine, C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<TypedRawCursor<T, Unsynchronized>, SurrealBridgeError> {
        let cursor = self.upsert_targets(targets, kind, content)?;
        Ok(TypedRawCursor::new(cursor, self.converter.clone()))
    }

    /// # Errors
    /// See [`Surreal::update_targets`].
    pub fn upsert_targets_sync_as<T: FromEngine, C: IntoEngine + ?Sized>(
        &self,
        targets: &[Target],
        kind: UpdateKind,
        content: &C,
    ) -> Result<TypedRawCursor<T, Synchronized>, SurrealBridgeError> {
        let cursor = self.upsert_targets_sync(targets, kind, content)?;
        Ok(TypedRawCursor::new(cursor, self.converter.clone()))
    }

    /// # Errors
    /// Engine failures, or [`SurrealBridgeError::UnexpectedResponse`] when the
    /// engine declines the delete.
    pub fn delete(&self, key: &RecordKey) -> Result<(), SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let done = self.boundary.delete_record(conn, &key.to_string())?;
        declined(done, key)
    }

    /// # Errors
    /// See [`Surreal::delete`].
    pub fn delete_many(&self, keys: &[RecordKey]) -> Result<(), SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let keys: Vec<String> = keys.iter().map(RecordKey::to_string).collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let done = self.boundary.delete_records(conn, &keys)?;
        declined(done, &keys.join(", "))
    }

    /// Delete every record `target` addresses.
    ///
    /// # Errors
    /// See [`Surreal::delete`].
    pub fn delete_target(&self, target: &Target) -> Result<(), SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let done = self.boundary.delete_target(conn, target.as_str())?;
        declined(done, target)
    }
}

fn declined(done: bool, what: &dyn std::fmt::Display) -> Result<(), SurrealBridgeError> {
    if done {
        Ok(())
    } else {
        Err(SurrealBridgeError::UnexpectedResponse(format!(
            "engine declined to delete {what}"
        )))
    }
}
