use crate::convert::FromEngine;
use crate::cursor::{CursorPolicy, RawCursor, Synchronized, TypedRawCursor, Unsynchronized};
use crate::error::SurrealBridgeError;
use crate::record::{RecordKey, Target};
use crate::value::Value;

use super::Surreal;

impl Surreal {
    /// Read one record; `None` when it does not exist.
    ///
    /// # Errors
    /// Engine failures.
    pub fn select(&self, key: &RecordKey) -> Result<Option<Value>, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let handle = self.boundary.select_record(conn, &key.to_string())?;
        self.optional_value(handle)
    }

    /// # Errors
    /// See [`Surreal::select`], plus conversion failures.
    pub fn select_as<T: FromEngine>(&self, key: &RecordKey) -> Result<Option<T>, SurrealBridgeError> {
        self.select(key)?
            .map(|value| self.converter.decode(&value))
            .transpose()
    }

    /// Read several records by key. Missing records are left out.
    ///
    /// # Errors
    /// Engine failures.
    pub fn select_many(&self, keys: &[RecordKey]) -> Result<Vec<Value>, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let keys: Vec<String> = keys.iter().map(RecordKey::to_string).collect();
        let keys: Vec<&str> = keys.iter().map(String::as_str).collect();
        let handles = self.boundary.select_records(conn, &keys)?;
        self.values(handles)
    }

    /// Like [`Surreal::select_many`], decoding each record on its own so a
    /// record that does not fit `T` leaves the others readable.
    ///
    /// # Errors
    /// See [`Surreal::select_many`]; conversion failures land in their slot.
    pub fn select_many_as<T: FromEngine>(
        &self,
        keys: &[RecordKey],
    ) -> Result<Vec<Result<T, SurrealBridgeError>>, SurrealBridgeError> {
        Ok(self.decode_each(&self.select_many(keys)?))
    }

    fn select_with<P: CursorPolicy>(&self, targets: &[Target]) -> Result<RawCursor<P>, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let targets: Vec<&str> = targets.iter().map(Target::as_str).collect();
        let cursor = self.boundary.select_targets(conn, &targets, P::SNAPSHOT)?;
        RawCursor::from_handle(&self.boundary, cursor)
    }

    /// Stream every record `targets` address.
    ///
    /// # Errors
    /// Engine failures while issuing the statement.
    pub fn select_all(&self, targets: &[Target]) -> Result<RawCursor<Unsynchronized>, SurrealBridgeError> {
        self.select_with(targets)
    }

    /// Snapshot of every record `targets` address, safe to pull from several threads.
    ///
    /// # Errors
    /// Engine failures while issuing the statement.
    pub fn select_all_sync(&self, targets: &[Target]) -> Result<RawCursor<Synchronized>, SurrealBridgeError> {
        self.select_with(targets)
    }

    /// # Errors
    /// See [`Surreal::select_all`].
    pub fn select_all_as<T: FromEngine>(
        &self,
        targets: &[Target],
    ) -> Result<TypedRawCursor<T, Unsynchronized>, SurrealBridgeError> {
        Ok(TypedRawCursor::new(self.select_all(targets)?, self.converter.clone()))
    }

    /// # Errors
    /// See [`Surreal::select_all_sync`].
    pub fn select_all_sync_as<T: FromEngine>(
        &self,
        targets: &[Target],
    ) -> Result<TypedRawCursor<T, Synchronized>, SurrealBridgeError> {
        Ok(TypedRawCursor::new(self.select_all_sync(targets)?, self.converter.clone()))
    }
}
