use std::fmt;

use crate::boundary::RawHandle;
use crate::connection::Surreal;
use crate::convert::{FromEngine, ValueConverter};
use crate::error::SurrealBridgeError;
use crate::handle::HandleResource;

use super::model::{EngineValue, ValueKind};
use super::wire;

/// Immutable, handle-backed engine value.
///
/// The payload is read across the boundary once, when the wrapper is built;
/// predicates and decoding work on that snapshot. The engine-side handle stays
/// owned until the value is dropped or [`Value::release`]d.
pub struct Value {
    resource: HandleResource,
    snapshot: EngineValue,
}

impl Value {
    pub(crate) fn read(resource: HandleResource) -> Result<Self, SurrealBridgeError> {
        let payload = resource.boundary().value_read(resource.raw()?)?;
        let snapshot = wire::decode(&payload)?;
        Ok(Self { resource, snapshot })
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.resource.id()
    }

    #[must_use]
    pub fn kind(&self) -> ValueKind {
        self.snapshot.kind()
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        self.snapshot.is_none()
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        self.snapshot.is_null()
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        self.snapshot.is_object()
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        self.snapshot.is_array()
    }

    #[must_use]
    pub fn is_string(&self) -> bool {
        self.kind() == ValueKind::String
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        self.kind().is_number()
    }

    #[must_use]
    pub fn as_engine(&self) -> &EngineValue {
        &self.snapshot
    }

    /// Field of an object value; missing keys read as NONE.
    #[must_use]
    pub fn field(&self, key: &str) -> &EngineValue {
        self.snapshot.get(key)
    }

    /// Decode into `T` with default converter options.
    ///
    /// # Errors
    /// Conversion failures wrapped as [`SurrealBridgeError::ConversionError`].
    pub fn get<T: FromEngine>(&self) -> Result<T, SurrealBridgeError> {
        ValueConverter::default().decode(self)
    }

    /// # Errors
    /// See [`ValueConverter::decode`].
    pub fn get_with<T: FromEngine>(&self, converter: &ValueConverter) -> Result<T, SurrealBridgeError> {
        converter.decode(self)
    }

    /// Release the engine handle now and keep the host-side tree.
    #[must_use]
    pub fn into_engine(self) -> EngineValue {
        let Value { resource, snapshot } = self;
        drop(resource);
        snapshot
    }

    /// # Errors
    /// Returns the engine's failure to dispose of the handle.
    pub fn release(mut self) -> Result<(), SurrealBridgeError> {
        self.resource.release()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.resource == other.resource
    }
}

impl Eq for Value {}

impl std::hash::Hash for Value {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.resource.hash(state);
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Value")
            .field("handle", &self.resource.id())
            .field("value", &self.snapshot)
            .finish()
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.snapshot.to_json())
    }
}

/// Engine value staged for one write call.
///
/// Passing it to an operation moves it; the engine takes the handle over and
/// the wrapper never releases it. A staged value that is dropped unused is
/// released normally.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MutableValue {
    resource: HandleResource,
}

impl MutableValue {
    pub(crate) fn stage(surreal: &Surreal, tree: &EngineValue) -> Result<Self, SurrealBridgeError> {
        let payload = wire::encode(tree)?;
        let boundary = surreal.boundary();
        let handle = boundary.value_new(surreal.connection_handle()?, &payload)?;
        Ok(Self {
            resource: HandleResource::acquire_required(boundary, handle, "value")?,
        })
    }

    /// Staged NONE.
    ///
    /// # Errors
    /// The boundary's failure to allocate the value.
    pub fn none(surreal: &Surreal) -> Result<Self, SurrealBridgeError> {
        Self::stage(surreal, &EngineValue::None)
    }

    /// Staged NULL.
    ///
    /// # Errors
    /// The boundary's failure to allocate the value.
    pub fn null(surreal: &Surreal) -> Result<Self, SurrealBridgeError> {
        Self::stage(surreal, &EngineValue::Null)
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.resource.id()
    }

    pub(crate) fn into_raw(self) -> RawHandle {
        self.resource.into_raw()
    }
}
