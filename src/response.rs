use std::fmt;
use std::sync::{Arc, OnceLock};

use crate::boundary::{Boundary, BoundaryStatus, RawHandle};
use crate::convert::{FromEngine, ValueConverter};
use crate::error::{ConversionError, SurrealBridgeError};
use crate::handle::HandleResource;
use crate::value::{Object, Value};

/// Failure recorded for one slot; replayed on every later read of that slot.
#[derive(Debug, Clone)]
enum SlotError {
    Query(String),
    Conversion(ConversionError),
}

type Slot = Result<Value, SlotError>;

/// Outcomes of one multi-statement submission, indexed by statement.
///
/// A failing statement only affects its own slot. Slots are read from the
/// engine on first access and cached, so reading a slot twice yields the same
/// value (or the same error) without a second boundary call.
pub struct ResponseTable {
    resource: HandleResource,
    slots: Vec<OnceLock<Slot>>,
    converter: ValueConverter,
}

impl ResponseTable {
    pub(crate) fn from_handle(
        boundary: &Arc<dyn Boundary>,
        handle: RawHandle,
        converter: ValueConverter,
    ) -> Result<Self, SurrealBridgeError> {
        let resource = HandleResource::acquire_required(boundary, handle, "response")?;
        let len = boundary.response_len(handle)?;
        tracing::debug!(response = handle, statements = len, "received response");
        Ok(Self {
            resource,
            slots: (0..len).map(|_| OnceLock::new()).collect(),
            converter,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.resource.id()
    }

    fn slot(&self, index: usize) -> Result<&Slot, SurrealBridgeError> {
        let cell = self.slots.get(index).ok_or(SurrealBridgeError::StatementIndex {
            index,
            len: self.slots.len(),
        })?;
        if let Some(slot) = cell.get() {
            return Ok(slot);
        }
        let boundary = self.resource.boundary();
        let fetched = match boundary.response_take(self.resource.raw()?, index) {
            Ok(handle) => {
                let resource = HandleResource::acquire_required(boundary, handle, "statement value")?;
                match Value::read(resource) {
                    Ok(value) => Ok(value),
                    Err(SurrealBridgeError::ConversionError(err)) => Err(SlotError::Conversion(err)),
                    Err(other) => return Err(other),
                }
            }
            Err(err) if err.status == BoundaryStatus::Query => Err(SlotError::Query(err.message)),
            // Not a statement outcome: report it without caching.
            Err(err) => return Err(err.into()),
        };
        // A concurrent reader may have filled the slot first; keep whichever landed.
        let _ = cell.set(fetched);
        cell.get().ok_or_else(|| {
            SurrealBridgeError::UnexpectedResponse(format!("response slot {index} was not cached"))
        })
    }

    fn replay(index: usize, err: &SlotError) -> SurrealBridgeError {
        match err {
            SlotError::Query(message) => SurrealBridgeError::QueryError {
                index,
                message: message.clone(),
            },
            SlotError::Conversion(err) => SurrealBridgeError::ConversionError(err.clone()),
        }
    }

    /// Outcome of statement `index`.
    ///
    /// # Errors
    /// [`SurrealBridgeError::StatementIndex`] for an index past the end,
    /// [`SurrealBridgeError::QueryError`] when that statement failed.
    pub fn take(&self, index: usize) -> Result<&Value, SurrealBridgeError> {
        match self.slot(index)? {
            Ok(value) => Ok(value),
            Err(err) => Err(Self::replay(index, err)),
        }
    }

    /// Outcome of statement `index`, decoded into `T`.
    ///
    /// # Errors
    /// As [`ResponseTable::take`], plus conversion failures.
    pub fn take_as<T: FromEngine>(&self, index: usize) -> Result<T, SurrealBridgeError> {
        self.converter.decode(self.take(index)?)
    }

    /// Outcome of statement `index`, projected through a schema registered by name.
    ///
    /// # Errors
    /// As [`ResponseTable::take`], plus [`ValueConverter::decode_named`] failures.
    pub fn take_named(&self, index: usize, type_name: &str) -> Result<Object, SurrealBridgeError> {
        self.converter.decode_named(self.take(index)?, type_name)
    }

    /// Read every slot from the engine now, so later reads only hit the cache.
    ///
    /// Failed statements are cached like any other slot and do not make this
    /// call fail.
    ///
    /// # Errors
    /// Engine failures that are not a statement outcome (a released handle,
    /// an unreadable payload).
    pub fn preload(&self) -> Result<(), SurrealBridgeError> {
        for index in 0..self.len() {
            self.slot(index)?;
        }
        Ok(())
    }

    /// Errors of every failed slot, in statement order.
    #[must_use]
    pub fn errors(&self) -> Vec<SurrealBridgeError> {
        (0..self.len())
            .filter_map(|index| self.take(index).err())
            .collect()
    }

    /// First failed slot, if any.
    ///
    /// # Errors
    /// The error of the lowest failing statement index.
    pub fn check(&self) -> Result<(), SurrealBridgeError> {
        for index in 0..self.len() {
            self.take(index)?;
        }
        Ok(())
    }

    /// Release the response handle and every cached slot now.
    ///
    /// # Errors
    /// The engine's failure to dispose of the response handle.
    pub fn release(mut self) -> Result<(), SurrealBridgeError> {
        self.slots.clear();
        self.resource.release()
    }
}

impl fmt::Debug for ResponseTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self.slots.iter().filter(|slot| slot.get().is_some()).count();
        f.debug_struct("ResponseTable")
            .field("handle", &self.resource.id())
            .field("len", &self.slots.len())
            .field("cached", &cached)
            .finish()
    }
}
