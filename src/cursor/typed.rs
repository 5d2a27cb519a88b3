use std::fmt;
use std::marker::PhantomData;

use crate::convert::{FromEngine, ValueConverter};
use crate::error::SurrealBridgeError;

use super::{CursorPolicy, CursorState, RawCursor, Synchronized, Unsynchronized};

/// Cursor that decodes every item into `T` as it is pulled.
///
/// A decode failure is returned for that item only; the underlying cursor has
/// already moved past it, so the following call continues with the next item.
pub struct TypedRawCursor<T, P: CursorPolicy> {
    cursor: RawCursor<P>,
    converter: ValueConverter,
    _item: PhantomData<fn() -> T>,
}

pub type TypedCursor<T> = TypedRawCursor<T, Unsynchronized>;

pub type SynchronizedTypedCursor<T> = TypedRawCursor<T, Synchronized>;

impl<T: FromEngine, P: CursorPolicy> TypedRawCursor<T, P> {
    #[must_use]
    pub fn new(cursor: RawCursor<P>, converter: ValueConverter) -> Self {
        Self {
            cursor,
            converter,
            _item: PhantomData,
        }
    }

    /// # Errors
    /// See [`RawCursor::has_next`].
    pub fn has_next(&self) -> Result<bool, SurrealBridgeError> {
        self.cursor.has_next()
    }

    /// # Errors
    /// Boundary failures, or a [`SurrealBridgeError::ConversionError`] for an
    /// item that does not decode into `T`.
    pub fn next_typed(&self) -> Result<Option<T>, SurrealBridgeError> {
        match self.cursor.next_value()? {
            Some(value) => self.converter.decode(&value).map(Some),
            None => Ok(None),
        }
    }

    #[must_use]
    pub fn state(&self) -> CursorState {
        self.cursor.state()
    }

    /// # Errors
    /// See [`RawCursor::close`].
    pub fn close(&self) -> Result<(), SurrealBridgeError> {
        self.cursor.close()
    }

    #[must_use]
    pub fn into_inner(self) -> RawCursor<P> {
        self.cursor
    }
}

impl<T: FromEngine, P: CursorPolicy> Iterator for TypedRawCursor<T, P> {
    type Item = Result<T, SurrealBridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_typed().transpose()
    }
}

impl<T: FromEngine, P: CursorPolicy> Iterator for &TypedRawCursor<T, P> {
    type Item = Result<T, SurrealBridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_typed().transpose()
    }
}

impl<T, P: CursorPolicy> fmt::Debug for TypedRawCursor<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedRawCursor")
            .field("item", &std::any::type_name::<T>())
            .field("cursor", &self.cursor)
            .finish()
    }
}
