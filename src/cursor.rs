//! Pull-based cursors over engine-managed result sets.
//!
//! [`Cursor`] and [`SynchronizedCursor`] are the same [`RawCursor`] with a
//! different [`CursorPolicy`]. The policy decides two things: how the cursor
//! state is guarded (a `RefCell` or a `Mutex`) and how the issuing call asks
//! the engine to run the statement (streaming or as a finished snapshot).

mod typed;

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::{Arc, Mutex, PoisonError};

use crate::boundary::{Boundary, NO_HANDLE, RawHandle};
use crate::error::SurrealBridgeError;
use crate::handle::HandleResource;
use crate::value::Value;

pub use typed::{SynchronizedTypedCursor, TypedCursor, TypedRawCursor};

/// Lifecycle of a cursor. `Exhausted` and `Closed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CursorState {
    Active,
    Exhausted,
    /// Closed explicitly; the handle has been released.
    Closed,
}

#[doc(hidden)]
pub struct CursorInner {
    resource: HandleResource,
    state: CursorState,
}

impl CursorInner {
    fn has_next(&mut self) -> Result<bool, SurrealBridgeError> {
        if self.state != CursorState::Active {
            return Ok(false);
        }
        let more = self
            .resource
            .boundary()
            .cursor_has_next(self.resource.raw()?)?;
        if !more {
            tracing::trace!(cursor = self.resource.id(), "cursor exhausted");
            self.state = CursorState::Exhausted;
        }
        Ok(more)
    }

    fn next_value(&mut self) -> Result<Option<Value>, SurrealBridgeError> {
        if !self.has_next()? {
            return Ok(None);
        }
        let boundary = Arc::clone(self.resource.boundary());
        let handle = boundary.cursor_next(self.resource.raw()?)?;
        if handle == NO_HANDLE {
            self.state = CursorState::Exhausted;
            return Ok(None);
        }
        let resource = HandleResource::acquire_required(&boundary, handle, "cursor item")?;
        Value::read(resource).map(Some)
    }

    fn close(&mut self) -> Result<(), SurrealBridgeError> {
        if self.state == CursorState::Closed {
            return Ok(());
        }
        self.state = CursorState::Closed;
        self.resource.release()
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Interior-mutability strategy for cursor state.
pub trait StateCell: sealed::Sealed {
    #[doc(hidden)]
    fn wrap(inner: CursorInner) -> Self;

    #[doc(hidden)]
    fn with<R>(&self, f: impl FnOnce(&mut CursorInner) -> R) -> R;
}

impl sealed::Sealed for RefCell<CursorInner> {}

impl StateCell for RefCell<CursorInner> {
    fn wrap(inner: CursorInner) -> Self {
        RefCell::new(inner)
    }

    fn with<R>(&self, f: impl FnOnce(&mut CursorInner) -> R) -> R {
        f(&mut *self.borrow_mut())
    }
}

impl sealed::Sealed for Mutex<CursorInner> {}

impl StateCell for Mutex<CursorInner> {
    fn wrap(inner: CursorInner) -> Self {
        Mutex::new(inner)
    }

    /// The whole closure runs under the lock, so a check and the pull that
    /// follows it can not interleave with another thread's pull.
    fn with<R>(&self, f: impl FnOnce(&mut CursorInner) -> R) -> R {
        let mut guard = self.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut *guard)
    }
}

/// Concurrency policy of a cursor.
pub trait CursorPolicy: sealed::Sealed + 'static {
    type Cell: StateCell;

    /// Whether the issuing call must finish the statement before returning.
    const SNAPSHOT: bool;
}

/// Single-thread policy: streaming reads, `RefCell` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Unsynchronized {}

/// Shared policy: snapshot reads, `Mutex` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Synchronized {}

impl sealed::Sealed for Unsynchronized {}
impl sealed::Sealed for Synchronized {}

impl CursorPolicy for Unsynchronized {
    type Cell = RefCell<CursorInner>;
    const SNAPSHOT: bool = false;
}

impl CursorPolicy for Synchronized {
    type Cell = Mutex<CursorInner>;
    const SNAPSHOT: bool = true;
}

/// Lazy sequence of [`Value`]s backed by an engine cursor handle.
pub struct RawCursor<P: CursorPolicy> {
    cell: P::Cell,
    handle: RawHandle,
    _policy: PhantomData<P>,
}

/// Single-threaded streaming cursor. Not `Sync`.
pub type Cursor = RawCursor<Unsynchronized>;

/// Cursor over a finished snapshot; safe to pull from several threads.
pub type SynchronizedCursor = RawCursor<Synchronized>;

impl<P: CursorPolicy> RawCursor<P> {
    pub(crate) fn from_handle(
        boundary: &Arc<dyn Boundary>,
        handle: RawHandle,
    ) -> Result<Self, SurrealBridgeError> {
        let resource = HandleResource::acquire_required(boundary, handle, "cursor")?;
        Ok(Self {
            cell: P::Cell::wrap(CursorInner {
                resource,
                state: CursorState::Active,
            }),
            handle,
            _policy: PhantomData,
        })
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.handle
    }

    #[must_use]
    pub fn state(&self) -> CursorState {
        self.cell.with(|inner| inner.state)
    }

    /// May block on the engine. Once it returns `false` it keeps returning `false`.
    ///
    /// # Errors
    /// Boundary failures, e.g. a cursor invalidated by its connection's release.
    pub fn has_next(&self) -> Result<bool, SurrealBridgeError> {
        self.cell.with(CursorInner::has_next)
    }

    /// Next item, or `Ok(None)` once the cursor is exhausted or closed.
    ///
    /// # Errors
    /// Boundary failures and malformed item payloads.
    pub fn next_value(&self) -> Result<Option<Value>, SurrealBridgeError> {
        self.cell.with(CursorInner::next_value)
    }

    /// Release the cursor handle, abandoning any remaining items. Idempotent.
    ///
    /// # Errors
    /// Returns the engine's failure to dispose of the handle (reported once).
    pub fn close(&self) -> Result<(), SurrealBridgeError> {
        self.cell.with(CursorInner::close)
    }

    /// Drain the remaining items.
    ///
    /// # Errors
    /// Stops at the first failing pull.
    pub fn collect_values(&self) -> Result<Vec<Value>, SurrealBridgeError> {
        let mut values = Vec::new();
        while let Some(value) = self.next_value()? {
            values.push(value);
        }
        Ok(values)
    }
}

impl<P: CursorPolicy> Iterator for RawCursor<P> {
    type Item = Result<Value, SurrealBridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_value().transpose()
    }
}

impl<P: CursorPolicy> Iterator for &RawCursor<P> {
    type Item = Result<Value, SurrealBridgeError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_value().transpose()
    }
}

impl<P: CursorPolicy> fmt::Debug for RawCursor<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawCursor")
            .field("handle", &self.handle)
            .field("snapshot", &P::SNAPSHOT)
            .finish_non_exhaustive()
    }
}
