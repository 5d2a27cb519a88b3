use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::boundary::{Boundary, NO_HANDLE, RawHandle};
use crate::error::SurrealBridgeError;

/// Owner of exactly one engine-side handle.
///
/// The handle is released at most once: either through [`HandleResource::release`]
/// or when the wrapper is dropped. After release the raw handle is no longer
/// reachable through the wrapper, so a released handle can not be passed back
/// to the engine by mistake.
///
/// Equality and hashing only look at the handle value.
pub struct HandleResource {
    boundary: Arc<dyn Boundary>,
    handle: RawHandle,
    released: bool,
}

impl HandleResource {
    /// Take ownership of a handle returned by a boundary call.
    ///
    /// Returns `None` for the "no result" sentinel.
    #[must_use]
    pub fn acquire(boundary: Arc<dyn Boundary>, handle: RawHandle) -> Option<Self> {
        if handle == NO_HANDLE {
            return None;
        }
        Some(Self {
            boundary,
            handle,
            released: false,
        })
    }

    pub(crate) fn acquire_required(
        boundary: &Arc<dyn Boundary>,
        handle: RawHandle,
        what: &str,
    ) -> Result<Self, SurrealBridgeError> {
        Self::acquire(Arc::clone(boundary), handle).ok_or_else(|| {
            SurrealBridgeError::UnexpectedResponse(format!("engine returned no {what} handle"))
        })
    }

    /// The owned handle, or a [`SurrealBridgeError::HandleError`] once released.
    ///
    /// # Errors
    /// Fails only after the wrapper has been released.
    pub fn raw(&self) -> Result<RawHandle, SurrealBridgeError> {
        if self.released {
            return Err(SurrealBridgeError::HandleError(format!(
                "handle {} was already released",
                self.handle
            )));
        }
        Ok(self.handle)
    }

    /// Handle value, available even after release (for logging and identity).
    #[must_use]
    pub fn id(&self) -> RawHandle {
        self.handle
    }

    #[must_use]
    pub fn is_released(&self) -> bool {
        self.released
    }

    #[must_use]
    pub fn boundary(&self) -> &Arc<dyn Boundary> {
        &self.boundary
    }

    /// Send the disposal call. Subsequent calls do nothing.
    ///
    /// The wrapper counts as released even when the disposal call fails; the
    /// failure is returned so it is not lost, but it is never retried.
    ///
    /// # Errors
    /// Returns the engine's failure to dispose of the handle.
    pub fn release(&mut self) -> Result<(), SurrealBridgeError> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        match self.boundary.release(self.handle) {
            Ok(true) => {
                tracing::trace!(handle = self.handle, "released engine handle");
                Ok(())
            }
            Ok(false) => Err(SurrealBridgeError::HandleError(format!(
                "engine no longer knew handle {}",
                self.handle
            ))),
            Err(err) => Err(err.into()),
        }
    }

    /// Give up ownership without a disposal call; the engine now owns the handle.
    #[must_use]
    pub fn into_raw(mut self) -> RawHandle {
        self.released = true;
        self.handle
    }
}

impl Drop for HandleResource {
    fn drop(&mut self) {
        if let Err(err) = self.release() {
            tracing::warn!(handle = self.handle, error = %err, "failed to release engine handle");
        }
    }
}

impl PartialEq for HandleResource {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

impl Eq for HandleResource {}

impl Hash for HandleResource {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.handle.hash(state);
    }
}

impl fmt::Debug for HandleResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandleResource")
            .field("handle", &self.handle)
            .field("released", &self.released)
            .finish()
    }
}
