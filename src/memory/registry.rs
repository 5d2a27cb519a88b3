//! Handle table of the in-memory engine.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use surrealdb::Surreal;
use surrealdb::engine::any::Any;

use crate::boundary::{BoundaryError, BoundaryResult, BoundaryStatus, NO_HANDLE, RawHandle};
use crate::value::EngineValue;

use super::cursor::CursorSource;
use super::driver::Slots;

/// A connection handle: its own datastore client plus session flags.
pub(super) struct Link {
    pub(super) client: Surreal<Any>,
    pub(super) connected: bool,
    pub(super) signed_in: bool,
}

impl Link {
    pub(super) fn new() -> Self {
        Self {
            client: Surreal::init(),
            connected: false,
            signed_in: false,
        }
    }
}

impl fmt::Debug for Link {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link")
            .field("connected", &self.connected)
            .field("signed_in", &self.signed_in)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub(super) enum Resource {
    Connection(Link),
    Value(EngineValue),
    Response(Slots),
    Cursor(Arc<Mutex<CursorSource>>),
}

impl Resource {
    fn name(&self) -> &'static str {
        match self {
            Resource::Connection(_) => "connection",
            Resource::Value(_) => "value",
            Resource::Response(_) => "response",
            Resource::Cursor(_) => "cursor",
        }
    }
}

#[derive(Debug)]
struct Entry {
    owner: RawHandle,
    resource: Resource,
}

/// Live handles. Ids start at 1 and are never reused.
#[derive(Debug)]
pub(super) struct Registry {
    last: RawHandle,
    entries: HashMap<RawHandle, Entry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            last: NO_HANDLE,
            entries: HashMap::new(),
        }
    }
}

fn wrong_kind(handle: RawHandle, expected: &str, found: &str) -> BoundaryError {
    BoundaryError::new(
        BoundaryStatus::Handle,
        format!("handle {handle} is a {found}, expected a {expected}"),
    )
}

impl Registry {
    pub(super) fn len(&self) -> usize {
        self.entries.len()
    }

    /// Register a resource owned by `owner`. A connection owns itself.
    pub(super) fn insert(&mut self, owner: Option<RawHandle>, resource: Resource) -> RawHandle {
        self.last += 1;
        let handle = self.last;
        self.entries.insert(
            handle,
            Entry {
                owner: owner.unwrap_or(handle),
                resource,
            },
        );
        handle
    }

    pub(super) fn insert_value(&mut self, owner: RawHandle, value: EngineValue) -> RawHandle {
        self.insert(Some(owner), Resource::Value(value))
    }

    fn entry(&self, handle: RawHandle) -> BoundaryResult<&Entry> {
        self.entries
            .get(&handle)
            .ok_or_else(|| BoundaryError::handle(handle))
    }

    fn entry_mut(&mut self, handle: RawHandle) -> BoundaryResult<&mut Entry> {
        self.entries
            .get_mut(&handle)
            .ok_or_else(|| BoundaryError::handle(handle))
    }

    pub(super) fn owner(&self, handle: RawHandle) -> BoundaryResult<RawHandle> {
        Ok(self.entry(handle)?.owner)
    }

    pub(super) fn link(&self, conn: RawHandle) -> BoundaryResult<&Link> {
        match &self.entry(conn)?.resource {
            Resource::Connection(link) => Ok(link),
            other => Err(wrong_kind(conn, "connection", other.name())),
        }
    }

    pub(super) fn link_mut(&mut self, conn: RawHandle) -> BoundaryResult<&mut Link> {
        match &mut self.entry_mut(conn)?.resource {
            Resource::Connection(link) => Ok(link),
            other => Err(wrong_kind(conn, "connection", other.name())),
        }
    }

    pub(super) fn value(&self, handle: RawHandle) -> BoundaryResult<&EngineValue> {
        match &self.entry(handle)?.resource {
            Resource::Value(value) => Ok(value),
            other => Err(wrong_kind(handle, "value", other.name())),
        }
    }

    /// Remove a value handle, handing its content to the caller.
    pub(super) fn take_value(&mut self, handle: RawHandle) -> BoundaryResult<EngineValue> {
        self.value(handle)?;
        match self.entries.remove(&handle).map(|entry| entry.resource) {
            Some(Resource::Value(value)) => Ok(value),
            _ => Err(BoundaryError::handle(handle)),
        }
    }

    /// Take every handle, even when some of them are invalid.
    pub(super) fn take_values(&mut self, handles: &[RawHandle]) -> BoundaryResult<Vec<EngineValue>> {
        let taken: Vec<_> = handles.iter().map(|h| self.take_value(*h)).collect();
        taken.into_iter().collect()
    }

    pub(super) fn response(&self, handle: RawHandle) -> BoundaryResult<&Slots> {
        match &self.entry(handle)?.resource {
            Resource::Response(slots) => Ok(slots),
            other => Err(wrong_kind(handle, "response", other.name())),
        }
    }

    /// Shared so a pull can run without holding the table.
    pub(super) fn cursor(&self, handle: RawHandle) -> BoundaryResult<Arc<Mutex<CursorSource>>> {
        match &self.entry(handle)?.resource {
            Resource::Cursor(source) => Ok(Arc::clone(source)),
            other => Err(wrong_kind(handle, "cursor", other.name())),
        }
    }

    /// Drop a handle. Releasing a connection drops everything it owns.
    /// Returns how many handles went away; zero for an unknown handle.
    pub(super) fn release(&mut self, handle: RawHandle) -> usize {
        let Some(entry) = self.entries.remove(&handle) else {
            return 0;
        };
        if matches!(entry.resource, Resource::Connection(_)) {
            let before = self.entries.len();
            self.entries.retain(|_, e| e.owner != handle);
            1 + before - self.entries.len()
        } else {
            1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handles_are_never_reused() {
        let mut registry = Registry::default();
        let a = registry.insert(None, Resource::Connection(Link::new()));
        assert_eq!(registry.release(a), 1);
        let b = registry.insert(None, Resource::Connection(Link::new()));
        assert_ne!(a, b);
        assert_ne!(b, NO_HANDLE);
    }

    #[test]
    fn releasing_a_connection_drops_owned_handles() {
        let mut registry = Registry::default();
        let conn = registry.insert(None, Resource::Connection(Link::new()));
        let other = registry.insert(None, Resource::Connection(Link::new()));
        registry.insert_value(conn, EngineValue::Int(1));
        registry.insert_value(conn, EngineValue::Int(2));
        let kept = registry.insert_value(other, EngineValue::Int(3));
        assert_eq!(registry.release(conn), 3);
        assert_eq!(registry.len(), 2);
        assert!(registry.value(kept).is_ok());
        assert_eq!(registry.release(conn), 0);
    }

    #[test]
    fn cursors_are_shared_not_moved() {
        let mut registry = Registry::default();
        let conn = registry.insert(None, Resource::Connection(Link::new()));
        let source = CursorSource::Snapshot(vec![EngineValue::Int(1)].into());
        let cursor = registry.insert(Some(conn), Resource::Cursor(Arc::new(Mutex::new(source))));
        let shared = registry.cursor(cursor).unwrap();
        assert_eq!(shared.lock().unwrap().next().unwrap(), Some(EngineValue::Int(1)));
        assert_eq!(registry.release(cursor), 1);
        assert_eq!(shared.lock().unwrap().next().unwrap(), None);
        assert!(registry.cursor(conn).is_err());
    }

    #[test]
    fn take_values_consumes_valid_handles_on_failure() {
        let mut registry = Registry::default();
        let conn = registry.insert(None, Resource::Connection(Link::new()));
        let value = registry.insert_value(conn, EngineValue::Null);
        let err = registry.take_values(&[value, 999]).unwrap_err();
        assert_eq!(err.status, BoundaryStatus::Handle);
        assert!(registry.value(value).is_err());
        assert!(registry.link(value).is_err());
        assert!(registry.link(conn).is_ok());
    }
}
