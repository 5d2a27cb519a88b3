//! The opaque call surface of the engine.
//!
//! Every entry point exchanges primitive data only: integer handles, booleans,
//! strings, and value payloads produced by [`crate::value::wire`]. Handles are
//! plain `u64`s; `0` means "no result". The engine owns whatever a handle refers
//! to until [`Boundary::release`] is called for it.
//!
//! Releasing a connection handle invalidates every handle the engine derived
//! from that connection. The wrappers in this crate do not track that
//! relationship; callers keep connections alive for as long as they use the
//! values and cursors produced through them.

use std::fmt;

use thiserror::Error;

/// Raw engine handle. `0` is the "no result" sentinel.
pub type RawHandle = u64;

/// Sentinel returned when a call has nothing to hand back.
pub const NO_HANDLE: RawHandle = 0;

/// Failure category reported across the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoundaryStatus {
    Connection,
    Auth,
    Query,
    Handle,
    Payload,
    Internal,
}

impl fmt::Display for BoundaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BoundaryStatus::Connection => "connection",
            BoundaryStatus::Auth => "auth",
            BoundaryStatus::Query => "query",
            BoundaryStatus::Handle => "handle",
            BoundaryStatus::Payload => "payload",
            BoundaryStatus::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Error returned by a boundary call: a status code plus the engine's message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} failure: {message}")]
pub struct BoundaryError {
    pub status: BoundaryStatus,
    pub message: String,
}

impl BoundaryError {
    pub fn new(status: BoundaryStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn handle(handle: RawHandle) -> Self {
        Self::new(
            BoundaryStatus::Handle,
            format!("handle {handle} is not live"),
        )
    }
}

pub type BoundaryResult<T> = Result<T, BoundaryError>;

/// Primitive entry points of the engine.
///
/// Value handles passed as content (`value`, `values`, bound parameters) are
/// consumed by the call whether it succeeds or fails; the caller must not
/// release them afterwards. Returned handles belong to the caller.
pub trait Boundary: Send + Sync {
    fn new_connection(&self) -> BoundaryResult<RawHandle>;

    fn connect(&self, conn: RawHandle, address: &str) -> BoundaryResult<bool>;

    fn signin_root(&self, conn: RawHandle, username: &str, password: &str)
    -> BoundaryResult<String>;

    fn signin_namespace(
        &self,
        conn: RawHandle,
        username: &str,
        password: &str,
        namespace: &str,
    ) -> BoundaryResult<String>;

    fn signin_database(
        &self,
        conn: RawHandle,
        username: &str,
        password: &str,
        namespace: &str,
        database: &str,
    ) -> BoundaryResult<String>;

    fn use_namespace(&self, conn: RawHandle, name: &str) -> BoundaryResult<bool>;

    fn use_database(&self, conn: RawHandle, name: &str) -> BoundaryResult<bool>;

    /// Submit a (possibly multi-statement) script. Returns a response handle.
    fn query(&self, conn: RawHandle, text: &str) -> BoundaryResult<RawHandle>;

    fn query_bind(
        &self,
        conn: RawHandle,
        text: &str,
        params: &[(String, RawHandle)],
    ) -> BoundaryResult<RawHandle>;

    fn response_len(&self, response: RawHandle) -> BoundaryResult<usize>;

    /// Value handle for one statement, or that statement's own failure.
    fn response_take(&self, response: RawHandle, index: usize) -> BoundaryResult<RawHandle>;

    fn value_new(&self, conn: RawHandle, payload: &str) -> BoundaryResult<RawHandle>;

    fn value_read(&self, value: RawHandle) -> BoundaryResult<String>;

    fn create_record(&self, conn: RawHandle, key: &str, value: RawHandle)
    -> BoundaryResult<RawHandle>;

    fn create_target(
        &self,
        conn: RawHandle,
        target: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>>;

    fn insert_target(
        &self,
        conn: RawHandle,
        target: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>>;

    fn insert_relations(
        &self,
        conn: RawHandle,
        table: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>>;

    fn relate(
        &self,
        conn: RawHandle,
        from: &str,
        edge_table: &str,
        to: &str,
        value: Option<RawHandle>,
    ) -> BoundaryResult<RawHandle>;

    /// Returns [`NO_HANDLE`] when the record does not exist.
    fn update_record(
        &self,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle>;

    /// Returns a cursor handle. With `snapshot` the engine finishes the whole
    /// statement before returning; otherwise items are read as they are pulled.
    fn update_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle>;

    fn upsert_record(
        &self,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle>;

    fn upsert_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle>;

    /// Returns [`NO_HANDLE`] on a miss.
    fn select_record(&self, conn: RawHandle, key: &str) -> BoundaryResult<RawHandle>;

    fn select_records(&self, conn: RawHandle, keys: &[&str]) -> BoundaryResult<Vec<RawHandle>>;

    fn select_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        snapshot: bool,
    ) -> BoundaryResult<RawHandle>;

    fn delete_record(&self, conn: RawHandle, key: &str) -> BoundaryResult<bool>;

    fn delete_records(&self, conn: RawHandle, keys: &[&str]) -> BoundaryResult<bool>;

    fn delete_target(&self, conn: RawHandle, target: &str) -> BoundaryResult<bool>;

    fn cursor_has_next(&self, cursor: RawHandle) -> BoundaryResult<bool>;

    fn cursor_next(&self, cursor: RawHandle) -> BoundaryResult<RawHandle>;

    /// Dispose of any handle. `Ok(false)` means the engine did not know it.
    fn release(&self, handle: RawHandle) -> BoundaryResult<bool>;
}
