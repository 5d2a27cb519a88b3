//! Convenient imports for common functionality.
//!
//! This module re-exports the most commonly used types so a single
//! `use surreal_bridge::prelude::*;` is enough to get started.

pub use crate::auth::{Credentials, Token};
pub use crate::boundary::{Boundary, BoundaryError, BoundaryStatus, NO_HANDLE, RawHandle};
pub use crate::config::{ClientOptions, ClientOptionsBuilder};
pub use crate::connection::Surreal;
pub use crate::convert::{
    ConverterOptions, FromEngine, IntoEngine, Record, TriState, UnknownKeys, ValueConverter,
};
pub use crate::cursor::{
    Cursor, CursorState, SynchronizedCursor, SynchronizedTypedCursor, TypedCursor,
};
pub use crate::error::{ConversionError, SurrealBridgeError};
pub use crate::handle::HandleResource;
pub use crate::record::{RecordIdKey, RecordKey, Target};
pub use crate::response::ResponseTable;
pub use crate::types::UpdateKind;
pub use crate::value::{Decimal, EngineValue, MutableValue, Object, Value, ValueKind};
pub use crate::worker::AsyncSurreal;

#[cfg(feature = "memory")]
pub use crate::memory::{MemoryEngine, MemoryOptions, MemoryOptionsBuilder};
