//! Client-side access layer over an opaque database engine boundary.
//!
//! The engine is reached only through [`boundary::Boundary`], a set of
//! primitive entry points that exchange integer handles, booleans and string
//! payloads. This crate owns the hard part of talking to it:
//!
//! - [`handle::HandleResource`] releases every engine handle exactly once.
//! - [`convert::ValueConverter`] maps host types to the engine value model and
//!   back, keeping absent, null and present apart.
//! - [`cursor::Cursor`] and [`cursor::SynchronizedCursor`] pull results one at
//!   a time, streamed or as a finished snapshot.
//! - [`response::ResponseTable`] exposes per-statement outcomes of a script.
//!
//! With the default `memory` feature, [`memory::MemoryEngine`] provides an
//! in-process engine (an embedded SurrealDB datastore) so everything above
//! runs without an external server.
//!
//! # Decimal precision
//!
//! [`value::Decimal`] keeps an `i128` mantissa, so it holds at most 38
//! significant digits ([`value::MAX_DECIMAL_DIGITS`]); longer text fails with
//! [`ConversionError::EncodingOverflow`]. The bundled engine stores decimals
//! with at most 28 significant digits and refuses wider ones with a
//! [`ConversionError::Wire`] error instead of rounding them.
//!
//! ```rust
//! use std::sync::Arc;
//! use surreal_bridge::prelude::*;
//!
//! # fn main() -> Result<(), SurrealBridgeError> {
//! let options = ClientOptions::builder("memory")
//!     .namespace("test")
//!     .database("test")
//!     .finish()?;
//! let db = Surreal::open(Arc::new(MemoryEngine::default()), &options)?;
//!
//! let key = RecordKey::new("person", 1);
//! db.create(&key, &serde_json::json!({"name": "Tobie"}))?;
//! db.update(&key, UpdateKind::Merge, &serde_json::json!({"name": "Jaime"}))?;
//! let person = db.select(&key)?.expect("record exists");
//! assert_eq!(person.field("name").as_str(), Some("Jaime"));
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod boundary;
pub mod config;
pub mod connection;
pub mod convert;
pub mod cursor;
pub mod error;
pub mod handle;
#[cfg(feature = "memory")]
pub mod memory;
pub mod prelude;
pub mod record;
pub mod response;
pub mod types;
pub mod value;
pub mod worker;

pub use connection::Surreal;
pub use error::{ConversionError, SurrealBridgeError};
