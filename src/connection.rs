//! The synchronous client.
//!
//! [`Surreal`] owns one engine connection handle and routes every operation
//! through the [`Boundary`](crate::boundary::Boundary). All calls block until
//! the engine answers.

mod dml;
mod query;
mod select;
mod session;

pub use session::Surreal;
