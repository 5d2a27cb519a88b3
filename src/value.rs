//! The engine's value model on the host side.
//!
//! [`EngineValue`] is a plain tree; [`Value`] and [`MutableValue`] tie a tree
//! to an engine handle for reading and writing respectively.

mod decimal;
mod model;
mod owned;
pub mod wire;

pub use decimal::{Decimal, MAX_DECIMAL_DIGITS};
pub use model::{EngineValue, Object, ValueKind};
pub use owned::{MutableValue, Value};
