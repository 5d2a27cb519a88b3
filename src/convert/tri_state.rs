use crate::error::ConversionError;
use crate::value::EngineValue;

use super::{DecodeContext, FieldType, FromEngine, IntoEngine};

/// A field that can be missing, explicitly null, or set.
///
/// Unlike `Option<T>`, which reads both NONE and NULL as `None`, this keeps the
/// two apart in both directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TriState<T> {
    #[default]
    Absent,
    Null,
    Present(T),
}

impl<T> TriState<T> {
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, TriState::Absent)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, TriState::Null)
    }

    #[must_use]
    pub fn as_ref(&self) -> TriState<&T> {
        match self {
            TriState::Absent => TriState::Absent,
            TriState::Null => TriState::Null,
            TriState::Present(value) => TriState::Present(value),
        }
    }

    /// Collapse to `Option`, losing the absent/null distinction.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            TriState::Present(value) => Some(value),
            TriState::Absent | TriState::Null => None,
        }
    }
}

impl<T> From<Option<T>> for TriState<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(TriState::Null, TriState::Present)
    }
}

impl<T: IntoEngine> IntoEngine for TriState<T> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        match self {
            TriState::Absent => Ok(EngineValue::None),
            TriState::Null => Ok(EngineValue::Null),
            TriState::Present(value) => value.to_engine(),
        }
    }
}

impl<T: FromEngine> FromEngine for TriState<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE.nullable();

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        match value {
            EngineValue::None => Ok(TriState::Absent),
            EngineValue::Null => Ok(TriState::Null),
            other => {
                if !T::FIELD_TYPE.accepts(other.kind()) {
                    return Err(cx.mismatch(T::FIELD_TYPE.to_string(), other));
                }
                T::from_engine(other, cx).map(TriState::Present)
            }
        }
    }
}
