use std::fmt;

use crate::error::ConversionError;
use crate::value::{EngineValue, Object, ValueKind};

use super::{DecodeContext, FromEngine};

/// Shape a descriptor expects from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    Bool,
    Int,
    Float,
    Decimal,
    String,
    Datetime,
    Duration,
    RecordId,
    Array,
    Object,
    Any,
}

/// Descriptor type of one field: the expected kind and whether NONE/NULL are allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FieldType {
    pub kind: FieldKind,
    pub nullable: bool,
}

impl FieldType {
    #[must_use]
    pub const fn required(kind: FieldKind) -> Self {
        Self {
            kind,
            nullable: false,
        }
    }

    #[must_use]
    pub const fn nullable(self) -> Self {
        Self {
            kind: self.kind,
            nullable: true,
        }
    }

    /// Whether an engine value with tag `found` can populate this field.
    #[must_use]
    pub fn accepts(&self, found: ValueKind) -> bool {
        match found {
            ValueKind::None | ValueKind::Null => self.nullable,
            _ => match self.kind {
                FieldKind::Any => true,
                FieldKind::Bool => found == ValueKind::Bool,
                FieldKind::Int => found == ValueKind::Int,
                FieldKind::Float | FieldKind::Decimal => found.is_number(),
                FieldKind::String => found == ValueKind::String,
                FieldKind::Datetime => found == ValueKind::Datetime,
                FieldKind::Duration => found == ValueKind::Duration,
                FieldKind::RecordId => found == ValueKind::RecordId,
                FieldKind::Array => found == ValueKind::Array,
                FieldKind::Object => found == ValueKind::Object,
            },
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.kind {
            FieldKind::Bool => "bool",
            FieldKind::Int => "int",
            FieldKind::Float => "float",
            FieldKind::Decimal => "decimal",
            FieldKind::String => "string",
            FieldKind::Datetime => "datetime",
            FieldKind::Duration => "duration",
            FieldKind::RecordId => "record",
            FieldKind::Array => "array",
            FieldKind::Object => "object",
            FieldKind::Any => "any",
        };
        if self.nullable {
            write!(f, "option<{name}>")
        } else {
            f.write_str(name)
        }
    }
}

/// Maps one struct field to one engine key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub key: &'static str,
    pub field_type: FieldType,
}

/// Statically registered description of a record type.
#[derive(Debug, PartialEq, Eq)]
pub struct Schema {
    pub type_name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl Schema {
    #[must_use]
    pub fn field_by_key(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// Validate `value` against this schema and keep only described keys.
    ///
    /// # Errors
    /// Fails on a non-object value, a field whose engine tag the descriptor
    /// rejects, or an unknown key under [`super::UnknownKeys::Reject`].
    pub fn project(
        &self,
        value: &EngineValue,
        cx: &DecodeContext<'_>,
    ) -> Result<Object, ConversionError> {
        let fields = record_fields(self, value, cx)?;
        let mut projected = Object::new();
        for field in self.fields {
            let found = fields.get(field.key).unwrap_or(&EngineValue::None);
            if !field.field_type.accepts(found.kind()) {
                return Err(ConversionError::mismatch(
                    &cx.child(field.key).path,
                    field.field_type.to_string(),
                    found.kind(),
                ));
            }
            if !found.is_none() {
                projected.insert(field.key.to_string(), found.clone());
            }
        }
        Ok(projected)
    }
}

/// Types with a statically registered [`Schema`], usually generated by [`crate::record!`].
pub trait Record: FromEngine {
    fn schema() -> &'static Schema;
}

/// Object fields of `value`, after applying the unknown-key policy.
///
/// # Errors
/// See [`Schema::project`].
pub fn record_fields<'v>(
    schema: &Schema,
    value: &'v EngineValue,
    cx: &DecodeContext<'_>,
) -> Result<&'v Object, ConversionError> {
    let Some(fields) = value.as_object() else {
        return Err(ConversionError::mismatch(
            &cx.path,
            format!("object ({})", schema.type_name),
            value.kind(),
        ));
    };
    for key in fields.keys() {
        if schema.field_by_key(key).is_some() {
            continue;
        }
        if cx.rejects_unknown() {
            return Err(ConversionError::UnknownField {
                path: cx.display_path(),
                key: key.clone(),
            });
        }
        tracing::trace!(type_name = schema.type_name, key = %key, "dropping unmapped key");
    }
    Ok(fields)
}

/// Decode one described field, checking the descriptor against the engine tag first.
///
/// # Errors
/// [`ConversionError::SchemaMismatch`] when the tag is incompatible, otherwise
/// whatever `T` reports.
pub fn decode_field<T: FromEngine>(
    fields: &Object,
    key: &str,
    cx: &DecodeContext<'_>,
) -> Result<T, ConversionError> {
    let found = fields.get(key).unwrap_or(&EngineValue::None);
    let child = cx.child(key);
    if !T::FIELD_TYPE.accepts(found.kind()) {
        return Err(ConversionError::mismatch(
            &child.path,
            T::FIELD_TYPE.to_string(),
            found.kind(),
        ));
    }
    T::from_engine(found, &child)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_key {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident => $key:literal) => {
        $key
    };
}

/// Define a struct together with its static schema descriptor and its
/// conversions to and from engine values.
///
/// A field may be mapped to a different engine key with `=> "key"`.
///
/// ```rust
/// use surreal_bridge::record;
/// use surreal_bridge::convert::TriState;
///
/// record! {
///     #[derive(Debug, Clone, PartialEq)]
///     pub struct Person {
///         pub name: String,
///         pub nickname: TriState<String> => "nick",
///     }
/// }
/// ```
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty $(=> $key:literal)?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::convert::Record for $name {
            fn schema() -> &'static $crate::convert::Schema {
                static SCHEMA: $crate::convert::Schema = $crate::convert::Schema {
                    type_name: stringify!($name),
                    fields: &[
                        $(
                            $crate::convert::FieldDescriptor {
                                name: stringify!($field),
                                key: $crate::__record_key!($field $(=> $key)?),
                                field_type: <$ty as $crate::convert::FromEngine>::FIELD_TYPE,
                            },
                        )*
                    ],
                };
                &SCHEMA
            }
        }

        impl $crate::convert::IntoEngine for $name {
            fn to_engine(
                &self,
            ) -> ::std::result::Result<$crate::value::EngineValue, $crate::error::ConversionError> {
                let mut fields = $crate::value::Object::new();
                $(
                    let value = $crate::convert::IntoEngine::to_engine(&self.$field)?;
                    if !value.is_none() {
                        fields.insert(
                            ::std::string::String::from($crate::__record_key!($field $(=> $key)?)),
                            value,
                        );
                    }
                )*
                Ok($crate::value::EngineValue::Object(fields))
            }
        }

        impl $crate::convert::FromEngine for $name {
            const FIELD_TYPE: $crate::convert::FieldType =
                $crate::convert::FieldType::required($crate::convert::FieldKind::Object);

            fn from_engine(
                value: &$crate::value::EngineValue,
                cx: &$crate::convert::DecodeContext<'_>,
            ) -> ::std::result::Result<Self, $crate::error::ConversionError> {
                let schema = <Self as $crate::convert::Record>::schema();
                let fields = $crate::convert::record_fields(schema, value, cx)?;
                Ok(Self {
                    $(
                        $field: $crate::convert::decode_field::<$ty>(
                            fields,
                            $crate::__record_key!($field $(=> $key)?),
                            cx,
                        )?,
                    )*
                })
            }
        }
    };
}
