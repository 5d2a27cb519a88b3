//! Conversion between host types and engine values.
//!
//! [`IntoEngine`] and [`FromEngine`] describe how one Rust type maps onto the
//! engine's tagged value model. Structs get both through the [`crate::record!`]
//! macro, which also emits a static [`Schema`]. [`ValueConverter`] ties the
//! traits to the boundary: encoding produces one [`MutableValue`] per object
//! tree, decoding reads one payload per [`Value`].

mod primitives;
mod schema;
mod tri_state;

use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

use crate::connection::Surreal;
use crate::error::{ConversionError, SurrealBridgeError};
use crate::value::{EngineValue, MutableValue, Object, Value};

pub use schema::{
    FieldDescriptor, FieldKind, FieldType, Record, Schema, decode_field, record_fields,
};
pub use tri_state::TriState;

/// Policy for object keys that no descriptor field maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownKeys {
    #[default]
    Drop,
    Reject,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(default)]
pub struct ConverterOptions {
    pub unknown_keys: UnknownKeys,
}

/// Host type that can be written into an engine value.
pub trait IntoEngine {
    /// # Errors
    /// [`ConversionError::EncodingOverflow`] when the value can not be represented.
    fn to_engine(&self) -> Result<EngineValue, ConversionError>;
}

/// Host type that can be read back from an engine value.
pub trait FromEngine: Sized {
    /// Engine shape this type accepts, checked before `from_engine` runs on a field.
    const FIELD_TYPE: FieldType;

    /// # Errors
    /// [`ConversionError::SchemaMismatch`] when `value` has the wrong tag,
    /// [`ConversionError::EncodingOverflow`] when it does not fit.
    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError>;
}

impl<T: IntoEngine + ?Sized> IntoEngine for &T {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        (**self).to_engine()
    }
}

/// Decoding position: the converter options plus the field path walked so far.
#[derive(Debug, Clone)]
pub struct DecodeContext<'a> {
    options: &'a ConverterOptions,
    pub(crate) path: String,
}

impl<'a> DecodeContext<'a> {
    #[must_use]
    pub fn new(options: &'a ConverterOptions) -> Self {
        Self {
            options,
            path: String::new(),
        }
    }

    #[must_use]
    pub fn child(&self, key: &str) -> DecodeContext<'a> {
        let path = if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{key}", self.path)
        };
        DecodeContext {
            options: self.options,
            path,
        }
    }

    #[must_use]
    pub fn index(&self, index: usize) -> DecodeContext<'a> {
        DecodeContext {
            options: self.options,
            path: format!("{}[{index}]", self.path),
        }
    }

    #[must_use]
    pub fn rejects_unknown(&self) -> bool {
        self.options.unknown_keys == UnknownKeys::Reject
    }

    /// Path for error messages; the root is `$`.
    #[must_use]
    pub fn display_path(&self) -> String {
        if self.path.is_empty() {
            "$".to_string()
        } else {
            self.path.clone()
        }
    }

    pub(crate) fn mismatch(&self, expected: impl Into<String>, found: &EngineValue) -> ConversionError {
        ConversionError::mismatch(&self.path, expected, found.kind())
    }
}

/// Encodes host objects into staged engine values and decodes engine values
/// into host objects.
#[derive(Clone, Default)]
pub struct ValueConverter {
    options: ConverterOptions,
    registry: HashMap<&'static str, &'static Schema>,
}

impl ValueConverter {
    #[must_use]
    pub fn new(options: ConverterOptions) -> Self {
        Self {
            options,
            registry: HashMap::new(),
        }
    }

    #[must_use]
    pub fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Make `T`'s schema available to the by-name operations.
    pub fn register<T: Record>(&mut self) -> &mut Self {
        let schema = T::schema();
        self.registry.insert(schema.type_name, schema);
        self
    }

    /// # Errors
    /// [`ConversionError::UnsupportedType`] when nothing is registered under `type_name`.
    pub fn schema(&self, type_name: &str) -> Result<&'static Schema, ConversionError> {
        self.registry.get(type_name).copied().ok_or_else(|| {
            ConversionError::UnsupportedType(format!("no descriptor registered for `{type_name}`"))
        })
    }

    /// Host-side encoding, without touching the boundary.
    ///
    /// # Errors
    /// See [`IntoEngine::to_engine`].
    pub fn to_engine<T: IntoEngine + ?Sized>(&self, object: &T) -> Result<EngineValue, ConversionError> {
        object.to_engine()
    }

    /// Host-side decoding of an engine value tree.
    ///
    /// # Errors
    /// See [`FromEngine::from_engine`].
    pub fn from_engine<T: FromEngine>(&self, value: &EngineValue) -> Result<T, ConversionError> {
        let cx = DecodeContext::new(&self.options);
        if !T::FIELD_TYPE.accepts(value.kind()) {
            return Err(cx.mismatch(T::FIELD_TYPE.to_string(), value));
        }
        T::from_engine(value, &cx)
    }

    /// Encode `object` into a single engine value owned by `surreal`'s connection.
    ///
    /// # Errors
    /// Conversion failures, or the boundary's failure to allocate the value.
    pub fn encode<T: IntoEngine + ?Sized>(
        &self,
        surreal: &Surreal,
        object: &T,
    ) -> Result<MutableValue, SurrealBridgeError> {
        let tree = object.to_engine()?;
        MutableValue::stage(surreal, &tree)
    }

    /// Decode a handle-backed value into `T`.
    ///
    /// # Errors
    /// Conversion failures wrapped as [`SurrealBridgeError::ConversionError`].
    pub fn decode<T: FromEngine>(&self, value: &Value) -> Result<T, SurrealBridgeError> {
        Ok(self.from_engine(value.as_engine())?)
    }

    /// Validate `value` against the schema registered as `type_name` and keep
    /// only the described keys.
    ///
    /// # Errors
    /// [`ConversionError::UnsupportedType`] for an unregistered name, otherwise
    /// see [`Schema::project`].
    pub fn decode_named(&self, value: &Value, type_name: &str) -> Result<Object, SurrealBridgeError> {
        let schema = self.schema(type_name)?;
        let cx = DecodeContext::new(&self.options);
        Ok(schema.project(value.as_engine(), &cx)?)
    }
}

impl fmt::Debug for ValueConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.registry.keys().copied().collect();
        names.sort_unstable();
        f.debug_struct("ValueConverter")
            .field("options", &self.options)
            .field("registered", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record;
    use crate::record::RecordKey;

    record! {
        #[derive(Debug, Clone, PartialEq)]
        struct Person {
            id: Option<RecordKey>,
            name: String,
            age: TriState<i64>,
            tags: Vec<String> => "labels",
        }
    }

    fn person_value() -> EngineValue {
        let mut fields = Object::new();
        fields.insert("id".into(), EngineValue::RecordId(RecordKey::new("person", 1)));
        fields.insert("name".into(), "Tobie".into());
        fields.insert("age".into(), EngineValue::Null);
        fields.insert(
            "labels".into(),
            EngineValue::Array(vec!["a".into(), "b".into()]),
        );
        fields.insert("extra".into(), EngineValue::Bool(true));
        EngineValue::Object(fields)
    }

    #[test]
    fn decodes_described_fields_and_drops_unknown_keys() {
        let converter = ValueConverter::default();
        let person: Person = converter.from_engine(&person_value()).unwrap();
        assert_eq!(person.id, Some(RecordKey::new("person", 1)));
        assert_eq!(person.name, "Tobie");
        assert_eq!(person.age, TriState::Null);
        assert_eq!(person.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn reject_policy_names_the_unknown_key() {
        let converter = ValueConverter::new(ConverterOptions {
            unknown_keys: UnknownKeys::Reject,
        });
        let err = converter.from_engine::<Person>(&person_value()).unwrap_err();
        assert_eq!(
            err,
            ConversionError::UnknownField {
                path: "$".into(),
                key: "extra".into()
            }
        );
    }

    #[test]
    fn mismatch_carries_field_path() {
        let mut value = person_value();
        if let EngineValue::Object(fields) = &mut value {
            fields.insert("name".into(), EngineValue::Int(3));
        }
        let err = ValueConverter::default()
            .from_engine::<Person>(&value)
            .unwrap_err();
        match err {
            ConversionError::SchemaMismatch { path, expected, found } => {
                assert_eq!(path, "name");
                assert_eq!(expected, "string");
                assert_eq!(found, "int");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn encoding_omits_absent_fields_and_uses_mapped_keys() {
        let person = Person {
            id: None,
            name: "Jaime".into(),
            age: TriState::Absent,
            tags: vec![],
        };
        let value = person.to_engine().unwrap();
        let fields = value.as_object().unwrap();
        assert!(!fields.contains_key("id"));
        assert!(!fields.contains_key("age"));
        assert_eq!(fields.get("labels"), Some(&EngineValue::Array(vec![])));
    }

    #[test]
    fn schema_lists_fields_in_declaration_order() {
        let schema = Person::schema();
        assert_eq!(schema.type_name, "Person");
        let keys: Vec<_> = schema.fields.iter().map(|f| f.key).collect();
        assert_eq!(keys, ["id", "name", "age", "labels"]);
        assert!(schema.fields[2].field_type.nullable);
    }

    #[test]
    fn unregistered_names_are_unsupported() {
        let mut converter = ValueConverter::default();
        assert!(matches!(
            converter.schema("Person"),
            Err(ConversionError::UnsupportedType(_))
        ));
        converter.register::<Person>();
        assert!(converter.schema("Person").is_ok());
    }
}
