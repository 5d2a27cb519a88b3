use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, FixedOffset};
use serde_json::Value as JsonValue;

use crate::record::RecordKey;

use super::decimal::Decimal;

/// Object payload: ordered field name to value.
pub type Object = BTreeMap<String, EngineValue>;

/// Host-side mirror of the engine's tagged value model.
///
/// `None` (absent) and `Null` (explicit null) are distinct values and are kept
/// distinct through every conversion.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum EngineValue {
    /// Absent: no value at all
    #[default]
    None,
    /// Explicit null
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    String(String),
    /// Instant with its UTC offset
    Datetime(DateTime<FixedOffset>),
    Duration(Duration),
    Array(Vec<EngineValue>),
    Object(Object),
    RecordId(RecordKey),
}

/// Tag of an [`EngineValue`], used for type predicates and schema checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    None,
    Null,
    Bool,
    Int,
    Float,
    Decimal,
    String,
    Datetime,
    Duration,
    Array,
    Object,
    RecordId,
}

impl ValueKind {
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ValueKind::None => "none",
            ValueKind::Null => "null",
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Float => "float",
            ValueKind::Decimal => "decimal",
            ValueKind::String => "string",
            ValueKind::Datetime => "datetime",
            ValueKind::Duration => "duration",
            ValueKind::Array => "array",
            ValueKind::Object => "object",
            ValueKind::RecordId => "record",
        }
    }

    #[must_use]
    pub fn is_number(self) -> bool {
        matches!(self, ValueKind::Int | ValueKind::Float | ValueKind::Decimal)
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl EngineValue {
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            EngineValue::None => ValueKind::None,
            EngineValue::Null => ValueKind::Null,
            EngineValue::Bool(_) => ValueKind::Bool,
            EngineValue::Int(_) => ValueKind::Int,
            EngineValue::Float(_) => ValueKind::Float,
            EngineValue::Decimal(_) => ValueKind::Decimal,
            EngineValue::String(_) => ValueKind::String,
            EngineValue::Datetime(_) => ValueKind::Datetime,
            EngineValue::Duration(_) => ValueKind::Duration,
            EngineValue::Array(_) => ValueKind::Array,
            EngineValue::Object(_) => ValueKind::Object,
            EngineValue::RecordId(_) => ValueKind::RecordId,
        }
    }

    #[must_use]
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// `true` for both NONE and NULL.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::None | Self::Null)
    }

    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }

    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(_))
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        if let EngineValue::Bool(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        if let EngineValue::Int(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    /// Floats, plus integers widened to `f64`.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            EngineValue::Float(value) => Some(*value),
            #[allow(clippy::cast_precision_loss)]
            EngineValue::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_decimal(&self) -> Option<&Decimal> {
        if let EngineValue::Decimal(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        if let EngineValue::String(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        if let EngineValue::Datetime(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_duration(&self) -> Option<Duration> {
        if let EngineValue::Duration(value) = self {
            Some(*value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[EngineValue]> {
        if let EngineValue::Array(items) = self {
            Some(items)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&Object> {
        if let EngineValue::Object(fields) = self {
            Some(fields)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_record_id(&self) -> Option<&RecordKey> {
        if let EngineValue::RecordId(key) = self {
            Some(key)
        } else {
            None
        }
    }

    /// Field lookup on objects. A missing key reads as `None`, never as `Null`.
    #[must_use]
    pub fn get(&self, key: &str) -> &EngineValue {
        static ABSENT: EngineValue = EngineValue::None;
        self.as_object()
            .and_then(|fields| fields.get(key))
            .unwrap_or(&ABSENT)
    }

    /// Lossy JSON rendering. NONE fields are omitted from objects, datetimes
    /// and durations become strings, record ids become `table:id` text.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            EngineValue::None | EngineValue::Null => JsonValue::Null,
            EngineValue::Bool(b) => JsonValue::Bool(*b),
            EngineValue::Int(i) => JsonValue::from(*i),
            EngineValue::Float(f) => {
                serde_json::Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number)
            }
            EngineValue::Decimal(d) => JsonValue::String(d.to_string()),
            EngineValue::String(s) => JsonValue::String(s.clone()),
            EngineValue::Datetime(dt) => JsonValue::String(dt.to_rfc3339()),
            EngineValue::Duration(d) => JsonValue::String(format!("{d:?}")),
            EngineValue::Array(items) => {
                JsonValue::Array(items.iter().map(EngineValue::to_json).collect())
            }
            EngineValue::Object(fields) => JsonValue::Object(
                fields
                    .iter()
                    .filter(|(_, v)| !v.is_none())
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            EngineValue::RecordId(key) => JsonValue::String(key.to_string()),
        }
    }
}

impl From<JsonValue> for EngineValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => EngineValue::Null,
            JsonValue::Bool(b) => EngineValue::Bool(b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    EngineValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    EngineValue::Decimal(Decimal::from(u))
                } else {
                    EngineValue::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => EngineValue::String(s),
            JsonValue::Array(items) => {
                EngineValue::Array(items.into_iter().map(EngineValue::from).collect())
            }
            JsonValue::Object(fields) => EngineValue::Object(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, EngineValue::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for EngineValue {
    fn from(value: bool) -> Self {
        EngineValue::Bool(value)
    }
}

impl From<i64> for EngineValue {
    fn from(value: i64) -> Self {
        EngineValue::Int(value)
    }
}

impl From<f64> for EngineValue {
    fn from(value: f64) -> Self {
        EngineValue::Float(value)
    }
}

impl From<&str> for EngineValue {
    fn from(value: &str) -> Self {
        EngineValue::String(value.to_string())
    }
}

impl From<String> for EngineValue {
    fn from(value: String) -> Self {
        EngineValue::String(value)
    }
}

impl From<Decimal> for EngineValue {
    fn from(value: Decimal) -> Self {
        EngineValue::Decimal(value)
    }
}

impl From<RecordKey> for EngineValue {
    fn from(value: RecordKey) -> Self {
        EngineValue::RecordId(value)
    }
}

impl From<Object> for EngineValue {
    fn from(value: Object) -> Self {
        EngineValue::Object(value)
    }
}

impl From<Vec<EngineValue>> for EngineValue {
    fn from(value: Vec<EngineValue>) -> Self {
        EngineValue::Array(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_field_reads_as_none() {
        let value = EngineValue::from(json!({"name": "Tobie", "nick": null}));
        assert_eq!(value.get("name").as_str(), Some("Tobie"));
        assert!(value.get("nick").is_null());
        assert!(value.get("age").is_none());
    }

    #[test]
    fn json_numbers_keep_their_kind() {
        assert_eq!(EngineValue::from(json!(3)).kind(), ValueKind::Int);
        assert_eq!(EngineValue::from(json!(3.5)).kind(), ValueKind::Float);
        assert_eq!(
            EngineValue::from(json!(u64::MAX)).kind(),
            ValueKind::Decimal
        );
    }

    #[test]
    fn to_json_omits_none_fields() {
        let mut fields = Object::new();
        fields.insert("a".into(), EngineValue::None);
        fields.insert("b".into(), EngineValue::Null);
        assert_eq!(EngineValue::Object(fields).to_json(), json!({"b": null}));
    }
}
