use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::time::Duration;

use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value as JsonValue;

use crate::error::ConversionError;
use crate::record::RecordKey;
use crate::value::{Decimal, EngineValue, Object};

use super::{DecodeContext, FieldKind, FieldType, FromEngine, IntoEngine};

fn overflow(cx: &DecodeContext<'_>, what: impl std::fmt::Display, target: &str) -> ConversionError {
    ConversionError::EncodingOverflow(format!(
        "{what} at `{}` does not fit in {target}",
        cx.display_path()
    ))
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl IntoEngine for $ty {
            fn to_engine(&self) -> Result<EngineValue, ConversionError> {
                Ok(EngineValue::Int(i64::from(*self)))
            }
        }

        impl FromEngine for $ty {
            const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Int);

            fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
                let Some(int) = value.as_int() else {
                    return Err(cx.mismatch("int", value));
                };
                <$ty>::try_from(int).map_err(|_| overflow(cx, int, stringify!($ty)))
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64);

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl IntoEngine for $ty {
            fn to_engine(&self) -> Result<EngineValue, ConversionError> {
                i64::try_from(*self).map(EngineValue::Int).map_err(|_| {
                    ConversionError::EncodingOverflow(format!(
                        "{} {} exceeds the engine's 64-bit signed integer",
                        stringify!($ty),
                        self
                    ))
                })
            }
        }

        impl FromEngine for $ty {
            const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Int);

            fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
                let Some(int) = value.as_int() else {
                    return Err(cx.mismatch("int", value));
                };
                <$ty>::try_from(int).map_err(|_| overflow(cx, int, stringify!($ty)))
            }
        }
    )*};
}

impl_unsigned!(u8, u16, u32, u64);

impl IntoEngine for bool {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::Bool(*self))
    }
}

impl FromEngine for bool {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Bool);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        value.as_bool().ok_or_else(|| cx.mismatch("bool", value))
    }
}

fn number_as_f64(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<f64, ConversionError> {
    match value {
        EngineValue::Float(f) => Ok(*f),
        #[allow(clippy::cast_precision_loss)]
        EngineValue::Int(i) => Ok(*i as f64),
        EngineValue::Decimal(d) => Ok(d.to_f64()),
        other => Err(cx.mismatch("float", other)),
    }
}

impl IntoEngine for f64 {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        if !self.is_finite() {
            return Err(ConversionError::EncodingOverflow(format!(
                "non-finite float {self}"
            )));
        }
        Ok(EngineValue::Float(*self))
    }
}

impl FromEngine for f64 {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Float);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        number_as_f64(value, cx)
    }
}

impl IntoEngine for f32 {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        f64::from(*self).to_engine()
    }
}

impl FromEngine for f32 {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Float);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        let wide = number_as_f64(value, cx)?;
        if wide.is_finite() && wide.abs() > f64::from(f32::MAX) {
            return Err(overflow(cx, wide, "f32"));
        }
        #[allow(clippy::cast_possible_truncation)]
        Ok(wide as f32)
    }
}

impl IntoEngine for Decimal {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::Decimal(*self))
    }
}

impl FromEngine for Decimal {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Decimal);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        match value {
            EngineValue::Decimal(d) => Ok(*d),
            EngineValue::Int(i) => Ok(Decimal::from(*i)),
            EngineValue::Float(f) => Decimal::try_from(*f),
            other => Err(cx.mismatch("decimal", other)),
        }
    }
}

impl IntoEngine for str {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::String(self.to_string()))
    }
}

impl IntoEngine for String {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::String(self.clone()))
    }
}

impl FromEngine for String {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::String);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| cx.mismatch("string", value))
    }
}

impl IntoEngine for DateTime<FixedOffset> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::Datetime(*self))
    }
}

impl FromEngine for DateTime<FixedOffset> {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Datetime);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        value
            .as_datetime()
            .copied()
            .ok_or_else(|| cx.mismatch("datetime", value))
    }
}

impl IntoEngine for DateTime<Utc> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::Datetime(self.fixed_offset()))
    }
}

impl FromEngine for DateTime<Utc> {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Datetime);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        value
            .as_datetime()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| cx.mismatch("datetime", value))
    }
}

impl IntoEngine for Duration {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::Duration(*self))
    }
}

impl FromEngine for Duration {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Duration);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        value
            .as_duration()
            .ok_or_else(|| cx.mismatch("duration", value))
    }
}

impl IntoEngine for RecordKey {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::RecordId(self.clone()))
    }
}

impl FromEngine for RecordKey {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::RecordId);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        value
            .as_record_id()
            .cloned()
            .ok_or_else(|| cx.mismatch("record", value))
    }
}

impl IntoEngine for EngineValue {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(self.clone())
    }
}

impl FromEngine for EngineValue {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Any).nullable();

    fn from_engine(value: &EngineValue, _cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        Ok(value.clone())
    }
}

impl IntoEngine for JsonValue {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        Ok(EngineValue::from(self.clone()))
    }
}

impl FromEngine for JsonValue {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Any).nullable();

    fn from_engine(value: &EngineValue, _cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        Ok(value.to_json())
    }
}

/// `None` encodes as NONE, so the key is left out of the enclosing object.
/// Both NONE and NULL decode as `None`; use [`super::TriState`] to tell them apart.
impl<T: IntoEngine> IntoEngine for Option<T> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        match self {
            Some(value) => value.to_engine(),
            None => Ok(EngineValue::None),
        }
    }
}

impl<T: FromEngine> FromEngine for Option<T> {
    const FIELD_TYPE: FieldType = T::FIELD_TYPE.nullable();

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        if value.is_nullish() {
            return Ok(None);
        }
        if !T::FIELD_TYPE.accepts(value.kind()) {
            return Err(cx.mismatch(T::FIELD_TYPE.to_string(), value));
        }
        T::from_engine(value, cx).map(Some)
    }
}

impl<T: IntoEngine> IntoEngine for [T] {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        self.iter()
            .map(IntoEngine::to_engine)
            .collect::<Result<Vec<_>, _>>()
            .map(EngineValue::Array)
    }
}

impl<T: IntoEngine> IntoEngine for Vec<T> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        self.as_slice().to_engine()
    }
}

impl<T: FromEngine> FromEngine for Vec<T> {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Array);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        let Some(items) = value.as_array() else {
            return Err(cx.mismatch("array", value));
        };
        items
            .iter()
            .enumerate()
            .map(|(index, item)| {
                let child = cx.index(index);
                if !T::FIELD_TYPE.accepts(item.kind()) {
                    return Err(child.mismatch(T::FIELD_TYPE.to_string(), item));
                }
                T::from_engine(item, &child)
            })
            .collect()
    }
}

fn encode_entries<'a, T: IntoEngine + 'a>(
    entries: impl Iterator<Item = (&'a String, &'a T)>,
) -> Result<EngineValue, ConversionError> {
    let mut fields = Object::new();
    for (key, value) in entries {
        let value = value.to_engine()?;
        if !value.is_none() {
            fields.insert(key.clone(), value);
        }
    }
    Ok(EngineValue::Object(fields))
}

fn decode_entries<T: FromEngine>(
    value: &EngineValue,
    cx: &DecodeContext<'_>,
) -> Result<Vec<(String, T)>, ConversionError> {
    let Some(fields) = value.as_object() else {
        return Err(cx.mismatch("object", value));
    };
    fields
        .iter()
        .map(|(key, item)| {
            let child = cx.child(key);
            if !T::FIELD_TYPE.accepts(item.kind()) {
                return Err(child.mismatch(T::FIELD_TYPE.to_string(), item));
            }
            Ok((key.clone(), T::from_engine(item, &child)?))
        })
        .collect()
}

impl<T: IntoEngine> IntoEngine for BTreeMap<String, T> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        encode_entries(self.iter())
    }
}

impl<T: FromEngine> FromEngine for BTreeMap<String, T> {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Object);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        Ok(decode_entries(value, cx)?.into_iter().collect())
    }
}

impl<T: IntoEngine, S: BuildHasher> IntoEngine for HashMap<String, T, S> {
    fn to_engine(&self) -> Result<EngineValue, ConversionError> {
        encode_entries(self.iter())
    }
}

impl<T: FromEngine, S: BuildHasher + Default> FromEngine for HashMap<String, T, S> {
    const FIELD_TYPE: FieldType = FieldType::required(FieldKind::Object);

    fn from_engine(value: &EngineValue, cx: &DecodeContext<'_>) -> Result<Self, ConversionError> {
        Ok(decode_entries(value, cx)?.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::{ConverterOptions, TriState, ValueConverter};

    fn back<T: IntoEngine + FromEngine>(value: &T) -> T {
        ValueConverter::default()
            .from_engine(&value.to_engine().unwrap())
            .unwrap()
    }

    #[test]
    fn integer_widths_check_range() {
        assert_eq!(back(&i8::MIN), i8::MIN);
        assert_eq!(back(&u32::MAX), u32::MAX);
        assert!(matches!(
            u64::MAX.to_engine(),
            Err(ConversionError::EncodingOverflow(_))
        ));
        let err = ValueConverter::default()
            .from_engine::<u8>(&EngineValue::Int(300))
            .unwrap_err();
        assert!(matches!(err, ConversionError::EncodingOverflow(_)));
        assert!(ValueConverter::default()
            .from_engine::<u16>(&EngineValue::Int(-1))
            .is_err());
    }

    #[test]
    fn floats_widen_from_ints_but_not_the_other_way() {
        let converter = ValueConverter::default();
        assert_eq!(converter.from_engine::<f64>(&EngineValue::Int(2)).unwrap(), 2.0);
        assert!(matches!(
            converter.from_engine::<i64>(&EngineValue::Float(2.0)),
            Err(ConversionError::SchemaMismatch { .. })
        ));
        assert!(matches!(
            converter.from_engine::<f32>(&EngineValue::Float(1e300)),
            Err(ConversionError::EncodingOverflow(_))
        ));
        assert!(f64::INFINITY.to_engine().is_err());
    }

    #[test]
    fn utc_datetimes_round_trip_to_the_nanosecond() {
        let dt = DateTime::parse_from_rfc3339("2023-05-01T10:11:12.000000123Z")
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(back(&dt), dt);
    }

    #[test]
    fn option_reads_none_and_null_as_missing() {
        let converter = ValueConverter::default();
        assert_eq!(converter.from_engine::<Option<String>>(&EngineValue::Null).unwrap(), None);
        assert_eq!(converter.from_engine::<Option<String>>(&EngineValue::None).unwrap(), None);
        assert_eq!(Option::<String>::None.to_engine().unwrap(), EngineValue::None);
    }

    #[test]
    fn absent_sequence_differs_from_empty() {
        let converter = ValueConverter::default();
        assert!(converter.from_engine::<Vec<i64>>(&EngineValue::None).is_err());
        assert_eq!(
            converter
                .from_engine::<TriState<Vec<i64>>>(&EngineValue::None)
                .unwrap(),
            TriState::Absent
        );
        assert_eq!(
            converter
                .from_engine::<TriState<Vec<i64>>>(&EngineValue::Array(vec![]))
                .unwrap(),
            TriState::Present(vec![])
        );
    }

    #[test]
    fn sequence_errors_carry_element_index() {
        let options = ConverterOptions::default();
        let cx = DecodeContext::new(&options).child("scores");
        let value = EngineValue::Array(vec![EngineValue::Int(1), "x".into()]);
        match Vec::<i64>::from_engine(&value, &cx) {
            Err(ConversionError::SchemaMismatch { path, .. }) => assert_eq!(path, "scores[1]"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn maps_skip_none_entries() {
        let mut map = BTreeMap::new();
        map.insert("a".to_string(), Some(1_i64));
        map.insert("b".to_string(), None);
        let value = map.to_engine().unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        let back: HashMap<String, i64> = ValueConverter::default().from_engine(&value).unwrap();
        assert_eq!(back.get("a"), Some(&1));
    }
}
