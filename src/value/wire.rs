//! Payload format for values crossing the boundary.
//!
//! A value tree travels as one JSON document with an explicit tag on every
//! node, so NONE and NULL, ints and floats, decimals and strings never blur
//! into each other. Decimals travel as their exact text, datetimes as RFC 3339
//! with nanoseconds and the original offset, durations as seconds + nanos.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};

use crate::error::ConversionError;

use super::model::EngineValue;

#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
enum WireValue {
    None,
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(String),
    String(String),
    Datetime(String),
    Duration { secs: u64, nanos: u32 },
    Array(Vec<WireValue>),
    Object(BTreeMap<String, WireValue>),
    Record(String),
}

fn to_wire(value: &EngineValue) -> Result<WireValue, ConversionError> {
    Ok(match value {
        EngineValue::None => WireValue::None,
        EngineValue::Null => WireValue::Null,
        EngineValue::Bool(b) => WireValue::Bool(*b),
        EngineValue::Int(i) => WireValue::Int(*i),
        EngineValue::Float(f) => {
            if !f.is_finite() {
                return Err(ConversionError::EncodingOverflow(format!(
                    "non-finite float {f} can not cross the boundary"
                )));
            }
            WireValue::Float(*f)
        }
        EngineValue::Decimal(d) => WireValue::Decimal(d.to_string()),
        EngineValue::String(s) => WireValue::String(s.clone()),
        EngineValue::Datetime(dt) => {
            WireValue::Datetime(dt.to_rfc3339_opts(SecondsFormat::AutoSi, false))
        }
        EngineValue::Duration(d) => WireValue::Duration {
            secs: d.as_secs(),
            nanos: d.subsec_nanos(),
        },
        EngineValue::Array(items) => {
            WireValue::Array(items.iter().map(to_wire).collect::<Result<_, _>>()?)
        }
        EngineValue::Object(fields) => WireValue::Object(
            fields
                .iter()
                .map(|(k, v)| Ok((k.clone(), to_wire(v)?)))
                .collect::<Result<_, ConversionError>>()?,
        ),
        EngineValue::RecordId(key) => WireValue::Record(key.to_string()),
    })
}

fn from_wire(value: WireValue) -> Result<EngineValue, ConversionError> {
    Ok(match value {
        WireValue::None => EngineValue::None,
        WireValue::Null => EngineValue::Null,
        WireValue::Bool(b) => EngineValue::Bool(b),
        WireValue::Int(i) => EngineValue::Int(i),
        WireValue::Float(f) => EngineValue::Float(f),
        WireValue::Decimal(text) => EngineValue::Decimal(text.parse()?),
        WireValue::String(s) => EngineValue::String(s),
        WireValue::Datetime(text) => EngineValue::Datetime(
            DateTime::parse_from_rfc3339(&text)
                .map_err(|err| ConversionError::Wire(format!("datetime `{text}`: {err}")))?,
        ),
        WireValue::Duration { secs, nanos } => {
            if nanos >= 1_000_000_000 {
                return Err(ConversionError::Wire(format!(
                    "duration nanos {nanos} out of range"
                )));
            }
            EngineValue::Duration(Duration::new(secs, nanos))
        }
        WireValue::Array(items) => {
            EngineValue::Array(items.into_iter().map(from_wire).collect::<Result<_, _>>()?)
        }
        WireValue::Object(fields) => EngineValue::Object(
            fields
                .into_iter()
                .map(|(k, v)| Ok((k, from_wire(v)?)))
                .collect::<Result<_, ConversionError>>()?,
        ),
        WireValue::Record(text) => EngineValue::RecordId(
            text.parse()
                .map_err(|_| ConversionError::Wire(format!("record id `{text}`")))?,
        ),
    })
}

/// Serialize a value tree into its boundary payload.
///
/// # Errors
/// Returns [`ConversionError::EncodingOverflow`] for values the payload can not
/// carry (non-finite floats).
pub fn encode(value: &EngineValue) -> Result<String, ConversionError> {
    let wire = to_wire(value)?;
    serde_json::to_string(&wire).map_err(|err| ConversionError::Wire(err.to_string()))
}

/// Parse a boundary payload back into a value tree.
///
/// # Errors
/// Returns [`ConversionError::Wire`] when the payload is malformed.
pub fn decode(payload: &str) -> Result<EngineValue, ConversionError> {
    let wire: WireValue =
        serde_json::from_str(payload).map_err(|err| ConversionError::Wire(err.to_string()))?;
    from_wire(wire)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordKey;
    use crate::value::{Decimal, Object};

    fn round_trip(value: &EngineValue) -> EngineValue {
        decode(&encode(value).unwrap()).unwrap()
    }

    #[test]
    fn none_and_null_stay_distinct() {
        assert_eq!(round_trip(&EngineValue::None), EngineValue::None);
        assert_eq!(round_trip(&EngineValue::Null), EngineValue::Null);
        assert_ne!(
            encode(&EngineValue::None).unwrap(),
            encode(&EngineValue::Null).unwrap()
        );
    }

    #[test]
    fn floats_parse_back_to_the_same_bits() {
        for f in [1.0715660391465826e-75, 0.1 + 0.2, 5e-324, f64::MAX, -0.0] {
            let back = round_trip(&EngineValue::Float(f));
            assert_eq!(back.as_float().map(f64::to_bits), Some(f.to_bits()), "{f:e}");
        }
    }

    #[test]
    fn decimal_text_is_exact() {
        let d: Decimal = "123456789012345678901234567.000100".parse().unwrap();
        let payload = encode(&EngineValue::Decimal(d)).unwrap();
        assert!(payload.contains("123456789012345678901234567.000100"));
        assert_eq!(round_trip(&EngineValue::Decimal(d)), EngineValue::Decimal(d));
    }

    #[test]
    fn datetime_keeps_offset_and_nanos() {
        let dt = DateTime::parse_from_rfc3339("2024-02-29T23:59:59.123456789+05:30").unwrap();
        let back = round_trip(&EngineValue::Datetime(dt));
        let back = back.as_datetime().unwrap();
        assert_eq!(*back, dt);
        assert_eq!(back.offset(), dt.offset());
    }

    #[test]
    fn nested_structures() {
        let mut inner = Object::new();
        inner.insert("id".into(), EngineValue::RecordId(RecordKey::new("person", 1)));
        inner.insert(
            "wait".into(),
            EngineValue::Duration(Duration::new(300, 42)),
        );
        let value = EngineValue::Array(vec![
            EngineValue::Object(inner),
            EngineValue::Array(vec![]),
            EngineValue::Float(0.5),
        ]);
        assert_eq!(round_trip(&value), value);
    }

    #[test]
    fn non_finite_float_overflows() {
        assert!(matches!(
            encode(&EngineValue::Float(f64::NAN)),
            Err(ConversionError::EncodingOverflow(_))
        ));
    }

    #[test]
    fn malformed_payload_is_wire_error() {
        assert!(matches!(decode("{\"t\":\"int\",\"v\":\"x\"}"), Err(ConversionError::Wire(_))));
        assert!(matches!(decode("not json"), Err(ConversionError::Wire(_))));
    }
}
