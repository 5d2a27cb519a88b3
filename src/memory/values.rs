//! Conversion between [`EngineValue`] and the datastore's own value type.

use std::collections::BTreeMap;

use chrono::Utc;
use surrealdb::sql;

use crate::record::{RecordIdKey, RecordKey};
use crate::value::{EngineValue, Object};

/// Bound statement parameters.
pub(super) type Vars = BTreeMap<String, sql::Value>;

pub(super) fn thing(key: &RecordKey) -> sql::Thing {
    let id = match key.id() {
        RecordIdKey::Int(id) => sql::Id::Number(*id),
        RecordIdKey::String(id) => sql::Id::String(id.clone()),
    };
    sql::Thing::from((key.table().to_string(), id))
}

fn record_key(thing: sql::Thing) -> RecordKey {
    let id = match thing.id {
        sql::Id::Number(id) => RecordIdKey::Int(id),
        sql::Id::String(id) => RecordIdKey::String(id),
        other => RecordIdKey::String(other.to_string()),
    };
    RecordKey::new(thing.tb, id)
}

/// Datastore form of a host value.
///
/// Fails for decimals the datastore can not hold exactly (more than 28
/// significant digits).
pub(super) fn to_sql(value: EngineValue) -> Result<sql::Value, String> {
    Ok(match value {
        EngineValue::None => sql::Value::None,
        EngineValue::Null => sql::Value::Null,
        EngineValue::Bool(b) => sql::Value::Bool(b),
        EngineValue::Int(i) => sql::Value::Number(sql::Number::Int(i)),
        EngineValue::Float(f) => sql::Value::Number(sql::Number::Float(f)),
        EngineValue::Decimal(d) => {
            let text = d.to_string();
            let exact = rust_decimal::Decimal::from_str_exact(&text)
                .map_err(|err| format!("decimal {text} does not fit the datastore: {err}"))?;
            sql::Value::Number(sql::Number::Decimal(exact))
        }
        EngineValue::String(s) => sql::Value::Strand(sql::Strand::from(s)),
        EngineValue::Datetime(dt) => {
            sql::Value::Datetime(sql::Datetime::from(dt.with_timezone(&Utc)))
        }
        EngineValue::Duration(d) => sql::Value::Duration(sql::Duration::from(d)),
        EngineValue::Array(items) => sql::Value::Array(sql::Array::from(
            items.into_iter().map(to_sql).collect::<Result<Vec<_>, _>>()?,
        )),
        EngineValue::Object(fields) => sql::Value::Object(sql::Object::from(
            fields
                .into_iter()
                .map(|(key, value)| Ok((key, to_sql(value)?)))
                .collect::<Result<BTreeMap<_, _>, String>>()?,
        )),
        EngineValue::RecordId(key) => sql::Value::Thing(thing(&key)),
    })
}

/// Host form of a datastore value. Datetimes come back in UTC.
pub(super) fn from_sql(value: sql::Value) -> Result<EngineValue, String> {
    Ok(match value {
        sql::Value::None => EngineValue::None,
        sql::Value::Null => EngineValue::Null,
        sql::Value::Bool(b) => EngineValue::Bool(b),
        sql::Value::Number(sql::Number::Int(i)) => EngineValue::Int(i),
        sql::Value::Number(sql::Number::Float(f)) => EngineValue::Float(f),
        sql::Value::Number(sql::Number::Decimal(d)) => {
            let text = d.to_string();
            EngineValue::Decimal(
                text.parse()
                    .map_err(|_| format!("decimal {text} has no host value"))?,
            )
        }
        sql::Value::Strand(s) => EngineValue::String(s.0),
        sql::Value::Datetime(dt) => EngineValue::Datetime(dt.0.fixed_offset()),
        sql::Value::Duration(d) => EngineValue::Duration(d.0),
        sql::Value::Uuid(uuid) => EngineValue::String(uuid.to_raw()),
        sql::Value::Array(items) => EngineValue::Array(
            items
                .0
                .into_iter()
                .map(from_sql)
                .collect::<Result<_, _>>()?,
        ),
        sql::Value::Object(fields) => EngineValue::Object(
            fields
                .0
                .into_iter()
                .map(|(key, value)| Ok((key, from_sql(value)?)))
                .collect::<Result<Object, String>>()?,
        ),
        sql::Value::Thing(thing) => EngineValue::RecordId(record_key(thing)),
        other => return Err(format!("`{other}` has no host value")),
    })
}

/// Result rows of a statement: arrays are spread, NONE is empty.
pub(super) fn rows(value: EngineValue) -> Vec<EngineValue> {
    match value {
        EngineValue::Array(items) => items,
        EngineValue::None => Vec::new(),
        other => vec![other],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use std::time::Duration;

    fn round_trip(value: EngineValue) -> EngineValue {
        from_sql(to_sql(value).unwrap()).unwrap()
    }

    #[test]
    fn scalars_keep_their_tags() {
        for value in [
            EngineValue::None,
            EngineValue::Null,
            EngineValue::Bool(true),
            EngineValue::Int(i64::MIN),
            EngineValue::String("⟨x⟩".into()),
            EngineValue::Duration(Duration::new(5_400, 7)),
        ] {
            assert_eq!(round_trip(value.clone()), value);
        }
    }

    #[test]
    fn floats_are_bit_exact() {
        for f in [1.0715660391465826e-75, 0.1 + 0.2, f64::MIN_POSITIVE, -0.0] {
            let back = round_trip(EngineValue::Float(f));
            assert_eq!(back.as_float().map(f64::to_bits), Some(f.to_bits()));
        }
    }

    #[test]
    fn decimals_keep_scale_up_to_datastore_precision() {
        let d = "9876543210.123456789000".parse().unwrap();
        assert_eq!(round_trip(EngineValue::Decimal(d)), EngineValue::Decimal(d));

        let wide = "12345678901234567890.000000000000000001".parse().unwrap();
        assert!(to_sql(EngineValue::Decimal(wide)).is_err());
    }

    #[test]
    fn datetimes_keep_the_instant() {
        let dt = DateTime::parse_from_rfc3339("2024-02-29T23:59:59.123456789+05:30").unwrap();
        let back = round_trip(EngineValue::Datetime(dt));
        let back = back.as_datetime().unwrap();
        assert_eq!(*back, dt);
        assert_eq!(back.offset().local_minus_utc(), 0);
    }

    #[test]
    fn record_ids_map_to_things() {
        let key = RecordKey::new("person", "john doe");
        let value = EngineValue::RecordId(key.clone());
        assert_eq!(round_trip(value.clone()), value);
        assert_eq!(thing(&RecordKey::new("person", 1)).to_string(), "person:1");
    }

    #[test]
    fn rows_spread_arrays() {
        assert_eq!(rows(EngineValue::None).len(), 0);
        assert_eq!(rows(EngineValue::Int(1)).len(), 1);
        assert_eq!(
            rows(EngineValue::Array(vec![EngineValue::Null, EngineValue::Null])).len(),
            2
        );
    }
}
