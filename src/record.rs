//! Record addressing: [`RecordKey`] names exactly one record, [`Target`] names
//! zero or more.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::SurrealBridgeError;

static TABLE_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|err| panic!("table regex: {err}"))
});

static PLAIN_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap_or_else(|err| panic!("id regex: {err}"))
});

pub(crate) fn is_table_name(name: &str) -> bool {
    TABLE_NAME.is_match(name)
}

/// Identifier part of a [`RecordKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordIdKey {
    Int(i64),
    String(String),
}

impl fmt::Display for RecordIdKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIdKey::Int(id) => write!(f, "{id}"),
            RecordIdKey::String(id) if PLAIN_ID.is_match(id) => f.write_str(id),
            RecordIdKey::String(id) => write!(f, "⟨{}⟩", id.replace('⟩', "\\⟩")),
        }
    }
}

impl From<i64> for RecordIdKey {
    fn from(value: i64) -> Self {
        RecordIdKey::Int(value)
    }
}

impl From<i32> for RecordIdKey {
    fn from(value: i32) -> Self {
        RecordIdKey::Int(i64::from(value))
    }
}

impl From<u32> for RecordIdKey {
    fn from(value: u32) -> Self {
        RecordIdKey::Int(i64::from(value))
    }
}

impl From<&str> for RecordIdKey {
    fn from(value: &str) -> Self {
        RecordIdKey::String(value.to_string())
    }
}

impl From<String> for RecordIdKey {
    fn from(value: String) -> Self {
        RecordIdKey::String(value)
    }
}

/// Table plus identifier, e.g. `person:1` or `person:⟨john doe⟩`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordKey {
    table: String,
    id: RecordIdKey,
}

impl RecordKey {
    /// Build a key without validating the table name; see [`RecordKey::try_new`].
    #[must_use]
    pub fn new(table: impl Into<String>, id: impl Into<RecordIdKey>) -> Self {
        Self {
            table: table.into(),
            id: id.into(),
        }
    }

    /// Like [`RecordKey::new`] but validates the table name.
    ///
    /// # Errors
    /// Returns [`SurrealBridgeError::ConfigError`] for a table name that is not an identifier.
    pub fn try_new(
        table: impl Into<String>,
        id: impl Into<RecordIdKey>,
    ) -> Result<Self, SurrealBridgeError> {
        let table = table.into();
        if !is_table_name(&table) {
            return Err(SurrealBridgeError::ConfigError(format!(
                "invalid table name `{table}`"
            )));
        }
        Ok(Self::new(table, id))
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn id(&self) -> &RecordIdKey {
        &self.id
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.table, self.id)
    }
}

impl FromStr for RecordKey {
    type Err = SurrealBridgeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let invalid = || SurrealBridgeError::ConfigError(format!("invalid record key `{text}`"));
        let (table, id) = text.split_once(':').ok_or_else(invalid)?;
        if !is_table_name(table) {
            return Err(invalid());
        }
        let id = if let Some(inner) = id.strip_prefix('⟨').and_then(|s| s.strip_suffix('⟩')) {
            RecordIdKey::String(inner.replace("\\⟩", "⟩"))
        } else if let Ok(int) = id.parse::<i64>() {
            RecordIdKey::Int(int)
        } else if PLAIN_ID.is_match(id) {
            RecordIdKey::String(id.to_string())
        } else {
            return Err(invalid());
        };
        Ok(RecordKey::new(table, id))
    }
}

/// A table name or a single record rendered as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target(String);

impl Target {
    /// # Errors
    /// Returns [`SurrealBridgeError::ConfigError`] when `name` is not a table identifier.
    pub fn table(name: &str) -> Result<Self, SurrealBridgeError> {
        if is_table_name(name) {
            Ok(Target(name.to_string()))
        } else {
            Err(SurrealBridgeError::ConfigError(format!(
                "invalid table name `{name}`"
            )))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `Some` when the target addresses exactly one record.
    #[must_use]
    pub fn record_key(&self) -> Option<RecordKey> {
        self.0.parse().ok()
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Target {
    type Err = SurrealBridgeError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        if is_table_name(text) {
            return Ok(Target(text.to_string()));
        }
        let key: RecordKey = text.parse()?;
        Ok(Target::from(&key))
    }
}

impl From<&RecordKey> for Target {
    fn from(key: &RecordKey) -> Self {
        Target(key.to_string())
    }
}

impl From<RecordKey> for Target {
    fn from(key: RecordKey) -> Self {
        Target(key.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_int_and_plain_ids() {
        assert_eq!(RecordKey::new("person", 1).to_string(), "person:1");
        assert_eq!(RecordKey::new("person", "tobie").to_string(), "person:tobie");
    }

    #[test]
    fn brackets_complex_string_ids() {
        let key = RecordKey::new("person", "john doe");
        assert_eq!(key.to_string(), "person:⟨john doe⟩");
        assert_eq!(key.to_string().parse::<RecordKey>().unwrap(), key);
    }

    #[test]
    fn numeric_looking_string_ids_round_trip() {
        let key = RecordKey::new("person", "42");
        let text = key.to_string();
        assert_eq!(text, "person:⟨42⟩");
        assert_eq!(text.parse::<RecordKey>().unwrap(), key);
    }

    #[test]
    fn rejects_bad_keys_and_targets() {
        assert!("person".parse::<RecordKey>().is_err());
        assert!("1person:1".parse::<RecordKey>().is_err());
        assert!("person;DELETE".parse::<Target>().is_err());
        assert!(RecordKey::try_new("bad table", 1).is_err());
    }

    #[test]
    fn target_accepts_tables_and_keys() {
        let table: Target = "person".parse().unwrap();
        assert!(table.record_key().is_none());
        let single: Target = "person:1".parse().unwrap();
        assert_eq!(single.record_key(), Some(RecordKey::new("person", 1)));
    }
}
