use std::path::Path;

use serde::Deserialize;

use crate::auth::Credentials;
use crate::convert::{ConverterOptions, UnknownKeys};
use crate::error::SurrealBridgeError;

/// Options for [`crate::Surreal::open`].
///
/// Can be loaded from JSON:
/// ```rust
/// use surreal_bridge::prelude::*;
///
/// let opts = ClientOptions::from_json_str(r#"{
///     "endpoint": "memory",
///     "namespace": "test",
///     "database": "test",
///     "credentials": {"scope": "root", "username": "root", "password": "root"}
/// }"#).unwrap();
/// assert_eq!(opts.database.as_deref(), Some("test"));
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientOptions {
    pub endpoint: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub credentials: Option<Credentials>,
    #[serde(default)]
    pub converter: ConverterOptions,
}

impl ClientOptions {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            namespace: None,
            database: None,
            credentials: None,
            converter: ConverterOptions::default(),
        }
    }

    #[must_use]
    pub fn builder(endpoint: impl Into<String>) -> ClientOptionsBuilder {
        ClientOptionsBuilder::new(endpoint)
    }

    /// # Errors
    /// Returns [`SurrealBridgeError::ConfigError`] for malformed JSON or invalid options.
    pub fn from_json_str(text: &str) -> Result<Self, SurrealBridgeError> {
        let opts: ClientOptions = serde_json::from_str(text)?;
        opts.validate()?;
        Ok(opts)
    }

    /// # Errors
    /// Returns [`SurrealBridgeError::ConfigError`] when the file can not be read
    /// or does not hold valid options.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SurrealBridgeError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            SurrealBridgeError::ConfigError(format!("reading {}: {err}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// # Errors
    /// Returns [`SurrealBridgeError::ConfigError`] for an empty endpoint or a
    /// database selected without a namespace.
    pub fn validate(&self) -> Result<(), SurrealBridgeError> {
        if self.endpoint.trim().is_empty() {
            return Err(SurrealBridgeError::ConfigError(
                "endpoint must not be empty".into(),
            ));
        }
        if self.database.is_some() && self.namespace.is_none() {
            return Err(SurrealBridgeError::ConfigError(
                "a database requires a namespace".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ClientOptions`].
#[derive(Debug, Clone)]
pub struct ClientOptionsBuilder {
    opts: ClientOptions,
}

impl ClientOptionsBuilder {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            opts: ClientOptions::new(endpoint),
        }
    }

    #[must_use]
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.opts.namespace = Some(namespace.into());
        self
    }

    #[must_use]
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.opts.database = Some(database.into());
        self
    }

    #[must_use]
    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.opts.credentials = Some(credentials);
        self
    }

    #[must_use]
    pub fn unknown_keys(mut self, policy: UnknownKeys) -> Self {
        self.opts.converter.unknown_keys = policy;
        self
    }

    /// # Errors
    /// See [`ClientOptions::validate`].
    pub fn finish(self) -> Result<ClientOptions, SurrealBridgeError> {
        self.opts.validate()?;
        Ok(self.opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_validates() {
        let opts = ClientOptions::builder("memory")
            .namespace("test")
            .database("test")
            .unknown_keys(UnknownKeys::Reject)
            .finish()
            .unwrap();
        assert_eq!(opts.converter.unknown_keys, UnknownKeys::Reject);
        assert!(ClientOptions::builder("memory").database("db").finish().is_err());
        assert!(ClientOptions::builder(" ").finish().is_err());
    }

    #[test]
    fn json_rejects_unknown_options() {
        let err = ClientOptions::from_json_str(r#"{"endpoint":"memory","port":1}"#).unwrap_err();
        assert!(matches!(err, SurrealBridgeError::ConfigError(_)));
    }

    #[test]
    fn json_reads_converter_policy() {
        let opts = ClientOptions::from_json_str(
            r#"{"endpoint":"memory","converter":{"unknown_keys":"reject"}}"#,
        )
        .unwrap();
        assert_eq!(opts.converter.unknown_keys, UnknownKeys::Reject);
        assert!(opts.credentials.is_none());
    }
}
