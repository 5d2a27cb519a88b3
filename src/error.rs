use thiserror::Error;

use crate::boundary::{BoundaryError, BoundaryStatus};

/// Errors raised while converting between host objects and engine values.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConversionError {
    #[error("Schema mismatch at `{path}`: expected {expected}, found {found}")]
    SchemaMismatch {
        path: String,
        expected: String,
        found: String,
    },

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    /// A value outside the target's range, e.g. a decimal past 38 digits.
    #[error("Encoding overflow: {0}")]
    EncodingOverflow(String),

    #[error("Unknown field `{key}` at `{path}`")]
    UnknownField { path: String, key: String },

    #[error("Malformed value payload: {0}")]
    Wire(String),
}

impl ConversionError {
    pub(crate) fn mismatch(
        path: &str,
        expected: impl Into<String>,
        found: impl std::fmt::Display,
    ) -> Self {
        ConversionError::SchemaMismatch {
            path: if path.is_empty() {
                "$".to_string()
            } else {
                path.to_string()
            },
            expected: expected.into(),
            found: found.to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SurrealBridgeError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Query error in statement {index}: {message}")]
    QueryError { index: usize, message: String },

    #[error(transparent)]
    ConversionError(#[from] ConversionError),

    #[error("Handle error: {0}")]
    HandleError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Statement index {index} out of range for a response of {len} statements")]
    StatementIndex { index: usize, len: usize },

    #[error("Unexpected engine response: {0}")]
    UnexpectedResponse(String),
}

impl SurrealBridgeError {
    /// `true` for errors that leave the session unusable.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, SurrealBridgeError::ConnectionError(_))
    }
}

impl From<BoundaryError> for SurrealBridgeError {
    fn from(err: BoundaryError) -> Self {
        match err.status {
            BoundaryStatus::Connection | BoundaryStatus::Internal => {
                SurrealBridgeError::ConnectionError(err.message)
            }
            BoundaryStatus::Auth => SurrealBridgeError::AuthError(err.message),
            // Calls that are not part of a multi-statement submission report as slot 0.
            BoundaryStatus::Query => SurrealBridgeError::QueryError {
                index: 0,
                message: err.message,
            },
            BoundaryStatus::Handle => SurrealBridgeError::HandleError(err.message),
            BoundaryStatus::Payload => {
                SurrealBridgeError::ConversionError(ConversionError::Wire(err.message))
            }
        }
    }
}

impl From<serde_json::Error> for SurrealBridgeError {
    fn from(err: serde_json::Error) -> Self {
        SurrealBridgeError::ConfigError(format!("invalid JSON configuration: {err}"))
    }
}
