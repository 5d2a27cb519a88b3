use std::fmt;

use clap::ValueEnum;
use serde::Deserialize;

use crate::error::SurrealBridgeError;

/// How an update or upsert applies its content to an existing record.
///
/// Exposed as a [`ValueEnum`] so command-line tools can accept it directly:
/// ```rust
/// use clap::ValueEnum;
/// use surreal_bridge::prelude::*;
///
/// let kind = UpdateKind::from_str("merge", true).unwrap();
/// assert_eq!(kind, UpdateKind::Merge);
/// assert_eq!(kind.code(), 1);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateKind {
    /// Replace the whole field set with the given content
    Content,
    /// Merge the given fields into the existing record
    Merge,
    /// Apply a list of JSON-patch operations
    Patch,
    /// Replace the whole field set, keeping the record id
    Replace,
}

impl UpdateKind {
    /// Stable code sent across the boundary.
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            UpdateKind::Content => 0,
            UpdateKind::Merge => 1,
            UpdateKind::Patch => 2,
            UpdateKind::Replace => 3,
        }
    }

    /// Statement keyword, e.g. `MERGE`.
    #[must_use]
    pub fn keyword(self) -> &'static str {
        match self {
            UpdateKind::Content => "CONTENT",
            UpdateKind::Merge => "MERGE",
            UpdateKind::Patch => "PATCH",
            UpdateKind::Replace => "REPLACE",
        }
    }
}

impl TryFrom<u8> for UpdateKind {
    type Error = SurrealBridgeError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(UpdateKind::Content),
            1 => Ok(UpdateKind::Merge),
            2 => Ok(UpdateKind::Patch),
            3 => Ok(UpdateKind::Replace),
            other => Err(SurrealBridgeError::ConfigError(format!(
                "unknown update kind code {other}"
            ))),
        }
    }
}

impl fmt::Display for UpdateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable_and_reversible() {
        for kind in UpdateKind::value_variants() {
            assert_eq!(UpdateKind::try_from(kind.code()).unwrap(), *kind);
        }
        assert_eq!(UpdateKind::Content.code(), 0);
        assert_eq!(UpdateKind::Replace.code(), 3);
        assert!(UpdateKind::try_from(4).is_err());
    }

    #[test]
    fn keywords_render_as_statement_clauses() {
        assert_eq!(UpdateKind::Merge.keyword(), "MERGE");
        assert_eq!(UpdateKind::Content.to_string(), "CONTENT");
    }
}
