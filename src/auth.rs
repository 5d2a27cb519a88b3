use std::fmt;

use serde::Deserialize;

/// Signin scopes accepted by the engine.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "scope", rename_all = "lowercase")]
pub enum Credentials {
    Root {
        username: String,
        password: String,
    },
    Namespace {
        username: String,
        password: String,
        namespace: String,
    },
    Database {
        username: String,
        password: String,
        namespace: String,
        database: String,
    },
}

impl Credentials {
    #[must_use]
    pub fn root(username: impl Into<String>, password: impl Into<String>) -> Self {
        Credentials::Root {
            username: username.into(),
            password: password.into(),
        }
    }

    #[must_use]
    pub fn namespace(
        username: impl Into<String>,
        password: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Credentials::Namespace {
            username: username.into(),
            password: password.into(),
            namespace: namespace.into(),
        }
    }

    #[must_use]
    pub fn database(
        username: impl Into<String>,
        password: impl Into<String>,
        namespace: impl Into<String>,
        database: impl Into<String>,
    ) -> Self {
        Credentials::Database {
            username: username.into(),
            password: password.into(),
            namespace: namespace.into(),
            database: database.into(),
        }
    }

    #[must_use]
    pub fn username(&self) -> &str {
        match self {
            Credentials::Root { username, .. }
            | Credentials::Namespace { username, .. }
            | Credentials::Database { username, .. } => username,
        }
    }

    #[must_use]
    pub fn scope(&self) -> &'static str {
        match self {
            Credentials::Root { .. } => "root",
            Credentials::Namespace { .. } => "namespace",
            Credentials::Database { .. } => "database",
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("scope", &self.scope())
            .field("username", &self.username())
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session token returned by a successful signin.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub(crate) fn new(token: String) -> Self {
        Self(token)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}
