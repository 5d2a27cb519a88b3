use std::fmt;
use std::sync::Arc;

use crate::auth::{Credentials, Token};
use crate::boundary::{Boundary, RawHandle};
use crate::config::ClientOptions;
use crate::convert::{FromEngine, IntoEngine, ValueConverter};
use crate::error::SurrealBridgeError;
use crate::handle::HandleResource;
use crate::value::{MutableValue, Value};

/// Client session over one engine connection.
pub struct Surreal {
    pub(super) boundary: Arc<dyn Boundary>,
    pub(super) connection: HandleResource,
    pub(super) converter: ValueConverter,
}

impl Surreal {
    /// Allocate a fresh, unconnected session.
    ///
    /// # Errors
    /// Returns the engine's failure to allocate a connection.
    pub fn new(boundary: Arc<dyn Boundary>) -> Result<Self, SurrealBridgeError> {
        let handle = boundary.new_connection()?;
        let connection = HandleResource::acquire_required(&boundary, handle, "connection")?;
        tracing::debug!(connection = handle, "allocated connection");
        Ok(Self {
            boundary,
            connection,
            converter: ValueConverter::default(),
        })
    }

    /// Allocate, connect, sign in and select namespace/database as configured.
    ///
    /// # Errors
    /// The first failing step; the connection handle is released on failure.
    pub fn open(
        boundary: Arc<dyn Boundary>,
        options: &ClientOptions,
    ) -> Result<Self, SurrealBridgeError> {
        options.validate()?;
        let surreal =
            Self::new(boundary)?.with_converter(ValueConverter::new(options.converter));
        surreal.connect(&options.endpoint)?;
        if let Some(credentials) = &options.credentials {
            surreal.signin(credentials)?;
        }
        if let Some(namespace) = &options.namespace {
            surreal.use_ns(namespace)?;
        }
        if let Some(database) = &options.database {
            surreal.use_db(database)?;
        }
        Ok(surreal)
    }

    #[must_use]
    pub fn with_converter(mut self, converter: ValueConverter) -> Self {
        self.converter = converter;
        self
    }

    #[must_use]
    pub fn converter(&self) -> &ValueConverter {
        &self.converter
    }

    pub fn converter_mut(&mut self) -> &mut ValueConverter {
        &mut self.converter
    }

    /// # Errors
    /// [`SurrealBridgeError::ConnectionError`] when the engine refuses the address.
    pub fn connect(&self, address: &str) -> Result<(), SurrealBridgeError> {
        let conn = self.connection_handle()?;
        if !self.boundary.connect(conn, address)? {
            return Err(SurrealBridgeError::ConnectionError(format!(
                "engine refused to connect to `{address}`"
            )));
        }
        tracing::debug!(connection = conn, address, "connected");
        Ok(())
    }

    /// # Errors
    /// [`SurrealBridgeError::AuthError`] for rejected credentials.
    pub fn signin(&self, credentials: &Credentials) -> Result<Token, SurrealBridgeError> {
        let conn = self.connection_handle()?;
        let token = match credentials {
            Credentials::Root { username, password } => {
                self.boundary.signin_root(conn, username, password)?
            }
            Credentials::Namespace {
                username,
                password,
                namespace,
            } => self
                .boundary
                .signin_namespace(conn, username, password, namespace)?,
            Credentials::Database {
                username,
                password,
                namespace,
                database,
            } => self
                .boundary
                .signin_database(conn, username, password, namespace, database)?,
        };
        tracing::debug!(
            connection = conn,
            scope = credentials.scope(),
            username = credentials.username(),
            "signed in"
        );
        Ok(Token::new(token))
    }

    /// # Errors
    /// Boundary failures, or a refusal reported as [`SurrealBridgeError::ConnectionError`].
    pub fn use_ns(&self, namespace: &str) -> Result<(), SurrealBridgeError> {
        let conn = self.connection_handle()?;
        if !self.boundary.use_namespace(conn, namespace)? {
            return Err(SurrealBridgeError::ConnectionError(format!(
                "engine refused namespace `{namespace}`"
            )));
        }
        tracing::debug!(connection = conn, namespace, "switched namespace");
        Ok(())
    }

    /// # Errors
    /// Boundary failures, or a refusal reported as [`SurrealBridgeError::ConnectionError`].
    pub fn use_db(&self, database: &str) -> Result<(), SurrealBridgeError> {
        let conn = self.connection_handle()?;
        if !self.boundary.use_database(conn, database)? {
            return Err(SurrealBridgeError::ConnectionError(format!(
                "engine refused database `{database}`"
            )));
        }
        tracing::debug!(connection = conn, database, "switched database");
        Ok(())
    }

    /// # Errors
    /// See [`Surreal::use_ns`] and [`Surreal::use_db`].
    pub fn use_ns_db(&self, namespace: &str, database: &str) -> Result<(), SurrealBridgeError> {
        self.use_ns(namespace)?;
        self.use_db(database)
    }

    /// Stage a host object as an engine value for a later write call.
    ///
    /// # Errors
    /// See [`ValueConverter::encode`].
    pub fn value<T: IntoEngine + ?Sized>(&self, object: &T) -> Result<MutableValue, SurrealBridgeError> {
        self.converter.encode(self, object)
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.connection.id()
    }

    /// Release the connection. Every value, cursor and response produced
    /// through it becomes unusable on the engine side.
    ///
    /// # Errors
    /// The engine's failure to dispose of the connection.
    pub fn close(mut self) -> Result<(), SurrealBridgeError> {
        tracing::debug!(connection = self.connection.id(), "closing connection");
        self.connection.release()
    }

    pub(crate) fn boundary(&self) -> &Arc<dyn Boundary> {
        &self.boundary
    }

    pub(crate) fn connection_handle(&self) -> Result<RawHandle, SurrealBridgeError> {
        self.connection.raw()
    }

    /// Encode content and hand its handle to the engine.
    pub(super) fn stage_raw<T: IntoEngine + ?Sized>(
        &self,
        content: &T,
    ) -> Result<RawHandle, SurrealBridgeError> {
        Ok(self.value(content)?.into_raw())
    }

    /// Stage every item before transferring any, so a conversion failure
    /// releases the values already staged instead of leaking them.
    pub(super) fn stage_all<T: IntoEngine>(
        &self,
        contents: &[T],
    ) -> Result<Vec<RawHandle>, SurrealBridgeError> {
        let staged = contents
            .iter()
            .map(|content| self.value(content))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(staged.into_iter().map(MutableValue::into_raw).collect())
    }

    pub(super) fn optional_value(
        &self,
        handle: RawHandle,
    ) -> Result<Option<Value>, SurrealBridgeError> {
        HandleResource::acquire(Arc::clone(&self.boundary), handle)
            .map(Value::read)
            .transpose()
    }

    pub(super) fn required_value(
        &self,
        handle: RawHandle,
        what: &str,
    ) -> Result<Value, SurrealBridgeError> {
        Value::read(HandleResource::acquire_required(&self.boundary, handle, what)?)
    }

    /// Own every handle first so a failed read still releases the rest.
    pub(super) fn values(&self, handles: Vec<RawHandle>) -> Result<Vec<Value>, SurrealBridgeError> {
        let owned: Vec<HandleResource> = handles
            .into_iter()
            .filter_map(|handle| HandleResource::acquire(Arc::clone(&self.boundary), handle))
            .collect();
        owned.into_iter().map(Value::read).collect()
    }

    /// Decode each value on its own; one bad record does not cost the rest.
    pub(super) fn decode_each<T: FromEngine>(
        &self,
        values: &[Value],
    ) -> Vec<Result<T, SurrealBridgeError>> {
        values.iter().map(|value| self.converter.decode(value)).collect()
    }
}

impl fmt::Debug for Surreal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Surreal")
            .field("connection", &self.connection.id())
            .field("converter", &self.converter)
            .finish_non_exhaustive()
    }
}
