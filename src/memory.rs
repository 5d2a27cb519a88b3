//! Bundled in-memory engine.
//!
//! [`MemoryEngine`] implements [`Boundary`] on an embedded SurrealDB datastore
//! (`kv-mem`). It accepts the connection strings `memory` and `mem://…`; every
//! connection handle gets a datastore of its own, seeded with the configured
//! users when it connects. Calls block on a private `tokio` runtime.
//!
//! Record-level calls (`create_record`, `update_targets`, ...) are executed as
//! statements with their arguments bound as parameters, so they behave exactly
//! like the equivalent query.

mod cursor;
mod driver;
mod registry;
mod values;

use std::fmt;
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};

use regex::Regex;
use serde::Deserialize;
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::{Database, Jwt, Namespace, Root};
use surrealdb::sql;

use crate::boundary::{
    Boundary, BoundaryError, BoundaryResult, BoundaryStatus, NO_HANDLE, RawHandle,
};
use crate::record::{RecordKey, is_table_name};
use crate::types::UpdateKind;
use crate::value::{EngineValue, wire};

use cursor::{CursorSource, Pending};
use driver::{block_on, query_error};
use registry::{Link, Registry, Resource};
use values::Vars;

static ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:memory|mem://\S*)$").unwrap_or_else(|err| panic!("endpoint regex: {err}"))
});

/// A namespace or database user known to the engine.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct MemoryUser {
    pub username: String,
    pub password: String,
    pub namespace: String,
    /// `None` for a namespace-level user.
    #[serde(default)]
    pub database: Option<String>,
}

impl fmt::Debug for MemoryUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryUser")
            .field("username", &self.username)
            .field("namespace", &self.namespace)
            .field("database", &self.database)
            .finish_non_exhaustive()
    }
}

/// Options for the in-memory engine.
#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryOptions {
    pub root_username: String,
    pub root_password: String,
    pub users: Vec<MemoryUser>,
    /// Refuse statements on connections that have not signed in.
    pub require_auth: bool,
}

impl Default for MemoryOptions {
    fn default() -> Self {
        Self {
            root_username: "root".into(),
            root_password: "root".into(),
            users: Vec::new(),
            require_auth: false,
        }
    }
}

impl fmt::Debug for MemoryOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryOptions")
            .field("root_username", &self.root_username)
            .field("users", &self.users)
            .field("require_auth", &self.require_auth)
            .finish_non_exhaustive()
    }
}

impl MemoryOptions {
    #[must_use]
    pub fn builder() -> MemoryOptionsBuilder {
        MemoryOptionsBuilder::default()
    }
}

/// Fluent builder for [`MemoryOptions`].
#[derive(Debug, Clone, Default)]
pub struct MemoryOptionsBuilder {
    opts: MemoryOptions,
}

impl MemoryOptionsBuilder {
    #[must_use]
    pub fn root(mut self, username: &str, password: &str) -> Self {
        self.opts.root_username = username.to_string();
        self.opts.root_password = password.to_string();
        self
    }

    #[must_use]
    pub fn namespace_user(mut self, namespace: &str, username: &str, password: &str) -> Self {
        self.opts.users.push(MemoryUser {
            username: username.to_string(),
            password: password.to_string(),
            namespace: namespace.to_string(),
            database: None,
        });
        self
    }

    #[must_use]
    pub fn database_user(
        mut self,
        namespace: &str,
        database: &str,
        username: &str,
        password: &str,
    ) -> Self {
        self.opts.users.push(MemoryUser {
            username: username.to_string(),
            password: password.to_string(),
            namespace: namespace.to_string(),
            database: Some(database.to_string()),
        });
        self
    }

    #[must_use]
    pub fn require_auth(mut self, require_auth: bool) -> Self {
        self.opts.require_auth = require_auth;
        self
    }

    #[must_use]
    pub fn finish(self) -> MemoryOptions {
        self.opts
    }

    #[must_use]
    pub fn build(self) -> MemoryEngine {
        MemoryEngine::new(self.finish())
    }
}

/// In-process [`Boundary`] implementation.
#[derive(Debug, Default)]
pub struct MemoryEngine {
    options: MemoryOptions,
    registry: Mutex<Registry>,
}

enum TargetRef {
    Table(String),
    Record(RecordKey),
}

fn payload_error(message: impl Into<String>) -> BoundaryError {
    BoundaryError::new(BoundaryStatus::Payload, message)
}

fn connection_error(message: impl ToString) -> BoundaryError {
    BoundaryError::new(BoundaryStatus::Connection, message.to_string())
}

fn target_ref(text: &str) -> BoundaryResult<TargetRef> {
    if is_table_name(text) {
        return Ok(TargetRef::Table(text.to_string()));
    }
    text.parse::<RecordKey>()
        .map(TargetRef::Record)
        .map_err(|_| query_error(format!("`{text}` is neither a table nor a record id")))
}

fn record_ref(text: &str) -> BoundaryResult<TargetRef> {
    text.parse::<RecordKey>()
        .map(TargetRef::Record)
        .map_err(|_| query_error(format!("`{text}` is not a record id")))
}

/// Backtick-quoted identifier.
fn ident(name: &str) -> String {
    format!("`{}`", name.replace('\\', "\\\\").replace('`', "\\`"))
}

fn checked_table(table: &str) -> BoundaryResult<String> {
    if is_table_name(table) {
        Ok(ident(table))
    } else {
        Err(query_error(format!("invalid table name `{table}`")))
    }
}

fn update_kind(code: u8) -> BoundaryResult<UpdateKind> {
    UpdateKind::try_from(code).map_err(|_| payload_error(format!("unknown update kind {code}")))
}

fn sql_value(value: EngineValue) -> BoundaryResult<sql::Value> {
    values::to_sql(value).map_err(payload_error)
}

/// Content with an empty `id` dropped, so the target decides the record id.
fn content(value: EngineValue) -> EngineValue {
    match value {
        EngineValue::Object(mut fields) => {
            if fields.get("id").is_some_and(EngineValue::is_nullish) {
                fields.remove("id");
            }
            EngineValue::Object(fields)
        }
        EngineValue::Array(items) => EngineValue::Array(items.into_iter().map(content).collect()),
        other => other,
    }
}

/// Bind one target as `$name` and return its placeholder.
fn bind_target(target: TargetRef, name: &str, vars: &mut Vars) -> String {
    match target {
        TargetRef::Table(table) => {
            vars.insert(name.into(), sql::Value::Strand(table.into()));
            format!("type::table(${name})")
        }
        TargetRef::Record(key) => {
            vars.insert(name.into(), sql::Value::Thing(values::thing(&key)));
            format!("${name}")
        }
    }
}

fn bind_targets(targets: Vec<TargetRef>, vars: &mut Vars) -> BoundaryResult<String> {
    if targets.is_empty() {
        return Err(query_error("no targets given"));
    }
    let placeholders: Vec<_> = targets
        .into_iter()
        .enumerate()
        .map(|(idx, target)| bind_target(target, &format!("t{idx}"), vars))
        .collect();
    Ok(placeholders.join(", "))
}

fn quoted(text: &str) -> BoundaryResult<String> {
    serde_json::to_string(text)
        .map_err(|err| BoundaryError::new(BoundaryStatus::Internal, err.to_string()))
}

/// `DEFINE USER` statements for the root and every configured user.
fn seed_users(options: &MemoryOptions) -> BoundaryResult<String> {
    let mut script = format!(
        "DEFINE USER {} ON ROOT PASSWORD {} ROLES OWNER;",
        ident(&options.root_username),
        quoted(&options.root_password)?
    );
    for user in &options.users {
        let (scope, level) = match &user.database {
            Some(database) => (
                format!("USE NS {} DB {};", ident(&user.namespace), ident(database)),
                "DATABASE",
            ),
            None => (format!("USE NS {};", ident(&user.namespace)), "NAMESPACE"),
        };
        script.push_str(&format!(
            "\n{scope} DEFINE USER {} ON {level} PASSWORD {} ROLES OWNER;",
            ident(&user.username),
            quoted(&user.password)?
        ));
    }
    Ok(script)
}

impl MemoryEngine {
    #[must_use]
    pub fn new(options: MemoryOptions) -> Self {
        Self {
            options,
            registry: Mutex::new(Registry::default()),
        }
    }

    #[must_use]
    pub fn builder() -> MemoryOptionsBuilder {
        MemoryOptionsBuilder::default()
    }

    #[must_use]
    pub fn options(&self) -> &MemoryOptions {
        &self.options
    }

    /// Number of handles the engine currently holds, connections included.
    #[must_use]
    pub fn live_handles(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ready(&self, link: &Link) -> BoundaryResult<()> {
        if !link.connected {
            return Err(connection_error("connection is not established"));
        }
        if self.options.require_auth && !link.signed_in {
            return Err(BoundaryError::new(BoundaryStatus::Auth, "not signed in"));
        }
        Ok(())
    }

    /// Client of a connection that may run statements.
    fn client(&self, conn: RawHandle) -> BoundaryResult<Surreal<Any>> {
        let registry = self.lock();
        let link = registry.link(conn)?;
        self.ready(link)?;
        Ok(link.client.clone())
    }

    fn take_values(&self, handles: &[RawHandle]) -> BoundaryResult<Vec<EngineValue>> {
        self.lock().take_values(handles)
    }

    fn take_value(&self, handle: RawHandle) -> BoundaryResult<EngineValue> {
        self.lock().take_value(handle)
    }

    /// Run statements on the connection's datastore; the registry is not
    /// locked meanwhile.
    fn run(&self, conn: RawHandle, statement: &str, vars: Vars) -> BoundaryResult<Vec<EngineValue>> {
        let client = self.client(conn)?;
        driver::run(&client, statement, vars)
    }

    fn register(&self, conn: RawHandle, values: Vec<EngineValue>) -> Vec<RawHandle> {
        let mut registry = self.lock();
        values
            .into_iter()
            .map(|value| registry.insert_value(conn, value))
            .collect()
    }

    fn register_first(&self, conn: RawHandle, rows: Vec<EngineValue>) -> RawHandle {
        match rows.into_iter().next() {
            Some(row) => self.lock().insert_value(conn, row),
            None => NO_HANDLE,
        }
    }

    fn register_cursor(&self, conn: RawHandle, source: CursorSource) -> RawHandle {
        self.lock()
            .insert(Some(conn), Resource::Cursor(Arc::new(Mutex::new(source))))
    }

    fn signin_client(&self, conn: RawHandle) -> BoundaryResult<Surreal<Any>> {
        let registry = self.lock();
        let link = registry.link(conn)?;
        if !link.connected {
            return Err(connection_error("connection is not established"));
        }
        Ok(link.client.clone())
    }

    fn signed_in(
        &self,
        conn: RawHandle,
        scope: &str,
        outcome: surrealdb::Result<Jwt>,
    ) -> BoundaryResult<String> {
        let token = outcome
            .map_err(|err| BoundaryError::new(BoundaryStatus::Auth, err.to_string()))?
            .into_insecure_token();
        self.lock().link_mut(conn)?.signed_in = true;
        tracing::debug!(conn, scope, "memory engine signin");
        Ok(token)
    }

    fn write_record(
        &self,
        verb: &str,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle> {
        let data = self.take_value(value)?;
        let kind = update_kind(kind)?;
        let mut vars = Vars::new();
        let target = bind_target(record_ref(key)?, "target", &mut vars);
        vars.insert("content".into(), sql_value(content(data))?);
        let statement = format!("{verb} {target} {} $content", kind.keyword());
        let written = self.run(conn, &statement, vars)?;
        Ok(self.register_first(conn, written))
    }

    fn write_targets(
        &self,
        verb: &str,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        let data = self.take_value(value)?;
        let kind = update_kind(kind)?;
        let targets = targets
            .iter()
            .map(|target| target_ref(target))
            .collect::<BoundaryResult<Vec<_>>>()?;
        let mut vars = Vars::new();
        let placeholders = bind_targets(targets, &mut vars)?;
        vars.insert("content".into(), sql_value(content(data))?);
        let statement = format!("{verb} {placeholders} {} $content", kind.keyword());
        let written = self.run(conn, &statement, vars)?;
        let source = if snapshot {
            CursorSource::Snapshot(written.into())
        } else {
            let pending = written
                .iter()
                .filter_map(|row| row.get("id").as_record_id().cloned())
                .map(Pending::Record)
                .collect();
            CursorSource::live(self.client(conn)?, pending)
        };
        Ok(self.register_cursor(conn, source))
    }
}

impl Boundary for MemoryEngine {
    fn new_connection(&self) -> BoundaryResult<RawHandle> {
        let handle = self
            .lock()
            .insert(None, Resource::Connection(Link::new()));
        tracing::debug!(conn = handle, "memory engine connection opened");
        Ok(handle)
    }

    fn connect(&self, conn: RawHandle, address: &str) -> BoundaryResult<bool> {
        let client = {
            let registry = self.lock();
            let link = registry.link(conn)?;
            if !ENDPOINT.is_match(address) {
                tracing::debug!(conn, address, "memory engine refused address");
                return Ok(false);
            }
            if link.connected {
                return Ok(true);
            }
            link.client.clone()
        };
        let users = seed_users(&self.options)?;
        block_on(async { client.connect("mem://").await })?.map_err(connection_error)?;
        for slot in driver::run_script(&client, &users, Vars::new())? {
            slot.map_err(connection_error)?;
        }
        self.lock().link_mut(conn)?.connected = true;
        tracing::debug!(conn, address, users = self.options.users.len(), "memory engine connected");
        Ok(true)
    }

    fn signin_root(&self, conn: RawHandle, username: &str, password: &str) -> BoundaryResult<String> {
        let client = self.signin_client(conn)?;
        let outcome = block_on(async { client.signin(Root { username, password }).await })?;
        self.signed_in(conn, "root", outcome)
    }

    fn signin_namespace(
        &self,
        conn: RawHandle,
        username: &str,
        password: &str,
        namespace: &str,
    ) -> BoundaryResult<String> {
        let client = self.signin_client(conn)?;
        let outcome = block_on(async {
            client
                .signin(Namespace {
                    namespace,
                    username,
                    password,
                })
                .await
        })?;
        self.signed_in(conn, "namespace", outcome)
    }

    fn signin_database(
        &self,
        conn: RawHandle,
        username: &str,
        password: &str,
        namespace: &str,
        database: &str,
    ) -> BoundaryResult<String> {
        let client = self.signin_client(conn)?;
        let outcome = block_on(async {
            client
                .signin(Database {
                    namespace,
                    database,
                    username,
                    password,
                })
                .await
        })?;
        self.signed_in(conn, "database", outcome)
    }

    fn use_namespace(&self, conn: RawHandle, name: &str) -> BoundaryResult<bool> {
        let client = self.client(conn)?;
        if name.is_empty() {
            return Ok(false);
        }
        block_on(async { client.use_ns(name).await })?.map_err(query_error)?;
        Ok(true)
    }

    fn use_database(&self, conn: RawHandle, name: &str) -> BoundaryResult<bool> {
        let client = self.client(conn)?;
        if name.is_empty() {
            return Ok(false);
        }
        block_on(async { client.use_db(name).await })?.map_err(query_error)?;
        Ok(true)
    }

    fn query(&self, conn: RawHandle, text: &str) -> BoundaryResult<RawHandle> {
        self.query_bind(conn, text, &[])
    }

    fn query_bind(
        &self,
        conn: RawHandle,
        text: &str,
        params: &[(String, RawHandle)],
    ) -> BoundaryResult<RawHandle> {
        let handles: Vec<RawHandle> = params.iter().map(|(_, handle)| *handle).collect();
        let values = self.take_values(&handles)?;
        let mut vars = Vars::new();
        for ((name, _), value) in params.iter().zip(values) {
            vars.insert(name.clone(), sql_value(value)?);
        }
        let client = self.client(conn)?;
        let slots = driver::run_script(&client, text, vars)?;
        tracing::debug!(
            conn,
            statements = slots.len(),
            failed = slots.iter().filter(|r| r.is_err()).count(),
            "memory engine ran script"
        );
        Ok(self.lock().insert(Some(conn), Resource::Response(slots)))
    }

    fn response_len(&self, response: RawHandle) -> BoundaryResult<usize> {
        Ok(self.lock().response(response)?.len())
    }

    fn response_take(&self, response: RawHandle, index: usize) -> BoundaryResult<RawHandle> {
        let mut registry = self.lock();
        let owner = registry.owner(response)?;
        let slot = registry
            .response(response)?
            .get(index)
            .cloned()
            .ok_or_else(|| query_error(format!("no statement at index {index}")))?;
        match slot {
            Ok(value) => Ok(registry.insert_value(owner, value)),
            Err(message) => Err(query_error(message)),
        }
    }

    fn value_new(&self, conn: RawHandle, payload: &str) -> BoundaryResult<RawHandle> {
        let value = wire::decode(payload).map_err(|err| payload_error(err.to_string()))?;
        let mut registry = self.lock();
        registry.link(conn)?;
        Ok(registry.insert_value(conn, value))
    }

    fn value_read(&self, value: RawHandle) -> BoundaryResult<String> {
        let registry = self.lock();
        wire::encode(registry.value(value)?).map_err(|err| payload_error(err.to_string()))
    }

    fn create_record(&self, conn: RawHandle, key: &str, value: RawHandle) -> BoundaryResult<RawHandle> {
        let data = self.take_value(value)?;
        let mut vars = Vars::new();
        let target = bind_target(record_ref(key)?, "target", &mut vars);
        vars.insert("content".into(), sql_value(content(data))?);
        let created = self.run(conn, &format!("CREATE {target} CONTENT $content"), vars)?;
        Ok(self.register_first(conn, created))
    }

    fn create_target(
        &self,
        conn: RawHandle,
        target: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>> {
        let contents = self.take_values(values)?;
        if contents.is_empty() {
            return Ok(Vec::new());
        }
        let mut vars = Vars::new();
        let target = bind_target(target_ref(target)?, "target", &mut vars);
        let mut script = Vec::with_capacity(contents.len());
        for (idx, data) in contents.into_iter().enumerate() {
            vars.insert(format!("c{idx}"), sql_value(content(data))?);
            script.push(format!("CREATE {target} CONTENT $c{idx}"));
        }
        let created = self.run(conn, &script.join(";\n"), vars)?;
        Ok(self.register(conn, created))
    }

    fn insert_target(
        &self,
        conn: RawHandle,
        target: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>> {
        let contents = self.take_values(values)?;
        let table = checked_table(target)?;
        let mut vars = Vars::new();
        vars.insert("rows".into(), sql_value(content(EngineValue::Array(contents)))?);
        let inserted = self.run(conn, &format!("INSERT INTO {table} $rows"), vars)?;
        Ok(self.register(conn, inserted))
    }

    fn insert_relations(
        &self,
        conn: RawHandle,
        table: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>> {
        let contents = self.take_values(values)?;
        let table = checked_table(table)?;
        let mut vars = Vars::new();
        vars.insert("rows".into(), sql_value(content(EngineValue::Array(contents)))?);
        let inserted = self.run(conn, &format!("INSERT RELATION INTO {table} $rows"), vars)?;
        Ok(self.register(conn, inserted))
    }

    fn relate(
        &self,
        conn: RawHandle,
        from: &str,
        edge_table: &str,
        to: &str,
        value: Option<RawHandle>,
    ) -> BoundaryResult<RawHandle> {
        let data = value.map(|handle| self.take_value(handle)).transpose()?;
        let edge = checked_table(edge_table)?;
        let mut vars = Vars::new();
        let from = bind_target(record_ref(from)?, "from", &mut vars);
        let to = bind_target(record_ref(to)?, "to", &mut vars);
        let mut statement = format!("RELATE {from}->{edge}->{to}");
        if let Some(data) = data {
            // The endpoints come from the statement.
            let data = match content(data) {
                EngineValue::Object(mut fields) => {
                    fields.remove("in");
                    fields.remove("out");
                    EngineValue::Object(fields)
                }
                other => other,
            };
            vars.insert("content".into(), sql_value(data)?);
            statement.push_str(" CONTENT $content");
        }
        let related = self.run(conn, &statement, vars)?;
        Ok(self.register_first(conn, related))
    }

    fn update_record(
        &self,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle> {
        self.write_record("UPDATE", conn, key, kind, value)
    }

    fn update_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        self.write_targets("UPDATE", conn, targets, kind, value, snapshot)
    }

    fn upsert_record(
        &self,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle> {
        self.write_record("UPSERT", conn, key, kind, value)
    }

    fn upsert_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        self.write_targets("UPSERT", conn, targets, kind, value, snapshot)
    }

    fn select_record(&self, conn: RawHandle, key: &str) -> BoundaryResult<RawHandle> {
        let mut vars = Vars::new();
        let target = bind_target(record_ref(key)?, "target", &mut vars);
        let selected = self.run(conn, &format!("SELECT * FROM {target}"), vars)?;
        Ok(self.register_first(conn, selected))
    }

    fn select_records(&self, conn: RawHandle, keys: &[&str]) -> BoundaryResult<Vec<RawHandle>> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let keys = keys
            .iter()
            .map(|key| record_ref(key))
            .collect::<BoundaryResult<Vec<_>>>()?;
        let mut vars = Vars::new();
        let placeholders = bind_targets(keys, &mut vars)?;
        let selected = self.run(conn, &format!("SELECT * FROM {placeholders}"), vars)?;
        Ok(self.register(conn, selected))
    }

    fn select_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        let targets = targets
            .iter()
            .map(|target| target_ref(target))
            .collect::<BoundaryResult<Vec<_>>>()?;
        let source = if snapshot {
            let mut vars = Vars::new();
            let placeholders = bind_targets(targets, &mut vars)?;
            let selected = self.run(conn, &format!("SELECT * FROM {placeholders}"), vars)?;
            CursorSource::Snapshot(selected.into())
        } else {
            let pending = targets
                .into_iter()
                .map(|target| match target {
                    TargetRef::Table(name) => Pending::Table { name, after: None },
                    TargetRef::Record(key) => Pending::Record(key),
                })
                .collect();
            CursorSource::live(self.client(conn)?, pending)
        };
        Ok(self.register_cursor(conn, source))
    }

    fn delete_record(&self, conn: RawHandle, key: &str) -> BoundaryResult<bool> {
        let mut vars = Vars::new();
        let target = bind_target(record_ref(key)?, "target", &mut vars);
        self.run(conn, &format!("DELETE {target}"), vars)?;
        Ok(true)
    }

    fn delete_records(&self, conn: RawHandle, keys: &[&str]) -> BoundaryResult<bool> {
        if keys.is_empty() {
            return Ok(true);
        }
        let keys = keys
            .iter()
            .map(|key| record_ref(key))
            .collect::<BoundaryResult<Vec<_>>>()?;
        let mut vars = Vars::new();
        let placeholders = bind_targets(keys, &mut vars)?;
        self.run(conn, &format!("DELETE {placeholders}"), vars)?;
        Ok(true)
    }

    fn delete_target(&self, conn: RawHandle, target: &str) -> BoundaryResult<bool> {
        let mut vars = Vars::new();
        let target = bind_target(target_ref(target)?, "target", &mut vars);
        self.run(conn, &format!("DELETE {target}"), vars)?;
        Ok(true)
    }

    fn cursor_has_next(&self, cursor: RawHandle) -> BoundaryResult<bool> {
        let source = self.lock().cursor(cursor)?;
        let mut source = source.lock().unwrap_or_else(PoisonError::into_inner);
        source.has_next()
    }

    fn cursor_next(&self, cursor: RawHandle) -> BoundaryResult<RawHandle> {
        let source = self.lock().cursor(cursor)?;
        let next = source
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next()?;
        let Some(value) = next else {
            return Ok(NO_HANDLE);
        };
        let mut registry = self.lock();
        // The cursor may have been released during the pull.
        let owner = registry.owner(cursor)?;
        Ok(registry.insert_value(owner, value))
    }

    fn release(&self, handle: RawHandle) -> BoundaryResult<bool> {
        let dropped = self.lock().release(handle);
        tracing::debug!(handle, dropped, "memory engine release");
        Ok(dropped > 0)
    }
}
