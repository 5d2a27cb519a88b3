#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Once};

use surreal_bridge::boundary::{Boundary, BoundaryResult, RawHandle};
use surreal_bridge::prelude::*;
use surreal_bridge::record;

static TRACING: Once = Once::new();

/// Install a test subscriber once per test binary.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    });
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Person {
        pub id: Option<RecordKey>,
        pub name: String,
        pub age: TriState<i64>,
        pub tags: Vec<String>,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Knows {
        pub id: Option<RecordKey>,
        pub from: RecordKey => "in",
        pub to: RecordKey => "out",
        pub since: Option<i64>,
    }
}

impl Person {
    pub fn new(name: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            age: TriState::Absent,
            tags: Vec::new(),
        }
    }
}

/// Delegating boundary that counts release and read calls.
pub struct CountingBoundary {
    inner: Arc<MemoryEngine>,
    releases: Mutex<HashMap<RawHandle, usize>>,
    reads: AtomicUsize,
    response_takes: AtomicUsize,
}

impl CountingBoundary {
    pub fn new(inner: Arc<MemoryEngine>) -> Self {
        Self {
            inner,
            releases: Mutex::new(HashMap::new()),
            reads: AtomicUsize::new(0),
            response_takes: AtomicUsize::new(0),
        }
    }

    pub fn engine(&self) -> &MemoryEngine {
        &self.inner
    }

    pub fn releases_of(&self, handle: RawHandle) -> usize {
        self.releases
            .lock()
            .unwrap()
            .get(&handle)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_releases(&self) -> usize {
        self.releases.lock().unwrap().values().sum()
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn response_takes(&self) -> usize {
        self.response_takes.load(Ordering::SeqCst)
    }
}

impl Boundary for CountingBoundary {
    fn new_connection(&self) -> BoundaryResult<RawHandle> {
        self.inner.new_connection()
    }

    fn connect(&self, conn: RawHandle, address: &str) -> BoundaryResult<bool> {
        self.inner.connect(conn, address)
    }

    fn signin_root(&self, conn: RawHandle, username: &str, password: &str) -> BoundaryResult<String> {
        self.inner.signin_root(conn, username, password)
    }

    fn signin_namespace(
        &self,
        conn: RawHandle,
        username: &str,
        password: &str,
        namespace: &str,
    ) -> BoundaryResult<String> {
        self.inner
            .signin_namespace(conn, username, password, namespace)
    }

    fn signin_database(
        &self,
        conn: RawHandle,
        username: &str,
        password: &str,
        namespace: &str,
        database: &str,
    ) -> BoundaryResult<String> {
        self.inner
            .signin_database(conn, username, password, namespace, database)
    }

    fn use_namespace(&self, conn: RawHandle, name: &str) -> BoundaryResult<bool> {
        self.inner.use_namespace(conn, name)
    }

    fn use_database(&self, conn: RawHandle, name: &str) -> BoundaryResult<bool> {
        self.inner.use_database(conn, name)
    }

    fn query(&self, conn: RawHandle, text: &str) -> BoundaryResult<RawHandle> {
        self.inner.query(conn, text)
    }

    fn query_bind(
        &self,
        conn: RawHandle,
        text: &str,
        params: &[(String, RawHandle)],
    ) -> BoundaryResult<RawHandle> {
        self.inner.query_bind(conn, text, params)
    }

    fn response_len(&self, response: RawHandle) -> BoundaryResult<usize> {
        self.inner.response_len(response)
    }

    fn response_take(&self, response: RawHandle, index: usize) -> BoundaryResult<RawHandle> {
        self.response_takes.fetch_add(1, Ordering::SeqCst);
        self.inner.response_take(response, index)
    }

    fn value_new(&self, conn: RawHandle, payload: &str) -> BoundaryResult<RawHandle> {
        self.inner.value_new(conn, payload)
    }

    fn value_read(&self, value: RawHandle) -> BoundaryResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.value_read(value)
    }

    fn create_record(&self, conn: RawHandle, key: &str, value: RawHandle) -> BoundaryResult<RawHandle> {
        self.inner.create_record(conn, key, value)
    }

    fn create_target(
        &self,
        conn: RawHandle,
        target: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>> {
        self.inner.create_target(conn, target, values)
    }

    fn insert_target(
        &self,
        conn: RawHandle,
        target: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>> {
        self.inner.insert_target(conn, target, values)
    }

    fn insert_relations(
        &self,
        conn: RawHandle,
        table: &str,
        values: &[RawHandle],
    ) -> BoundaryResult<Vec<RawHandle>> {
        self.inner.insert_relations(conn, table, values)
    }

    fn relate(
        &self,
        conn: RawHandle,
        from: &str,
        edge_table: &str,
        to: &str,
        value: Option<RawHandle>,
    ) -> BoundaryResult<RawHandle> {
        self.inner.relate(conn, from, edge_table, to, value)
    }

    fn update_record(
        &self,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle> {
        self.inner.update_record(conn, key, kind, value)
    }

    fn update_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        self.inner
            .update_targets(conn, targets, kind, value, snapshot)
    }

    fn upsert_record(
        &self,
        conn: RawHandle,
        key: &str,
        kind: u8,
        value: RawHandle,
    ) -> BoundaryResult<RawHandle> {
        self.inner.upsert_record(conn, key, kind, value)
    }

    fn upsert_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        kind: u8,
        value: RawHandle,
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        self.inner
            .upsert_targets(conn, targets, kind, value, snapshot)
    }

    fn select_record(&self, conn: RawHandle, key: &str) -> BoundaryResult<RawHandle> {
        self.inner.select_record(conn, key)
    }

    fn select_records(&self, conn: RawHandle, keys: &[&str]) -> BoundaryResult<Vec<RawHandle>> {
        self.inner.select_records(conn, keys)
    }

    fn select_targets(
        &self,
        conn: RawHandle,
        targets: &[&str],
        snapshot: bool,
    ) -> BoundaryResult<RawHandle> {
        self.inner.select_targets(conn, targets, snapshot)
    }

    fn delete_record(&self, conn: RawHandle, key: &str) -> BoundaryResult<bool> {
        self.inner.delete_record(conn, key)
    }

    fn delete_records(&self, conn: RawHandle, keys: &[&str]) -> BoundaryResult<bool> {
        self.inner.delete_records(conn, keys)
    }

    fn delete_target(&self, conn: RawHandle, target: &str) -> BoundaryResult<bool> {
        self.inner.delete_target(conn, target)
    }

    fn cursor_has_next(&self, cursor: RawHandle) -> BoundaryResult<bool> {
        self.inner.cursor_has_next(cursor)
    }

    fn cursor_next(&self, cursor: RawHandle) -> BoundaryResult<RawHandle> {
        self.inner.cursor_next(cursor)
    }

    fn release(&self, handle: RawHandle) -> BoundaryResult<bool> {
        *self.releases.lock().unwrap().entry(handle).or_insert(0) += 1;
        self.inner.release(handle)
    }
}

pub fn memory_options() -> ClientOptions {
    ClientOptions::builder("memory")
        .namespace("test")
        .database("test")
        .finish()
        .unwrap()
}

/// Session on a fresh in-memory engine, with the engine for handle counts.
pub fn open_memory() -> (Surreal, Arc<MemoryEngine>) {
    init_tracing();
    let engine = Arc::new(MemoryEngine::default());
    let db = Surreal::open(engine.clone(), &memory_options()).unwrap();
    (db, engine)
}

/// Session over a [`CountingBoundary`].
pub fn open_counting() -> (Surreal, Arc<CountingBoundary>) {
    init_tracing();
    let boundary = Arc::new(CountingBoundary::new(Arc::new(MemoryEngine::default())));
    let db = Surreal::open(boundary.clone(), &memory_options()).unwrap();
    (db, boundary)
}
