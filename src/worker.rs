//! Async front end: a [`Surreal`] session owned by a dedicated worker thread.
//!
//! Every request travels to the worker over a channel and the answer comes
//! back on a `tokio` oneshot. Dropping a pending future only abandons the
//! reply; the worker still finishes the blocking call.

use std::any::Any;
use std::fmt;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

use crate::boundary::RawHandle;
use crate::connection::Surreal;
use crate::error::SurrealBridgeError;
use crate::record::Target;
use crate::response::ResponseTable;
use crate::value::{EngineValue, Value};

/// Cloneable async handle to a worker-owned [`Surreal`].
#[derive(Clone)]
pub struct AsyncSurreal {
    worker: Arc<SurrealWorker>,
}

impl AsyncSurreal {
    /// Move `surreal` onto a new worker thread.
    ///
    /// # Errors
    /// Returns [`SurrealBridgeError::ConnectionError`] if the thread cannot be spawned.
    pub fn new(surreal: Surreal) -> Result<Self, SurrealBridgeError> {
        let worker = SurrealWorker::spawn(surreal)?;
        Ok(Self {
            worker: Arc::new(worker),
        })
    }

    /// Run a script on the worker. See [`Surreal::query`].
    ///
    /// Every slot is read on the worker before the table is handed back, so
    /// reading it on the caller's side makes no engine call. Releasing it
    /// still does.
    ///
    /// # Errors
    /// Connection-level failures, or the worker having shut down.
    pub async fn query(&self, text: impl Into<String>) -> Result<ResponseTable, SurrealBridgeError> {
        let text = text.into();
        self.worker
            .call("query", move |db| loaded(db.query(&text)?))
            .await
    }

    /// Run a script with bound parameters, loaded like [`AsyncSurreal::query`].
    ///
    /// # Errors
    /// Parameter conversion failures, connection-level failures, or the worker
    /// having shut down.
    pub async fn query_bind(
        &self,
        text: impl Into<String>,
        params: Vec<(String, EngineValue)>,
    ) -> Result<ResponseTable, SurrealBridgeError> {
        let text = text.into();
        self.worker
            .call("query_bind", move |db| loaded(db.query_bind(&text, params)?))
            .await
    }

    /// Every record `targets` address, read as one snapshot on the worker.
    ///
    /// # Errors
    /// Engine failures while issuing or pulling, or the worker having shut down.
    pub async fn select_all(&self, targets: Vec<Target>) -> Result<Vec<Value>, SurrealBridgeError> {
        self.worker
            .call("select_all", move |db| {
                db.select_all_sync(&targets)?.collect_values()
            })
            .await
    }

    /// Run synchronous logic against the worker-owned session.
    ///
    /// # Errors
    /// Propagates the callback's error, or reports the worker having shut down.
    pub async fn with_connection<F, R>(&self, func: F) -> Result<R, SurrealBridgeError>
    where
        F: FnOnce(&mut Surreal) -> Result<R, SurrealBridgeError> + Send + 'static,
        R: Send + 'static,
    {
        self.worker.call("with_connection", func).await
    }

    #[must_use]
    pub fn handle(&self) -> RawHandle {
        self.worker.connection
    }
}

fn loaded(table: ResponseTable) -> Result<ResponseTable, SurrealBridgeError> {
    table.preload()?;
    Ok(table)
}

impl fmt::Debug for AsyncSurreal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AsyncSurreal")
            .field("connection", &self.worker.connection)
            .finish()
    }
}

struct SurrealWorker {
    sender: Sender<Command>,
    connection: RawHandle,
}

impl SurrealWorker {
    fn spawn(surreal: Surreal) -> Result<Self, SurrealBridgeError> {
        let (sender, receiver) = mpsc::channel::<Command>();
        let connection = surreal.handle();
        let handle = Handle::try_current().ok();
        thread::Builder::new()
            .name(format!("surreal-worker-{connection}"))
            .spawn(move || {
                let runtime_guard = handle.as_ref().map(Handle::enter);
                run_worker(surreal, &receiver);
                drop(runtime_guard);
            })
            .map_err(|err| {
                SurrealBridgeError::ConnectionError(format!(
                    "failed to spawn worker thread: {err}"
                ))
            })?;

        Ok(Self { sender, connection })
    }

    fn send_command(&self, command: Command) -> Result<(), SurrealBridgeError> {
        self.sender
            .send(command)
            .map_err(|_| SurrealBridgeError::ConnectionError("worker closed".into()))
    }

    async fn call<F, R>(&self, what: &'static str, func: F) -> Result<R, SurrealBridgeError>
    where
        F: FnOnce(&mut Surreal) -> Result<R, SurrealBridgeError> + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let callback: BoxedCallback =
            Box::new(move |db| func(db).map(|value| Box::new(value) as Box<dyn Any + Send>));
        self.send_command(Command::Run {
            callback,
            respond_to: tx,
        })?;
        match rx.await {
            Ok(Ok(payload)) => payload.downcast::<R>().map(|boxed| *boxed).map_err(|_| {
                SurrealBridgeError::UnexpectedResponse(format!(
                    "worker response downcast failure in {what}"
                ))
            }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(SurrealBridgeError::ConnectionError(format!(
                "worker dropped while handling {what}"
            ))),
        }
    }
}

impl Drop for SurrealWorker {
    fn drop(&mut self) {
        let _ = self.sender.send(Command::Shutdown);
    }
}

type BoxedResponse = Result<Box<dyn Any + Send>, SurrealBridgeError>;
type BoxedCallback = Box<dyn FnOnce(&mut Surreal) -> BoxedResponse + Send>;

enum Command {
    Run {
        callback: BoxedCallback,
        respond_to: oneshot::Sender<BoxedResponse>,
    },
    Shutdown,
}

fn run_worker(mut surreal: Surreal, receiver: &Receiver<Command>) {
    while let Ok(command) = receiver.recv() {
        match command {
            Command::Run {
                callback,
                respond_to,
            } => {
                let outcome = callback(&mut surreal);
                let _ = respond_to.send(outcome);
            }
            Command::Shutdown => break,
        }
    }
    tracing::debug!(connection = surreal.handle(), "worker shutting down");
}
