//! Blocking calls onto the async datastore client.

use std::future::Future;
use std::io;
use std::sync::LazyLock;
use std::thread;

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use tokio::runtime::{Builder, Handle, Runtime};

use crate::boundary::{BoundaryError, BoundaryResult, BoundaryStatus};
use crate::value::EngineValue;

use super::values::{self, Vars};

/// Outcome of each statement in a script.
pub(super) type Slots = Vec<Result<EngineValue, String>>;

static RUNTIME: LazyLock<io::Result<Runtime>> = LazyLock::new(|| {
    Builder::new_multi_thread()
        .enable_all()
        .thread_name("surreal-bridge-memory")
        .build()
});

pub(super) fn query_error(message: impl ToString) -> BoundaryError {
    BoundaryError::new(BoundaryStatus::Query, message.to_string())
}

/// Drive `future` to completion on the engine runtime.
///
/// From inside another runtime the wait happens on a scoped thread, since
/// nesting `block_on` would panic.
pub(super) fn block_on<F>(future: F) -> BoundaryResult<F::Output>
where
    F: Future + Send,
    F::Output: Send,
{
    let runtime = RUNTIME.as_ref().map_err(|err| {
        BoundaryError::new(
            BoundaryStatus::Internal,
            format!("engine runtime unavailable: {err}"),
        )
    })?;
    if Handle::try_current().is_err() {
        return Ok(runtime.block_on(future));
    }
    thread::scope(|scope| scope.spawn(|| runtime.block_on(future)).join()).map_err(|_| {
        BoundaryError::new(BoundaryStatus::Internal, "engine call panicked")
    })
}

/// Run a script with `vars` bound. Only a script that can not run at all
/// (bad syntax, closed connection) fails as a whole.
pub(super) fn run_script(client: &Surreal<Any>, text: &str, vars: Vars) -> BoundaryResult<Slots> {
    let client = client.clone();
    let text = text.to_string();
    let mut response = block_on(async move { client.query(text).bind(vars).await })?
        .map_err(query_error)?;
    let count = response.num_statements();
    let mut slots = Vec::with_capacity(count);
    for index in 0..count {
        let slot = match response.take::<surrealdb::Value>(index) {
            Ok(value) => values::from_sql(value.into_inner()),
            Err(err) => Err(err.to_string()),
        };
        slots.push(slot);
    }
    Ok(slots)
}

/// Run a script whose every statement must succeed; returns all result rows.
pub(super) fn run(client: &Surreal<Any>, text: &str, vars: Vars) -> BoundaryResult<Vec<EngineValue>> {
    tracing::trace!(statement = text, "memory engine statement");
    let mut rows = Vec::new();
    for slot in run_script(client, text, vars)? {
        rows.extend(values::rows(slot.map_err(query_error)?));
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_on_works_inside_another_runtime() {
        let outer = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap();
        let value = outer.block_on(async { block_on(async { 41 + 1 }).unwrap() });
        assert_eq!(value, 42);
    }

    #[test]
    fn failing_statements_keep_their_slot() {
        let client = Surreal::<Any>::init();
        block_on(async { client.connect("mem://").await })
            .unwrap()
            .unwrap();
        let slots = run_script(&client, "RETURN 1; THROW 'bad'; RETURN 3", Vars::new()).unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots[0], Ok(EngineValue::Int(1)));
        assert!(slots[1].as_ref().unwrap_err().contains("bad"));
        assert_eq!(slots[2], Ok(EngineValue::Int(3)));

        let err = run(&client, "RETURN 1; THROW 'bad'", Vars::new()).unwrap_err();
        assert_eq!(err.status, BoundaryStatus::Query);
    }

    #[test]
    fn syntax_errors_fail_the_whole_script() {
        let client = Surreal::<Any>::init();
        block_on(async { client.connect("mem://").await })
            .unwrap()
            .unwrap();
        let err = run_script(&client, "RETURN 1; SELEKT nothing", Vars::new()).unwrap_err();
        assert_eq!(err.status, BoundaryStatus::Query);
    }
}
