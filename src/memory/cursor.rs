//! What a cursor handle pulls from.

use std::collections::VecDeque;

use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::sql;

use crate::boundary::BoundaryResult;
use crate::record::RecordKey;
use crate::value::EngineValue;

use super::driver;
use super::values::{self, Vars};

/// A table or a single record the cursor still has to walk.
#[derive(Debug, Clone)]
pub(super) enum Pending {
    Table {
        name: String,
        after: Option<RecordKey>,
    },
    Record(RecordKey),
}

pub(super) enum CursorSource {
    /// Materialised when the statement ran.
    Snapshot(VecDeque<EngineValue>),
    /// Read one record per pull, so writes made meanwhile show through.
    Live {
        client: Surreal<Any>,
        pending: VecDeque<Pending>,
        peeked: Option<EngineValue>,
    },
}

impl std::fmt::Debug for CursorSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CursorSource::Snapshot(items) => f.debug_tuple("Snapshot").field(&items.len()).finish(),
            CursorSource::Live { pending, .. } => {
                f.debug_struct("Live").field("pending", pending).finish_non_exhaustive()
            }
        }
    }
}

impl CursorSource {
    pub(super) fn live(client: Surreal<Any>, pending: Vec<Pending>) -> Self {
        CursorSource::Live {
            client,
            pending: pending.into(),
            peeked: None,
        }
    }

    pub(super) fn has_next(&mut self) -> BoundaryResult<bool> {
        match self {
            CursorSource::Snapshot(items) => Ok(!items.is_empty()),
            CursorSource::Live { .. } => Ok(self.peek()?.is_some()),
        }
    }

    pub(super) fn next(&mut self) -> BoundaryResult<Option<EngineValue>> {
        if let CursorSource::Snapshot(items) = self {
            return Ok(items.pop_front());
        }
        self.peek()?;
        match self {
            CursorSource::Live { peeked, .. } => Ok(peeked.take()),
            CursorSource::Snapshot(_) => Ok(None),
        }
    }

    fn peek(&mut self) -> BoundaryResult<Option<&EngineValue>> {
        let CursorSource::Live {
            client,
            pending,
            peeked,
        } = self
        else {
            return Ok(None);
        };
        while peeked.is_none() {
            let Some(front) = pending.front_mut() else {
                break;
            };
            match front {
                Pending::Table { name, after } => {
                    let mut vars = Vars::new();
                    let filter = match after {
                        Some(key) => {
                            vars.insert("after".into(), sql::Value::Thing(values::thing(key)));
                            "WHERE id > $after "
                        }
                        None => "",
                    };
                    let text = format!("SELECT * FROM `{name}` {filter}ORDER BY id LIMIT 1");
                    match driver::run(client, &text, vars)?.into_iter().next() {
                        Some(row) => {
                            let id = row.get("id").as_record_id().cloned();
                            *peeked = Some(row);
                            match id {
                                Some(id) => *after = Some(id),
                                None => {
                                    pending.pop_front();
                                }
                            }
                        }
                        None => {
                            pending.pop_front();
                        }
                    }
                }
                Pending::Record(key) => {
                    let mut vars = Vars::new();
                    vars.insert("key".into(), sql::Value::Thing(values::thing(key)));
                    *peeked = driver::run(client, "SELECT * FROM $key", vars)?
                        .into_iter()
                        .next();
                    pending.pop_front();
                }
            }
        }
        Ok(peeked.as_ref())
    }
}
