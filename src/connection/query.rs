use crate::boundary::RawHandle;
use crate::convert::IntoEngine;
use crate::error::SurrealBridgeError;
use crate::response::ResponseTable;
use crate::value::MutableValue;

use super::Surreal;

impl Surreal {
    /// Submit a script of one or more statements.
    ///
    /// Only connection-level problems fail the call; a failing statement is
    /// reported from its own slot of the returned [`ResponseTable`].
    ///
    /// # Errors
    /// Connection-level boundary failures.
    pub fn query(&self, text: &str) -> Result<ResponseTable, SurrealBridgeError> {
        let response = self.boundary.query(self.connection_handle()?, text)?;
        ResponseTable::from_handle(&self.boundary, response, self.converter.clone())
    }

    /// Submit a script with `$name` parameters bound to host values.
    ///
    /// ```rust
    /// use std::sync::Arc;
    /// use surreal_bridge::prelude::*;
    ///
    /// let db = Surreal::open(
    ///     Arc::new(MemoryEngine::default()),
    ///     &ClientOptions::builder("memory").namespace("ns").database("db").finish().unwrap(),
    /// ).unwrap();
    /// let response = db.query_bind("RETURN $n;", [("n", 42_i64)]).unwrap();
    /// assert_eq!(response.take_as::<i64>(0).unwrap(), 42);
    /// ```
    ///
    /// # Errors
    /// Conversion failures of a parameter, or connection-level boundary failures.
    pub fn query_bind<K, V, I>(&self, text: &str, params: I) -> Result<ResponseTable, SurrealBridgeError>
    where
        K: Into<String>,
        V: IntoEngine,
        I: IntoIterator<Item = (K, V)>,
    {
        let conn = self.connection_handle()?;
        let staged = params
            .into_iter()
            .map(|(name, value)| Ok((name.into(), self.value(&value)?)))
            .collect::<Result<Vec<(String, MutableValue)>, SurrealBridgeError>>()?;
        let bound: Vec<(String, RawHandle)> = staged
            .into_iter()
            .map(|(name, value)| (name, value.into_raw()))
            .collect();
        let response = self.boundary.query_bind(conn, text, &bound)?;
        ResponseTable::from_handle(&self.boundary, response, self.converter.clone())
    }
}
