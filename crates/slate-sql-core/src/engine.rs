//! Execution engine boundary.
//!
//! The core never talks to a database. An [`ExecutionEngine`] receives the
//! query's AST and returns raw rows keyed by physical column name;
//! [`Query::execute`] bounds that call with a timeout and projects each row
//! onto the query's [`ResultShape`](crate::result::ResultShape).
//!
//! Cancellation is dropping the returned future.

use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::ast::SelectStatement;
use crate::builder::Query;
use crate::error::QueryError;
use crate::result::{RawRow, Row, RowShapeError};
use crate::schema::ColumnType;

/// Default engine timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Something that turns a SELECT statement into rows.
pub trait ExecutionEngine: Send + Sync {
    /// Engine failure, surfaced to the caller unmodified.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Runs `statement` and returns its rows.
    fn execute(
        &self,
        statement: &SelectStatement,
    ) -> impl Future<Output = Result<Vec<RawRow>, Self::Error>> + Send;
}

/// Options for a single [`Query::execute`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecuteOptions {
    /// Upper bound on the engine call, in milliseconds.
    pub timeout_ms: u64,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl ExecuteOptions {
    /// Returns the timeout as a [`Duration`].
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Errors from [`Query::execute`].
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError<E> {
    /// The query could not be compiled.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The engine failed.
    #[error("execution engine failed: {0}")]
    Engine(#[source] E),

    /// The engine did not answer in time.
    #[error("execution timed out after {0:?}")]
    Timeout(Duration),

    /// The engine returned a value that does not match the declared type.
    #[error("row field '{field}' expected {expected}, received {received}")]
    RowShape {
        /// Output field name.
        field: String,
        /// Declared column type.
        expected: ColumnType,
        /// The offending value, rendered inline.
        received: String,
    },
}

impl<E> From<RowShapeError> for ExecuteError<E> {
    fn from(err: RowShapeError) -> Self {
        Self::RowShape {
            field: err.field,
            expected: err.expected,
            received: err.received,
        }
    }
}

impl Query {
    /// Executes the query on `engine` and returns projected rows.
    ///
    /// # Errors
    ///
    /// [`ExecuteError::Query`] if the query does not compile,
    /// [`ExecuteError::Engine`] with the engine's own error,
    /// [`ExecuteError::Timeout`] when `options.timeout_ms` elapses first,
    /// [`ExecuteError::RowShape`] when a returned value has the wrong type.
    pub async fn execute<G: ExecutionEngine>(
        &self,
        engine: &G,
        options: &ExecuteOptions,
    ) -> Result<Vec<Row>, ExecuteError<G::Error>> {
        let statement = self.to_ast()?;
        let shape = self.result_shape()?;
        let timeout = options.timeout();

        debug!(table = %statement.table, ?timeout, "executing query");
        let raw = match tokio::time::timeout(timeout, engine.execute(&statement)).await {
            Ok(Ok(rows)) => rows,
            Ok(Err(err)) => {
                debug!(table = %statement.table, error = %err, "execution failed");
                return Err(ExecuteError::Engine(err));
            }
            Err(_) => {
                warn!(table = %statement.table, ?timeout, "execution timed out");
                return Err(ExecuteError::Timeout(timeout));
            }
        };

        let rows = raw
            .iter()
            .map(|row| shape.project(row))
            .collect::<Result<Vec<_>, _>>()?;
        debug!(table = %statement.table, rows = rows.len(), "query executed");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_options_default() {
        let options = ExecuteOptions::default();
        assert_eq!(options.timeout_ms, DEFAULT_TIMEOUT_MS);
        assert_eq!(options.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_execute_options_from_json() {
        let options: ExecuteOptions = serde_json::from_str(r#"{"timeout_ms": 250}"#).unwrap();
        assert_eq!(options.timeout(), Duration::from_millis(250));

        let options: ExecuteOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, ExecuteOptions::default());
    }

    #[test]
    fn test_row_shape_conversion() {
        let err: ExecuteError<std::io::Error> = RowShapeError {
            field: String::from("id"),
            expected: ColumnType::Number,
            received: String::from("'x'"),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "row field 'id' expected number, received 'x'"
        );
    }
}
