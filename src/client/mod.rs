// Query executor over one live connection, pooled or session-scoped.
//
// Split into sub-modules:
// - mod: client struct, transactions, templated query execution, release
// - dml: insert/update/stored-function helpers and their statement builders

pub mod dml;

use std::fmt;
use std::time::Instant;

use tokio_postgres::SimpleQueryMessage;
use tracing::{debug, error};

use crate::error::{PgAccessError, QueryException};
use crate::rows::{QueryOutput, SqlRow, collect_rows, shape};
use crate::template::{QueryOptions, render};
use crate::values::ParamMap;

/// A live database session, checked out of the pool or opened standalone.
///
/// Owned exclusively by one [`PgClient`]; never shared.
pub enum ConnectionHandle {
    /// Pooled connection, returned to the pool on release
    Pooled(deadpool_postgres::Object),
    /// Standalone session connection, closed on release
    Session(tokio_postgres::Client),
}

impl ConnectionHandle {
    fn pg(&self) -> &tokio_postgres::Client {
        match self {
            ConnectionHandle::Pooled(object) => object,
            ConnectionHandle::Session(client) => client,
        }
    }
}

/// Transaction isolation levels accepted by [`PgClient::begin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsolationLevel {
    Serializable,
    RepeatableRead,
    ReadCommitted,
    ReadUncommitted,
}

impl fmt::Display for IsolationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            IsolationLevel::Serializable => "SERIALIZABLE",
            IsolationLevel::RepeatableRead => "REPEATABLE READ",
            IsolationLevel::ReadCommitted => "READ COMMITTED",
            IsolationLevel::ReadUncommitted => "READ UNCOMMITTED",
        })
    }
}

/// Query executor bound to one connection.
///
/// Created per logical unit of work and consumed by [`release`](Self::release);
/// the borrow checker rules out use-after-release and double release.
/// Transactions are session state on the underlying connection, not tracked
/// here: `commit` without a prior `begin` fails however the server fails it.
pub struct PgClient {
    handle: ConnectionHandle,
    logging: bool,
    role: Option<String>,
}

impl PgClient {
    #[must_use]
    pub fn new(handle: ConnectionHandle, logging: bool, role: Option<String>) -> Self {
        Self {
            handle,
            logging,
            role,
        }
    }

    /// Role label this client was created with, if any.
    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.role.as_deref()
    }

    /// Open a transaction, optionally at an explicit isolation level.
    ///
    /// # Errors
    /// Returns the driver error if the statement fails.
    pub async fn begin(
        &self,
        isolation_level: Option<IsolationLevel>,
    ) -> Result<(), PgAccessError> {
        let mut command = String::from("BEGIN TRANSACTION");
        if let Some(level) = isolation_level {
            command.push_str(" ISOLATION LEVEL ");
            command.push_str(&level.to_string());
        }
        command.push(';');
        self.handle.pg().batch_execute(&command).await?;
        Ok(())
    }

    /// # Errors
    /// Returns the driver error if the statement fails.
    pub async fn commit(&self) -> Result<(), PgAccessError> {
        self.handle.pg().batch_execute("COMMIT;").await?;
        Ok(())
    }

    /// # Errors
    /// Returns the driver error if the statement fails.
    pub async fn rollback(&self) -> Result<(), PgAccessError> {
        self.handle.pg().batch_execute("ROLLBACK;").await?;
        Ok(())
    }

    /// Execute SQL text verbatim, without templating, and return the driver's
    /// native result stream.
    ///
    /// # Errors
    /// Returns the driver error if execution fails.
    pub async fn raw(&self, sql: &str) -> Result<Vec<SimpleQueryMessage>, PgAccessError> {
        Ok(self.handle.pg().simple_query(sql).await?)
    }

    /// Render a template against `params` and execute it.
    ///
    /// Logs one line per call: a debug line with elapsed time and the rendered
    /// SQL on success (when logging is enabled), or an error line with elapsed
    /// time, rendered SQL and the resolved message on failure.
    ///
    /// # Errors
    /// Failures are wrapped in a [`QueryException`] carrying the rendered SQL.
    pub async fn query(
        &self,
        sql: &str,
        params: Option<&ParamMap>,
        options: QueryOptions,
    ) -> Result<QueryOutput, PgAccessError> {
        let rendered = render(sql, params, options);
        let started = Instant::now();
        let outcome = self.handle.pg().simple_query(&rendered).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(messages) => {
                if self.logging {
                    debug!(elapsed_ms, sql = %rendered, "query completed");
                }
                Ok(shape(collect_rows(messages), options))
            }
            Err(driver_error) => {
                let exception = QueryException::from_driver(driver_error, rendered);
                error!(
                    elapsed_ms,
                    sql = %exception.sql,
                    error = %exception.message,
                    "query failed"
                );
                Err(exception.into())
            }
        }
    }

    /// Like [`query`](Self::query), returning the first row or `None` on an
    /// empty result.
    ///
    /// # Errors
    /// Failures are wrapped in a [`QueryException`] carrying the rendered SQL.
    pub async fn query_one(
        &self,
        sql: &str,
        params: Option<&ParamMap>,
        options: QueryOptions,
    ) -> Result<Option<SqlRow>, PgAccessError> {
        Ok(self.query(sql, params, options).await?.into_first())
    }

    /// Release the connection, consuming the client.
    ///
    /// A pooled connection goes back to the pool, or is detached and closed
    /// when `discard` is set (for connections observed in a bad state). A
    /// session connection is closed.
    pub fn release(self, discard: bool) {
        match self.handle {
            ConnectionHandle::Pooled(object) => {
                if discard {
                    if self.logging {
                        debug!("client connection discarded");
                    }
                    drop(deadpool_postgres::Object::take(object));
                }
            }
            ConnectionHandle::Session(client) => drop(client),
        }
    }
}
