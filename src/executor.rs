//! `LifeExecutor` Module
//!
//! Provides the `LifeExecutor` trait that abstracts statement execution for criteria
//! queries, and its `may_postgres` implementation.
//!
//! The criteria layer never touches a connection directly: it hands assembled SQL
//! (with PostgreSQL `$n` placeholders) and positional [`Value`]s to an executor and
//! gets back rows or a scalar count.

use may_postgres::types::ToSql;
use may_postgres::{Client, Error as PostgresError, Row};
use sea_query::Value;
use std::fmt;
use std::time::Instant;

#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
use crate::query::value_conversion::with_converted_params;

/// `LifeExecutor` error type
#[derive(Debug)]
pub enum LifeError {
    /// `PostgreSQL` error from `may_postgres`
    PostgresError(PostgresError),
    /// Query execution error
    QueryError(String),
    /// Row parsing/conversion error
    ParseError(String),
    /// Other execution errors
    Other(String),
}

impl fmt::Display for LifeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LifeError::PostgresError(e) => {
                write!(f, "PostgreSQL error: {e}")
            }
            LifeError::QueryError(s) => {
                write!(f, "Query error: {s}")
            }
            LifeError::ParseError(s) => {
                write!(f, "Parse error: {s}")
            }
            LifeError::Other(s) => {
                write!(f, "Execution error: {s}")
            }
        }
    }
}

impl std::error::Error for LifeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LifeError::PostgresError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<PostgresError> for LifeError {
    fn from(err: PostgresError) -> Self {
        LifeError::PostgresError(err)
    }
}

/// Trait for executing criteria statements
///
/// Implementations receive SQL text rendered by sea-query's `PostgresQueryBuilder`
/// (`$1..$n` placeholders) and the bound values in placeholder order. They must never
/// interpolate values into the SQL.
///
/// "No rows" is not an error at this level: `query_all` returns an empty vector and
/// leaves cardinality decisions to the caller.
pub trait LifeExecutor {
    /// Row type produced by this executor, materialized into entities via
    /// [`FromRow`](crate::query::FromRow).
    type Row;

    /// Execute a query and return all rows
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the statement cannot be executed.
    fn query_all(&self, sql: &str, values: &[Value]) -> Result<Vec<Self::Row>, LifeError>;

    /// Execute a query returning a single integer scalar (e.g. `SELECT COUNT(*)`)
    ///
    /// # Errors
    ///
    /// Returns `LifeError` if the statement cannot be executed or the first column of
    /// the first row is not an integer.
    fn query_count(&self, sql: &str, values: &[Value]) -> Result<i64, LifeError>;
}

impl<E: LifeExecutor + ?Sized> LifeExecutor for &E {
    type Row = E::Row;

    fn query_all(&self, sql: &str, values: &[Value]) -> Result<Vec<Self::Row>, LifeError> {
        (**self).query_all(sql, values)
    }

    fn query_count(&self, sql: &str, values: &[Value]) -> Result<i64, LifeError> {
        (**self).query_count(sql, values)
    }
}

/// Implementation of `LifeExecutor` for `may_postgres::Client`
pub struct MayPostgresExecutor {
    client: Client,
}

impl MayPostgresExecutor {
    /// Create a new executor from a `may_postgres::Client`
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying client
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Consume the executor and return the underlying client
    pub fn into_client(self) -> Client {
        self.client
    }

    fn timed<R>(
        &self,
        sql: &str,
        run: impl FnOnce(&str) -> Result<R, LifeError>,
    ) -> Result<R, LifeError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::execute_query_span(sql).entered();

        let start = Instant::now();
        let result = run(sql);
        let duration = start.elapsed();

        #[cfg(feature = "metrics")]
        {
            if result.is_err() {
                METRICS.record_query_error();
            }
            METRICS.record_query(duration);
        }
        log::trace!("executed in {:?}: {}", duration, sql);

        result
    }
}

impl LifeExecutor for MayPostgresExecutor {
    type Row = Row;

    fn query_all(&self, sql: &str, values: &[Value]) -> Result<Vec<Row>, LifeError> {
        self.timed(sql, |sql| {
            with_converted_params(values, |params: &[&dyn ToSql]| {
                self.client.query(sql, params).map_err(LifeError::PostgresError)
            })
        })
    }

    fn query_count(&self, sql: &str, values: &[Value]) -> Result<i64, LifeError> {
        self.timed(sql, |sql| {
            with_converted_params(values, |params: &[&dyn ToSql]| {
                let row = self
                    .client
                    .query_one(sql, params)
                    .map_err(LifeError::PostgresError)?;
                row.try_get::<_, i64>(0)
                    .map_err(|e| LifeError::ParseError(format!("Failed to read count: {e}")))
            })
        })
    }
}
