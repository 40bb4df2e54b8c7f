//! Error types for criteria queries.
//!
//! Validation failures (`InvalidProperty`, `InvalidArgument`) are raised while the
//! chain is being built, before any statement reaches the executor. Cardinality
//! failures (`NotFound`, `TooManyResults`) only come out of `unique()`. Executor
//! failures are carried unchanged in `Execution`.

use crate::executor::LifeError;

/// Error type for criteria building and execution
#[derive(Debug)]
pub enum QueryError {
    /// A selected property is not mapped on the entity
    InvalidProperty {
        entity: &'static str,
        property: String,
    },
    /// Negative offset/limit, or an out-of-range page index or page size
    InvalidArgument(String),
    /// `unique()` matched no row
    NotFound { table: &'static str },
    /// `unique()` matched more than one row
    TooManyResults { table: &'static str },
    /// The executor failed; never retried at this layer
    Execution(LifeError),
}

impl std::fmt::Display for QueryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryError::InvalidProperty { entity, property } => {
                write!(f, "Invalid property in select: {property} (entity {entity})")
            }
            QueryError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            QueryError::NotFound { table } => {
                write!(f, "Expected exactly one row from {table}, found none")
            }
            QueryError::TooManyResults { table } => {
                write!(f, "Expected exactly one row from {table}, found more than one")
            }
            QueryError::Execution(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for QueryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            QueryError::Execution(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LifeError> for QueryError {
    fn from(error: LifeError) -> Self {
        QueryError::Execution(error)
    }
}

impl QueryError {
    /// True for `NotFound`, the one "no rows" outcome surfaced as an error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, QueryError::NotFound { .. })
    }
}
