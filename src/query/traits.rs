//! Row materialization for criteria results.

use crate::executor::LifeError;

/// Build an entity from one row produced by an executor
///
/// The row type is a parameter so the same entity can be materialized from
/// `may_postgres::Row` in production and from [`MockRow`](crate::mock::MockRow)
/// in tests.
///
/// # Example
///
/// ```no_run
/// use lifeguard_criteria::{FromRow, LifeError};
///
/// struct User { id: i64, name: String }
///
/// impl FromRow<may_postgres::Row> for User {
///     fn from_row(row: &may_postgres::Row) -> Result<Self, LifeError> {
///         Ok(User {
///             id: row.try_get("id").map_err(|e| LifeError::ParseError(e.to_string()))?,
///             name: row.try_get("user_name").map_err(|e| LifeError::ParseError(e.to_string()))?,
///         })
///     }
/// }
/// ```
pub trait FromRow<R>: Sized {
    /// # Errors
    ///
    /// Returns `LifeError::ParseError` if a column is missing or has the wrong type.
    fn from_row(row: &R) -> Result<Self, LifeError>;
}
