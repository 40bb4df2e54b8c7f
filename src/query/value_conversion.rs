//! Value conversion utilities for criteria arguments to may_postgres.
//!
//! Criteria arguments are carried as SeaQuery `Value`s so they stay owned, comparable
//! and executor-agnostic. This module turns them into `ToSql` trait objects right
//! before a `may_postgres` call.
//!
//! NULLs keep their SeaQuery type (`Value::Int(None)` binds as a NULL `int4`), so
//! PostgreSQL can still infer parameter types for comparisons against NULL values.
//!
//! Integers bind at the narrowest PostgreSQL width that holds them: `TinyInt`,
//! `SmallInt` and `TinyUnsigned` as `int2`, `SmallUnsigned` as `int4`, `Unsigned` as
//! `int8`. `may_postgres` checks every parameter against the type the server inferred
//! for its placeholder, so an `i32` sent for `smallint_col = $1` is rejected.

use crate::executor::LifeError;
use may_postgres::types::ToSql;
use sea_query::Value;

/// Convert criteria argument values to may_postgres ToSql parameters.
///
/// Converts a slice of `Value`s into `ToSql` trait objects, then executes a closure
/// with the converted parameters, in the same order as the input. The converted
/// parameters only live for the duration of the closure.
///
/// # Errors
///
/// Returns `LifeError::Other` if an unsupported value type is encountered or an
/// unsigned value does not fit PostgreSQL's signed integer types.
pub fn with_converted_params<F, R>(values: &[Value], f: F) -> Result<R, LifeError>
where
    F: FnOnce(&[&dyn ToSql]) -> Result<R, LifeError>,
{
    let owned = values
        .iter()
        .map(to_sql_param)
        .collect::<Result<Vec<_>, _>>()?;
    let params: Vec<&dyn ToSql> = owned.iter().map(|p| p.as_ref()).collect();
    f(&params)
}

fn to_sql_param(value: &Value) -> Result<Box<dyn ToSql>, LifeError> {
    let param: Box<dyn ToSql> = match value {
        Value::Bool(v) => Box::new(*v),
        Value::TinyInt(v) => Box::new(v.map(i16::from)),
        Value::SmallInt(v) => Box::new(*v),
        Value::Int(v) => Box::new(*v),
        Value::BigInt(v) => Box::new(*v),
        Value::TinyUnsigned(v) => Box::new(v.map(i16::from)),
        Value::SmallUnsigned(v) => Box::new(v.map(i32::from)),
        Value::Unsigned(v) => Box::new(v.map(i64::from)),
        Value::BigUnsigned(v) => {
            let converted = match v {
                Some(u) => Some(i64::try_from(*u).map_err(|_| {
                    LifeError::Other(format!(
                        "BigUnsigned value {u} exceeds i64::MAX ({}), cannot be safely bound",
                        i64::MAX
                    ))
                })?),
                None => None,
            };
            Box::new(converted)
        }
        Value::Float(v) => Box::new(*v),
        Value::Double(v) => Box::new(*v),
        Value::String(v) => Box::new(v.as_ref().map(|s| s.to_string())),
        Value::Char(v) => Box::new(v.map(String::from)),
        Value::Bytes(v) => Box::new(v.as_ref().map(|b| b.to_vec())),
        Value::Json(v) => {
            let json = match v {
                Some(j) => Some(serde_json::to_string(j).map_err(|e| {
                    LifeError::Other(format!("Failed to serialize JSON: {e}"))
                })?),
                None => None,
            };
            Box::new(json)
        }
        #[allow(unreachable_patterns)]
        _ => {
            return Err(LifeError::Other(format!(
                "Unsupported value type in query: {value:?}"
            )));
        }
    };
    Ok(param)
}
