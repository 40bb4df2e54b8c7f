//! In-memory executor for testing criteria chains without a database.
//!
//! `MockExecutor` records every statement it receives and replays queued results in
//! FIFO order: row sets for `query_all`, scalars for `query_count`. An empty row
//! queue yields no rows; an empty count queue is an error, so a test that forgets to
//! queue a count fails loudly instead of reading zero.
//!
//! Available in this crate's tests and to downstream crates through the `mock`
//! feature.

use crate::executor::{LifeError, LifeExecutor};
use crate::query::Statement;
use sea_query::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Column name -> value row returned by [`MockExecutor`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MockRow {
    columns: BTreeMap<String, Value>,
}

impl MockRow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a column value
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    pub fn value(&self, column: &str) -> Result<&Value, LifeError> {
        self.columns
            .get(column)
            .ok_or_else(|| LifeError::ParseError(format!("Column not found: {column}")))
    }

    pub fn get_i64(&self, column: &str) -> Result<i64, LifeError> {
        match self.value(column)? {
            Value::TinyInt(Some(v)) => Ok(i64::from(*v)),
            Value::SmallInt(Some(v)) => Ok(i64::from(*v)),
            Value::Int(Some(v)) => Ok(i64::from(*v)),
            Value::BigInt(Some(v)) => Ok(*v),
            other => Err(LifeError::ParseError(format!(
                "Column {column} is not an integer: {other:?}"
            ))),
        }
    }

    pub fn get_string(&self, column: &str) -> Result<String, LifeError> {
        self.get_opt_string(column)?
            .ok_or_else(|| LifeError::ParseError(format!("Column {column} is NULL")))
    }

    pub fn get_opt_string(&self, column: &str) -> Result<Option<String>, LifeError> {
        match self.value(column)? {
            Value::String(v) => Ok(v.as_ref().map(|s| s.to_string())),
            other => Err(LifeError::ParseError(format!(
                "Column {column} is not a string: {other:?}"
            ))),
        }
    }
}

#[derive(Default)]
struct MockState {
    statements: Vec<Statement>,
    row_sets: VecDeque<Result<Vec<MockRow>, LifeError>>,
    counts: VecDeque<Result<i64, LifeError>>,
}

/// Recording executor with queued results
///
/// Clones share the same recorded statements and queues.
#[derive(Clone, Default)]
pub struct MockExecutor {
    state: Arc<Mutex<MockState>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue the rows returned by the next `query_all`
    pub fn push_rows(&self, rows: Vec<MockRow>) -> &Self {
        self.state().row_sets.push_back(Ok(rows));
        self
    }

    /// Queue the scalar returned by the next `query_count`
    pub fn push_count(&self, count: i64) -> &Self {
        self.state().counts.push_back(Ok(count));
        self
    }

    /// Make the next `query_all` fail
    pub fn push_rows_error(&self, error: LifeError) -> &Self {
        self.state().row_sets.push_back(Err(error));
        self
    }

    /// Make the next `query_count` fail
    pub fn push_count_error(&self, error: LifeError) -> &Self {
        self.state().counts.push_back(Err(error));
        self
    }

    /// Statements received so far, in execution order
    pub fn statements(&self) -> Vec<Statement> {
        self.state().statements.clone()
    }

    pub fn captured_sql(&self) -> Vec<String> {
        self.state()
            .statements
            .iter()
            .map(|s| s.sql.clone())
            .collect()
    }

    pub fn clear(&self) {
        let mut state = self.state();
        state.statements.clear();
        state.row_sets.clear();
        state.counts.clear();
    }

    fn record(&self, sql: &str, values: &[Value]) {
        self.state().statements.push(Statement {
            sql: sql.to_string(),
            values: values.to_vec(),
        });
    }
}

impl LifeExecutor for MockExecutor {
    type Row = MockRow;

    fn query_all(&self, sql: &str, values: &[Value]) -> Result<Vec<MockRow>, LifeError> {
        self.record(sql, values);
        self.state().row_sets.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn query_count(&self, sql: &str, values: &[Value]) -> Result<i64, LifeError> {
        self.record(sql, values);
        self.state().counts.pop_front().unwrap_or_else(|| {
            Err(LifeError::QueryError(
                "MockExecutor: no count queued".to_string(),
            ))
        })
    }
}
