//! Criteria: the query state shared by one builder chain.
//!
//! A `Criteria` accumulates WHERE fragments, the ORDER BY clause and the LIMIT/OFFSET
//! window for a single mapped entity, assembles them into SQL, and runs the result
//! through a [`LifeExecutor`]. The builder stages in [`stages`](super::stages) are thin
//! wrappers around it; everything they do can also be done here directly.
//!
//! WHERE and ORDER BY fragments are raw SQL written by the developer. Values must
//! always go through `?` placeholders and the argument list; never format caller input
//! into a fragment. Statements are built with sea-query, which numbers every bound
//! value (fragment arguments, then LIMIT and OFFSET) as `$1..$n`.

use crate::executor::{LifeError, LifeExecutor};
use crate::mapping::{EntityMapping, MappedEntity, SELECT_ALL};
#[cfg(feature = "metrics")]
use crate::metrics::METRICS;
#[cfg(feature = "tracing")]
use crate::metrics::tracing_helpers;
use crate::query::error::QueryError;
use crate::query::fragment::{order_terms, PostgresFragment};
use crate::query::page::{Page, PageResult, DEFAULT_ITEMS_PER_PAGE};
use crate::query::traits::FromRow;
use sea_query::{Asterisk, Expr, PostgresQueryBuilder, Query, SelectStatement, Value};
use std::marker::PhantomData;

/// Assembled SQL text with its positional bind values
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    /// PostgreSQL SQL with `$1..$n` placeholders
    pub sql: String,
    pub values: Vec<Value>,
}

impl Statement {
    fn build(query: &SelectStatement) -> Self {
        let (sql, values) = query.build(PostgresQueryBuilder);
        Self {
            sql,
            values: values.0,
        }
    }
}

/// LIMIT/OFFSET window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub max_results: u64,
}

impl Window {
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if either value is negative.
    pub fn new(offset: i64, max_results: i64) -> Result<Self, QueryError> {
        let offset = u64::try_from(offset).map_err(|_| {
            QueryError::InvalidArgument(format!("offset must not be negative, got {offset}"))
        })?;
        let max_results = u64::try_from(max_results).map_err(|_| {
            QueryError::InvalidArgument(format!(
                "max results must not be negative, got {max_results}"
            ))
        })?;
        Ok(Self {
            offset,
            max_results,
        })
    }
}

/// Mutable query state for one chain against entity `T`, executed by `Ex`
pub struct Criteria<'e, T, Ex> {
    mapping: &'static EntityMapping,
    select: Option<Vec<&'static str>>,
    wheres: Vec<(String, Vec<Value>)>,
    order_by: Option<String>,
    window: Option<Window>,
    default_items_per_page: i64,
    executor: &'e Ex,
    _entity: PhantomData<fn() -> T>,
}

impl<'e, T, Ex> Criteria<'e, T, Ex>
where
    T: MappedEntity,
    Ex: LifeExecutor,
{
    /// Criteria selecting all columns of `T`
    pub fn new(executor: &'e Ex) -> Self {
        Self {
            mapping: T::mapping(),
            select: None,
            wheres: Vec::new(),
            order_by: None,
            window: None,
            default_items_per_page: DEFAULT_ITEMS_PER_PAGE,
            executor,
            _entity: PhantomData,
        }
    }

    /// Criteria selecting the given properties, resolved to columns immediately.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidProperty` for the first unmapped property.
    pub fn with_selection<S: AsRef<str>>(
        executor: &'e Ex,
        properties: &[S],
    ) -> Result<Self, QueryError> {
        let mut criteria = Self::new(executor);
        criteria.select = Some(criteria.mapping.resolve_selection(properties)?);
        Ok(criteria)
    }

    /// Page size used by `page_default`
    pub fn with_default_items_per_page(mut self, items_per_page: i64) -> Self {
        self.default_items_per_page = items_per_page;
        self
    }

    /// Append a WHERE fragment such as `"name = ?"` with its bound arguments.
    ///
    /// Fragments are AND-joined in the order they were added.
    pub fn add_where<I, V>(&mut self, clause: impl Into<String>, args: I)
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.wheres
            .push((clause.into(), args.into_iter().map(Into::into).collect()));
    }

    /// Set the ORDER BY clause, replacing any previous one.
    pub fn set_order_by(&mut self, clause: impl Into<String>) {
        self.order_by = Some(clause.into());
    }

    /// Set the LIMIT/OFFSET window.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if either value is negative; the previous
    /// window is kept in that case.
    pub fn set_limit(&mut self, offset: i64, max_results: i64) -> Result<(), QueryError> {
        self.window = Some(Window::new(offset, max_results)?);
        Ok(())
    }

    pub fn mapping(&self) -> &'static EntityMapping {
        self.mapping
    }

    /// Resolved column names, `None` when selecting all columns
    pub fn selection(&self) -> Option<&[&'static str]> {
        self.select.as_deref()
    }

    pub fn where_clauses(&self) -> &[(String, Vec<Value>)] {
        &self.wheres
    }

    pub fn order_by(&self) -> Option<&str> {
        self.order_by.as_deref()
    }

    pub fn window(&self) -> Option<Window> {
        self.window
    }

    pub fn default_items_per_page(&self) -> i64 {
        self.default_items_per_page
    }

    pub fn executor(&self) -> &'e Ex {
        self.executor
    }

    /// `SELECT <columns> FROM <table> [WHERE ..] [ORDER BY ..] [LIMIT $n OFFSET $m]`
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if a WHERE fragment's `?` count does not
    /// match its arguments.
    pub fn assemble_select(&self) -> Result<Statement, QueryError> {
        let mut query = Query::select();
        match &self.select {
            Some(columns) if !columns.is_empty() => {
                for &column in columns {
                    if column == SELECT_ALL {
                        query.column(Asterisk);
                    } else {
                        query.column(column);
                    }
                }
            }
            _ => {
                query.column(Asterisk);
            }
        }
        query.from(self.mapping.table_name());
        self.apply_wheres(&mut query)?;

        if let Some(order_by) = self.order_by.as_deref() {
            for (term, order, nulls) in order_terms(order_by) {
                match nulls {
                    Some(nulls) => query.order_by_expr_with_nulls(Expr::cust(term), order, nulls),
                    None => query.order_by_expr(Expr::cust(term), order),
                };
            }
        }
        if let Some(window) = self.window {
            query.limit(window.max_results).offset(window.offset);
        }

        Ok(Statement::build(&query))
    }

    /// `SELECT COUNT(*) FROM <table> [WHERE ..]`; ordering and window never apply.
    ///
    /// # Errors
    ///
    /// Same as [`assemble_select`](Self::assemble_select).
    pub fn assemble_count(&self) -> Result<Statement, QueryError> {
        let mut query = Query::select();
        query
            .expr(Expr::cust("COUNT(*)"))
            .from(self.mapping.table_name());
        self.apply_wheres(&mut query)?;
        Ok(Statement::build(&query))
    }

    fn apply_wheres(&self, query: &mut SelectStatement) -> Result<(), QueryError> {
        for (clause, args) in &self.wheres {
            let fragment = PostgresFragment::parse(clause)?;
            if fragment.placeholders != args.len() {
                return Err(QueryError::InvalidArgument(format!(
                    "WHERE fragment `{clause}` has {} placeholder(s) but {} argument(s)",
                    fragment.placeholders,
                    args.len()
                )));
            }
            query.and_where(Expr::cust_with_values(fragment.sql, args.iter().cloned()));
        }
        Ok(())
    }

    /// Number of rows matching the WHERE fragments.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` for a malformed WHERE fragment and
    /// `QueryError::Execution` if the executor fails or reports a negative count.
    pub fn count(&self) -> Result<u64, QueryError> {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::terminal_span("count", self.mapping.table_name()).entered();

        let statement = self.assemble_count()?;
        log::debug!(
            "criteria count on {}: {} ({} params)",
            self.mapping.table_name(),
            statement.sql,
            statement.values.len()
        );

        let count = self.executor.query_count(&statement.sql, &statement.values)?;
        u64::try_from(count).map_err(|_| {
            QueryError::Execution(LifeError::ParseError(format!(
                "Count cannot be negative: {count}"
            )))
        })
    }

    fn fetch(&self) -> Result<Vec<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        let statement = self.assemble_select()?;
        log::debug!(
            "criteria select on {}: {} ({} params)",
            self.mapping.table_name(),
            statement.sql,
            statement.values.len()
        );

        let rows = self.executor.query_all(&statement.sql, &statement.values)?;
        rows.iter()
            .map(|row| T::from_row(row).map_err(QueryError::from))
            .collect()
    }

    /// All matching rows, in the order the database returns them.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Execution` if the executor or row materialization fails.
    pub fn list(self) -> Result<Vec<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::terminal_span("list", self.mapping.table_name()).entered();

        self.fetch()
    }

    /// First matching row, or `None` when nothing matches.
    ///
    /// Fetches a single row: the window keeps its offset and is capped at one result.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::Execution` if the executor or row materialization fails.
    pub fn first(mut self) -> Result<Option<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::terminal_span("first", self.mapping.table_name()).entered();

        let offset = self.window.map_or(0, |w| w.offset);
        self.window = Some(Window {
            offset,
            max_results: 1,
        });
        Ok(self.fetch()?.into_iter().next())
    }

    /// The single matching row.
    ///
    /// Always fetches up to two rows from the current offset, so an earlier `limit`
    /// cannot hide a second match.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::NotFound` for zero rows, `QueryError::TooManyResults` for
    /// more than one, and `QueryError::Execution` if the executor fails.
    pub fn unique(mut self) -> Result<T, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::terminal_span("unique", self.mapping.table_name()).entered();

        let offset = self.window.map_or(0, |w| w.offset);
        self.window = Some(Window {
            offset,
            max_results: 2,
        });

        let table = self.mapping.table_name();
        let mut rows = self.fetch()?.into_iter();
        match (rows.next(), rows.next()) {
            (Some(row), None) => Ok(row),
            (None, _) => Err(QueryError::NotFound { table }),
            (Some(_), Some(_)) => Err(QueryError::TooManyResults { table }),
        }
    }

    /// One page of matching rows plus paging metadata.
    ///
    /// Counts first, then selects only if `page_index` falls inside the result set;
    /// out-of-range pages come back empty without a select. Any window set earlier on
    /// the chain is replaced by the page window; ordering is kept.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if `page_index` or `items_per_page` is
    /// below 1 (before any query runs), and `QueryError::Execution` if the executor
    /// fails.
    pub fn page(mut self, page_index: i64, items_per_page: i64) -> Result<PageResult<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        #[cfg(feature = "tracing")]
        let _span = tracing_helpers::terminal_span("page", self.mapping.table_name()).entered();

        let page_index = u64::try_from(page_index)
            .ok()
            .filter(|&p| p >= 1)
            .ok_or_else(|| {
                QueryError::InvalidArgument(format!("page index must be >= 1, got {page_index}"))
            })?;
        let items_per_page = u64::try_from(items_per_page)
            .ok()
            .filter(|&n| n >= 1)
            .ok_or_else(|| {
                QueryError::InvalidArgument(format!(
                    "items per page must be >= 1, got {items_per_page}"
                ))
            })?;

        let total_items = self.count()?;
        let page = Page::new(page_index, items_per_page, total_items);

        #[cfg(feature = "metrics")]
        METRICS.record_page();

        if page.is_out_of_range() {
            log::debug!(
                "page {} of {} on {} is out of range, skipping select",
                page.page_index,
                page.total_pages,
                self.mapping.table_name()
            );
            return Ok(PageResult::empty(page));
        }

        self.window = Some(Window {
            offset: page.offset(),
            max_results: page.items_per_page,
        });
        let items = self.fetch()?;
        Ok(PageResult { page, items })
    }

    /// [`page`](Self::page) with the configured default page size.
    ///
    /// # Errors
    ///
    /// Same as [`page`](Self::page).
    pub fn page_default(self, page_index: i64) -> Result<PageResult<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        let items_per_page = self.default_items_per_page;
        self.page(page_index, items_per_page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockExecutor;
    use crate::tests_cfg::{user_row, User};
    use fake::{Fake, Faker};

    #[test]
    fn test_select_all_columns_by_default() {
        let executor = MockExecutor::new();
        let criteria = Criteria::<User, _>::new(&executor);
        let statement = criteria.assemble_select().unwrap();
        assert_eq!(statement.sql, r#"SELECT * FROM "users""#);
        assert!(statement.values.is_empty());
    }

    #[test]
    fn test_selection_is_resolved_to_columns() {
        let executor = MockExecutor::new();
        let criteria = Criteria::<User, _>::with_selection(&executor, &["id", "name"]).unwrap();
        assert_eq!(criteria.selection(), Some(&["id", "user_name"][..]));
        assert_eq!(
            criteria.assemble_select().unwrap().sql,
            r#"SELECT "id", "user_name" FROM "users""#
        );
    }

    #[test]
    fn test_invalid_selection_fails_before_execution() {
        let executor = MockExecutor::new();
        let result = Criteria::<User, _>::with_selection(&executor, &["name", "nickname"]);
        assert!(matches!(
            result,
            Err(QueryError::InvalidProperty { ref property, .. }) if property == "nickname"
        ));
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_single_where_fragment_is_not_parenthesized() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("user_name = ?", ["Bob"]);

        let statement = criteria.assemble_select().unwrap();
        assert_eq!(statement.sql, r#"SELECT * FROM "users" WHERE user_name = $1"#);
        assert_eq!(statement.values, vec![Value::from("Bob")]);
    }

    #[test]
    fn test_where_fragments_are_and_joined_in_order() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("age > ? OR age < ?", [60, 18]);
        criteria.add_where("user_name = ?", ["Bob"]);

        let statement = criteria.assemble_select().unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE (age > $1 OR age < $2) AND (user_name = $3)"#
        );
        assert_eq!(
            statement.values,
            vec![Value::from(60), Value::from(18), Value::from("Bob")]
        );
    }

    #[test]
    fn test_where_without_arguments() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("email_address IS NULL", Vec::<Value>::new());
        let statement = criteria.assemble_select().unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE email_address IS NULL"#
        );
        assert!(statement.values.is_empty());
    }

    #[test]
    fn test_order_by_overwrites_previous_clause() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_order_by("id");
        criteria.set_order_by("user_name DESC");
        assert_eq!(
            criteria.assemble_select().unwrap().sql,
            r#"SELECT * FROM "users" ORDER BY user_name DESC"#
        );
    }

    #[test]
    fn test_full_select_shape() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::with_selection(&executor, &["*"]).unwrap();
        criteria.add_where("age >= ?", [21]);
        criteria.set_order_by("id DESC");
        criteria.set_limit(40, 20).unwrap();

        let statement = criteria.assemble_select().unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE age >= $1 ORDER BY id DESC LIMIT $2 OFFSET $3"#
        );
        assert_eq!(
            statement.values,
            vec![Value::from(21), Value::from(20u64), Value::from(40u64)]
        );
    }

    #[test]
    fn test_limit_values_are_kept_exactly() {
        let executor = MockExecutor::new();
        for (offset, max) in [(0, 0), (0, 1), (7, 3), (1_000_000, 250)] {
            let mut criteria = Criteria::<User, _>::new(&executor);
            criteria.set_limit(offset, max).unwrap();
            let window = criteria.window().unwrap();
            assert_eq!(window.offset, offset as u64);
            assert_eq!(window.max_results, max as u64);
            let statement = criteria.assemble_select().unwrap();
            assert!(statement.sql.ends_with("LIMIT $1 OFFSET $2"));
            assert_eq!(
                statement.values,
                vec![Value::from(max as u64), Value::from(offset as u64)]
            );
        }
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        assert!(matches!(
            criteria.set_limit(-1, 10),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(matches!(
            criteria.set_limit(0, -5),
            Err(QueryError::InvalidArgument(_))
        ));
        assert_eq!(criteria.window(), None);
    }

    #[test]
    fn test_count_ignores_order_and_window() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("age > ?", [30]);
        criteria.set_order_by("id");
        criteria.set_limit(10, 5).unwrap();

        let statement = criteria.assemble_count().unwrap();
        assert_eq!(statement.sql, r#"SELECT COUNT(*) FROM "users" WHERE age > $1"#);
        assert_eq!(statement.values, vec![Value::from(30)]);
    }

    #[test]
    fn test_count_executes_count_statement() {
        let executor = MockExecutor::new();
        executor.push_count(42);
        let criteria = Criteria::<User, _>::new(&executor);
        assert_eq!(criteria.count().unwrap(), 42);
        assert_eq!(executor.captured_sql(), vec![r#"SELECT COUNT(*) FROM "users""#]);
    }

    #[test]
    fn test_negative_count_is_an_execution_error() {
        let executor = MockExecutor::new();
        executor.push_count(-1);
        let criteria = Criteria::<User, _>::new(&executor);
        assert!(matches!(
            criteria.count(),
            Err(QueryError::Execution(LifeError::ParseError(_)))
        ));
    }

    #[test]
    fn test_list_materializes_rows_in_order() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![user_row(2, "Bob", 40), user_row(1, "Alice", 30)]);

        let users = Criteria::<User, _>::new(&executor).list().unwrap();
        let ids: Vec<_> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(users[1].email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_first_caps_window_and_keeps_offset() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![user_row(5, "Eve", 22)]);

        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_limit(3, 50).unwrap();
        let user = criteria.first().unwrap();

        assert_eq!(user.map(|u| u.id), Some(5));
        let statements = executor.statements();
        assert_eq!(statements[0].sql, r#"SELECT * FROM "users" LIMIT $1 OFFSET $2"#);
        assert_eq!(
            statements[0].values,
            vec![Value::from(1u64), Value::from(3u64)]
        );
    }

    #[test]
    fn test_first_on_no_rows_is_none() {
        let executor = MockExecutor::new();
        let user = Criteria::<User, _>::new(&executor).first().unwrap();
        assert!(user.is_none());
        let statements = executor.statements();
        assert_eq!(statements[0].sql, r#"SELECT * FROM "users" LIMIT $1 OFFSET $2"#);
        assert_eq!(
            statements[0].values,
            vec![Value::from(1u64), Value::from(0u64)]
        );
    }

    #[test]
    fn test_unique_cardinality() {
        let executor = MockExecutor::new();

        executor.push_rows(vec![user_row(1, "Alice", 30)]);
        let user = Criteria::<User, _>::new(&executor).unique().unwrap();
        assert_eq!(user.name, "Alice");

        executor.push_rows(vec![]);
        let err = Criteria::<User, _>::new(&executor).unique().unwrap_err();
        assert!(matches!(err, QueryError::NotFound { table: "users" }));

        executor.push_rows(vec![user_row(1, "Alice", 30), user_row(2, "Bob", 40)]);
        let err = Criteria::<User, _>::new(&executor).unique().unwrap_err();
        assert!(matches!(err, QueryError::TooManyResults { table: "users" }));

        assert!(executor
            .statements()
            .iter()
            .all(|s| s.values == vec![Value::from(2u64), Value::from(0u64)]));
    }

    #[test]
    fn test_unique_ignores_smaller_limit() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![user_row(1, "Alice", 30), user_row(2, "Bob", 40)]);

        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_limit(5, 1).unwrap();
        let err = criteria.unique().unwrap_err();
        assert!(matches!(err, QueryError::TooManyResults { table: "users" }));
        assert_eq!(
            executor.statements()[0].values,
            vec![Value::from(2u64), Value::from(5u64)]
        );

        executor.push_rows(vec![user_row(1, "Alice", 30)]);
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_limit(0, 0).unwrap();
        assert_eq!(criteria.unique().unwrap().id, 1);
    }

    #[test]
    fn test_execution_errors_are_propagated_unchanged() {
        let executor = MockExecutor::new();
        executor.push_rows_error(LifeError::QueryError("connection reset".to_string()));
        let err = Criteria::<User, _>::new(&executor).list().unwrap_err();
        assert!(matches!(
            err,
            QueryError::Execution(LifeError::QueryError(ref msg)) if msg == "connection reset"
        ));
    }

    #[test]
    fn test_row_materialization_error_is_reported() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![crate::mock::MockRow::new().with("id", 1i64)]);
        let err = Criteria::<User, _>::new(&executor).list().unwrap_err();
        assert!(matches!(err, QueryError::Execution(LifeError::ParseError(_))));
    }

    #[test]
    fn test_list_materializes_generated_users() {
        let generated: Vec<User> = (0..5).map(|_| Faker.fake()).collect();
        let executor = MockExecutor::new();
        executor.push_rows(generated.iter().map(User::to_row).collect());

        let users = Criteria::<User, _>::new(&executor).list().unwrap();
        assert_eq!(users, generated);
    }

    fn users(range: std::ops::RangeInclusive<i64>) -> Vec<crate::mock::MockRow> {
        range.map(|id| user_row(id, &format!("user{id}"), 20 + id)).collect()
    }

    #[test]
    fn test_page_windows_over_twenty_five_rows() {
        let executor = MockExecutor::new();

        executor.push_count(25).push_rows(users(1..=10));
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_order_by("id");
        let first = criteria.page(1, 10).unwrap();
        assert_eq!(first.page.total_pages, 3);
        assert_eq!(first.page.total_items, 25);
        assert_eq!(first.len(), 10);

        executor.push_count(25).push_rows(users(21..=25));
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_order_by("id");
        let last = criteria.page(3, 10).unwrap();
        assert_eq!(last.page.page_index, 3);
        assert_eq!(last.len(), 5);
        assert!(last.len() as u64 <= last.page.items_per_page);

        let statements = executor.statements();
        assert_eq!(
            executor.captured_sql(),
            vec![
                r#"SELECT COUNT(*) FROM "users""#,
                r#"SELECT * FROM "users" ORDER BY id ASC LIMIT $1 OFFSET $2"#,
                r#"SELECT COUNT(*) FROM "users""#,
                r#"SELECT * FROM "users" ORDER BY id ASC LIMIT $1 OFFSET $2"#,
            ]
        );
        assert_eq!(statements[1].values, vec![Value::from(10u64), Value::from(0u64)]);
        assert_eq!(statements[3].values, vec![Value::from(10u64), Value::from(20u64)]);
    }

    #[test]
    fn test_page_beyond_range_skips_select() {
        let executor = MockExecutor::new();
        executor.push_count(25);

        let result = Criteria::<User, _>::new(&executor).page(4, 10).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.page.total_pages, 3);
        assert_eq!(result.page.total_items, 25);
        assert_eq!(result.page.page_index, 4);
        assert_eq!(executor.captured_sql(), vec![r#"SELECT COUNT(*) FROM "users""#]);
    }

    #[test]
    fn test_page_on_empty_table_has_zero_pages() {
        let executor = MockExecutor::new();
        executor.push_count(0);

        let result = Criteria::<User, _>::new(&executor).page(1, 10).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.page.total_pages, 0);
        assert_eq!(executor.statements().len(), 1);
    }

    #[test]
    fn test_page_replaces_existing_window_and_keeps_filters() {
        let executor = MockExecutor::new();
        executor.push_count(12).push_rows(users(6..=10));

        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("age > ?", [18]);
        criteria.set_limit(100, 1).unwrap();
        let result = criteria.page(2, 5).unwrap();

        assert_eq!(result.len(), 5);
        let statements = executor.statements();
        assert_eq!(
            statements[0].sql,
            r#"SELECT COUNT(*) FROM "users" WHERE age > $1"#
        );
        assert_eq!(
            statements[1].sql,
            r#"SELECT * FROM "users" WHERE age > $1 LIMIT $2 OFFSET $3"#
        );
        assert_eq!(
            statements[1].values,
            vec![Value::from(18), Value::from(5u64), Value::from(5u64)]
        );
    }

    #[test]
    fn test_page_rejects_bad_arguments_before_querying() {
        let executor = MockExecutor::new();
        for (index, size) in [(0, 10), (-1, 10), (1, 0), (1, -10)] {
            let err = Criteria::<User, _>::new(&executor).page(index, size).unwrap_err();
            assert!(matches!(err, QueryError::InvalidArgument(_)));
        }
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_page_default_uses_default_page_size() {
        let executor = MockExecutor::new();
        executor.push_count(3).push_rows(users(1..=3));

        let result = Criteria::<User, _>::new(&executor).page_default(1).unwrap();
        assert_eq!(result.page.items_per_page, DEFAULT_ITEMS_PER_PAGE as u64);
        assert_eq!(result.page.total_pages, 1);
        assert_eq!(
            executor.statements()[1].values,
            vec![Value::from(10u64), Value::from(0u64)]
        );
    }

    #[test]
    fn test_count_is_repeatable() {
        let executor = MockExecutor::new();
        executor.push_count(9).push_count(9);
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("age > ?", [40]);
        assert_eq!(criteria.count().unwrap(), criteria.count().unwrap());
        let statements = executor.statements();
        assert_eq!(statements[0], statements[1]);
    }

    #[test]
    fn test_fragments_with_quotes_comments_and_dollar_strings() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("/* why? */ id = ?", [1]);
        criteria.add_where(
            r"user_name <> E'it\'s?' AND user_name <> $$a?b$$",
            Vec::<Value>::new(),
        );
        criteria.add_where("age > ? -- adults?\n", [17]);

        let statement = criteria.assemble_select().unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" WHERE (id = $1) AND (user_name <> E'it\'s?' AND user_name <> E'a?b') AND (age > $2)"#
        );
        assert_eq!(statement.values, vec![Value::from(1), Value::from(17)]);
    }

    #[test]
    fn test_placeholder_count_mismatch_fails_before_execution() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.add_where("age > ? AND age < ?", [18]);
        assert!(matches!(
            criteria.assemble_select(),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(matches!(criteria.count(), Err(QueryError::InvalidArgument(_))));
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_order_terms_keep_direction_and_nulls() {
        let executor = MockExecutor::new();
        let mut criteria = Criteria::<User, _>::new(&executor);
        criteria.set_order_by("age desc nulls last, lower(user_name)");
        assert_eq!(
            criteria.assemble_select().unwrap().sql,
            r#"SELECT * FROM "users" ORDER BY age DESC NULLS LAST, lower(user_name) ASC"#
        );
    }
}
