//! Builder stages for criteria chains.
//!
//! A chain is `From -> [Where] -> [OrderBy] -> [Limit] -> terminal`. Each stage owns
//! the chain's [`Criteria`], applies exactly one change to it and hands it to the next
//! stage, so only legal next steps are reachable (no `filter` after `order_by`, nothing
//! but terminals after `limit`). Every stage implements [`Terminal`], so a chain can
//! stop and execute at any point.
//!
//! # Example
//!
//! ```no_run
//! use lifeguard_criteria::{Database, FromRow, LifeExecutor, QueryError, Terminal};
//! # use lifeguard_criteria::{EntityMapping, MappedEntity};
//! # struct User;
//! # impl MappedEntity for User { fn mapping() -> &'static EntityMapping { todo!() } }
//!
//! fn adults<Ex>(db: &Database<Ex>) -> Result<Vec<User>, QueryError>
//! where
//!     Ex: LifeExecutor,
//!     User: FromRow<Ex::Row>,
//! {
//!     db.from::<User>()
//!         .filter("age >= ?", [18])
//!         .order_by("user_name")
//!         .limit(20)?
//!         .list()
//! }
//! ```

use crate::executor::LifeExecutor;
use crate::mapping::MappedEntity;
use crate::query::criteria::{Criteria, Statement};
use crate::query::error::QueryError;
use crate::query::page::PageResult;
use crate::query::traits::FromRow;
use sea_query::Value;

/// Terminal operations available on every stage
pub trait Terminal<'e, T, Ex>: Sized
where
    T: MappedEntity,
    Ex: LifeExecutor + 'e,
{
    /// Accumulated query state
    fn criteria(&self) -> &Criteria<'e, T, Ex>;

    fn into_criteria(self) -> Criteria<'e, T, Ex>;

    /// SQL the select terminals would run (`first`/`unique`/`page` adjust the window)
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if a WHERE fragment's placeholders do not
    /// match its arguments.
    fn statement(&self) -> Result<Statement, QueryError> {
        self.criteria().assemble_select()
    }

    fn list(self) -> Result<Vec<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        self.into_criteria().list()
    }

    fn first(self) -> Result<Option<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        self.into_criteria().first()
    }

    fn unique(self) -> Result<T, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        self.into_criteria().unique()
    }

    fn count(&self) -> Result<u64, QueryError> {
        self.criteria().count()
    }

    fn page(self, page_index: i64, items_per_page: i64) -> Result<PageResult<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        self.into_criteria().page(page_index, items_per_page)
    }

    fn page_default(self, page_index: i64) -> Result<PageResult<T>, QueryError>
    where
        T: FromRow<Ex::Row>,
    {
        self.into_criteria().page_default(page_index)
    }
}

/// Entry stage, bound to one mapped entity and its resolved selection
pub struct From<'e, T, Ex> {
    criteria: Criteria<'e, T, Ex>,
}

/// Stage after one or more WHERE fragments
pub struct Where<'e, T, Ex> {
    criteria: Criteria<'e, T, Ex>,
}

/// Stage after ORDER BY
pub struct OrderBy<'e, T, Ex> {
    criteria: Criteria<'e, T, Ex>,
}

/// Final stage after LIMIT/OFFSET; only terminals remain
pub struct Limit<'e, T, Ex> {
    criteria: Criteria<'e, T, Ex>,
}

impl<'e, T, Ex> From<'e, T, Ex>
where
    T: MappedEntity,
    Ex: LifeExecutor,
{
    pub fn new(criteria: Criteria<'e, T, Ex>) -> Self {
        Self { criteria }
    }

    /// Add a WHERE fragment such as `"name = ?"` with its bound arguments.
    pub fn filter<I, V>(self, clause: impl Into<String>, args: I) -> Where<'e, T, Ex>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Where::new(self.criteria, clause, args)
    }

    pub fn order_by(self, clause: impl Into<String>) -> OrderBy<'e, T, Ex> {
        OrderBy::new(self.criteria, clause)
    }

    /// At most `max_results` rows from offset 0.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if `max_results` is negative.
    pub fn limit(self, max_results: i64) -> Result<Limit<'e, T, Ex>, QueryError> {
        Limit::new(self.criteria, 0, max_results)
    }

    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if either value is negative.
    pub fn limit_offset(
        self,
        offset: i64,
        max_results: i64,
    ) -> Result<Limit<'e, T, Ex>, QueryError> {
        Limit::new(self.criteria, offset, max_results)
    }
}

impl<'e, T, Ex> Where<'e, T, Ex>
where
    T: MappedEntity,
    Ex: LifeExecutor,
{
    fn new<I, V>(mut criteria: Criteria<'e, T, Ex>, clause: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        criteria.add_where(clause, args);
        Self { criteria }
    }

    /// AND another WHERE fragment onto the chain.
    pub fn and<I, V>(self, clause: impl Into<String>, args: I) -> Where<'e, T, Ex>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Where::new(self.criteria, clause, args)
    }

    pub fn order_by(self, clause: impl Into<String>) -> OrderBy<'e, T, Ex> {
        OrderBy::new(self.criteria, clause)
    }

    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if `max_results` is negative.
    pub fn limit(self, max_results: i64) -> Result<Limit<'e, T, Ex>, QueryError> {
        Limit::new(self.criteria, 0, max_results)
    }

    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if either value is negative.
    pub fn limit_offset(
        self,
        offset: i64,
        max_results: i64,
    ) -> Result<Limit<'e, T, Ex>, QueryError> {
        Limit::new(self.criteria, offset, max_results)
    }
}

impl<'e, T, Ex> OrderBy<'e, T, Ex>
where
    T: MappedEntity,
    Ex: LifeExecutor,
{
    fn new(mut criteria: Criteria<'e, T, Ex>, clause: impl Into<String>) -> Self {
        criteria.set_order_by(clause);
        Self { criteria }
    }

    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if `max_results` is negative.
    pub fn limit(self, max_results: i64) -> Result<Limit<'e, T, Ex>, QueryError> {
        Limit::new(self.criteria, 0, max_results)
    }

    /// # Errors
    ///
    /// Returns `QueryError::InvalidArgument` if either value is negative.
    pub fn limit_offset(
        self,
        offset: i64,
        max_results: i64,
    ) -> Result<Limit<'e, T, Ex>, QueryError> {
        Limit::new(self.criteria, offset, max_results)
    }
}

impl<'e, T, Ex> Limit<'e, T, Ex>
where
    T: MappedEntity,
    Ex: LifeExecutor,
{
    fn new(
        mut criteria: Criteria<'e, T, Ex>,
        offset: i64,
        max_results: i64,
    ) -> Result<Self, QueryError> {
        criteria.set_limit(offset, max_results)?;
        Ok(Self { criteria })
    }
}

macro_rules! impl_terminal {
    ($($stage:ident),+) => {
        $(
            impl<'e, T, Ex> Terminal<'e, T, Ex> for $stage<'e, T, Ex>
            where
                T: MappedEntity,
                Ex: LifeExecutor + 'e,
            {
                fn criteria(&self) -> &Criteria<'e, T, Ex> {
                    &self.criteria
                }

                fn into_criteria(self) -> Criteria<'e, T, Ex> {
                    self.criteria
                }
            }
        )+
    };
}

impl_terminal!(From, Where, OrderBy, Limit);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::LifeError;
    use crate::mock::MockExecutor;
    use crate::tests_cfg::{user_row, User};

    fn from(executor: &MockExecutor) -> From<'_, User, MockExecutor> {
        From::new(Criteria::new(executor))
    }

    #[test]
    fn test_terminal_straight_from_entry() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![user_row(1, "Alice", 30)]);
        let users = from(&executor).list().unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(executor.captured_sql(), vec![r#"SELECT * FROM "users""#]);
    }

    #[test]
    fn test_chain_matches_direct_criteria_calls() {
        let executor = MockExecutor::new();

        let chained = from(&executor)
            .filter("age > ?", [30])
            .and("user_name <> ?", ["root"])
            .order_by("id DESC")
            .limit_offset(5, 10)
            .unwrap()
            .statement()
            .unwrap();

        let mut direct = Criteria::<User, _>::new(&executor);
        direct.add_where("age > ?", [30]);
        direct.add_where("user_name <> ?", ["root"]);
        direct.set_order_by("id DESC");
        direct.set_limit(5, 10).unwrap();

        assert_eq!(chained, direct.assemble_select().unwrap());
        assert_eq!(
            chained.sql,
            r#"SELECT * FROM "users" WHERE (age > $1) AND (user_name <> $2) ORDER BY id DESC LIMIT $3 OFFSET $4"#
        );
        assert_eq!(
            chained.values,
            vec![
                Value::from(30),
                Value::from("root"),
                Value::from(10u64),
                Value::from(5u64)
            ]
        );
    }

    #[test]
    fn test_limit_without_offset_starts_at_zero() {
        let executor = MockExecutor::new();
        let limit = from(&executor).order_by("id").limit(3).unwrap();
        let statement = limit.statement().unwrap();
        assert_eq!(
            statement.sql,
            r#"SELECT * FROM "users" ORDER BY id ASC LIMIT $1 OFFSET $2"#
        );
        assert_eq!(statement.values, vec![Value::from(3u64), Value::from(0u64)]);
    }

    #[test]
    fn test_negative_limit_fails_before_any_query() {
        let executor = MockExecutor::new();
        assert!(matches!(
            from(&executor).filter("age > ?", [1]).limit(-1),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(matches!(
            from(&executor).limit_offset(-3, 10),
            Err(QueryError::InvalidArgument(_))
        ));
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_count_from_any_stage_ignores_order_and_limit() {
        let executor = MockExecutor::new();
        executor.push_count(25).push_count(25);

        let limit = from(&executor)
            .filter("age > ?", [18])
            .order_by("id")
            .limit(5)
            .unwrap();

        assert_eq!(limit.count().unwrap(), 25);
        assert_eq!(limit.count().unwrap(), 25);
        assert_eq!(
            executor.captured_sql(),
            vec![
                r#"SELECT COUNT(*) FROM "users" WHERE age > $1"#,
                r#"SELECT COUNT(*) FROM "users" WHERE age > $1"#
            ]
        );
    }

    #[test]
    fn test_first_and_unique_from_where_stage() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![]);
        assert!(from(&executor)
            .filter("id = ?", [99])
            .first()
            .unwrap()
            .is_none());

        executor.push_rows(vec![user_row(7, "Grace", 36)]);
        let user = from(&executor).filter("id = ?", [7]).unique().unwrap();
        assert_eq!(user.id, 7);

        let statements = executor.statements();
        assert_eq!(
            statements[0].values,
            vec![Value::from(99), Value::from(1u64), Value::from(0u64)]
        );
        assert_eq!(
            statements[1].sql,
            r#"SELECT * FROM "users" WHERE id = $1 LIMIT $2 OFFSET $3"#
        );
        assert_eq!(
            statements[1].values,
            vec![Value::from(7), Value::from(2u64), Value::from(0u64)]
        );
    }

    #[test]
    fn test_unique_after_limit_one_still_detects_duplicates() {
        let executor = MockExecutor::new();
        executor.push_rows(vec![user_row(1, "Alice", 30), user_row(2, "Alice", 41)]);

        let err = from(&executor)
            .filter("user_name = ?", ["Alice"])
            .limit(1)
            .unwrap()
            .unique()
            .unwrap_err();
        assert!(matches!(err, QueryError::TooManyResults { table: "users" }));

        let statements = executor.statements();
        assert_eq!(
            statements[0].sql,
            r#"SELECT * FROM "users" WHERE user_name = $1 LIMIT $2 OFFSET $3"#
        );
        assert_eq!(
            statements[0].values,
            vec![Value::from("Alice"), Value::from(2u64), Value::from(0u64)]
        );
    }

    #[test]
    fn test_fragment_arity_mismatch_is_reported_by_terminals() {
        let executor = MockExecutor::new();
        let chain = from(&executor).filter("age BETWEEN ? AND ?", [18]);
        assert!(matches!(chain.statement(), Err(QueryError::InvalidArgument(_))));
        assert!(matches!(chain.list(), Err(QueryError::InvalidArgument(_))));
        assert!(executor.statements().is_empty());
    }

    #[test]
    fn test_terminal_propagates_executor_error() {
        let executor = MockExecutor::new();
        executor.push_count_error(LifeError::Other("pool exhausted".to_string()));
        let err = from(&executor).filter("age > ?", [1]).count().unwrap_err();
        assert!(matches!(err, QueryError::Execution(LifeError::Other(_))));
    }
}
