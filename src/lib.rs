//! # Lifeguard Criteria
//!
//! Fluent criteria queries over mapped entities for Lifeguard on the `may` runtime.
//!
//! A chain starts from a [`Database`], targets one [`MappedEntity`], optionally adds
//! raw WHERE fragments with bound `?` arguments, an ORDER BY clause and a LIMIT/OFFSET
//! window, and ends in a terminal: `list`, `first`, `unique`, `count` or `page`.
//!
//! ```no_run
//! use lifeguard_criteria::{values, Database, FromRow, LifeExecutor, PageResult, QueryError, Terminal};
//! # use lifeguard_criteria::{EntityMapping, MappedEntity};
//! # struct User;
//! # impl MappedEntity for User { fn mapping() -> &'static EntityMapping { todo!() } }
//!
//! fn active_users<Ex>(db: &Database<Ex>, page: i64) -> Result<PageResult<User>, QueryError>
//! where
//!     Ex: LifeExecutor,
//!     User: FromRow<Ex::Row>,
//! {
//!     db.select(&["id", "name", "email"])
//!         .from::<User>()?
//!         .filter("status = ? AND age >= ?", values!["active", 18])
//!         .order_by("id DESC")
//!         .page(page, 20)
//! }
//! ```
//!
//! WHERE and ORDER BY fragments are written into the SQL as written, apart from `?`
//! becoming `$n` and comments being dropped. Only developer-written text belongs there;
//! every value goes through the argument list.

pub mod config;
pub mod connection;
mod database;
pub mod executor;
#[macro_use]
mod macros;
pub mod mapping;
pub mod metrics;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod query;
#[cfg(test)]
mod tests_cfg;

pub use config::DatabaseConfig;
pub use database::{Database, Select};
pub use executor::{LifeError, LifeExecutor, MayPostgresExecutor};
pub use mapping::{ColumnDescriptor, EntityMapping, KeyRole, MappedEntity};
pub use query::{
    Criteria, FromRow, Page, PageResult, QueryError, Statement, Terminal, Window,
    DEFAULT_ITEMS_PER_PAGE,
};
pub use sea_query::Value;
