//! Criteria queries for mapped entities.
//!
//! This module provides the criteria query builder: a single-table SELECT with raw
//! WHERE/ORDER BY fragments, a LIMIT/OFFSET window, COUNT, and paging.
//!
//! # Architecture
//!
//! - **Criteria**: query state and SQL assembly on sea-query (`Criteria`, `Statement`)
//! - **Fragment**: `?` fragments and ORDER BY clauses translated for sea-query's
//!   PostgreSQL renderer
//! - **Stages**: the fluent chain (`From`, `Where`, `OrderBy`, `Limit`) and the
//!   `Terminal` operations every stage shares
//! - **Page**: paging metadata and the `PageResult` envelope
//! - **Traits**: `FromRow` row materialization
//! - **Value Conversion**: SeaQuery `Value` to `ToSql` parameter conversion
//! - **Error**: `QueryError`

pub mod criteria;
#[doc(inline)]
pub use criteria::{Criteria, Statement, Window};

pub mod error;
#[doc(inline)]
pub use error::QueryError;

pub mod page;
#[doc(inline)]
pub use page::{Page, PageResult, DEFAULT_ITEMS_PER_PAGE};

pub mod stages;
#[doc(inline)]
pub use stages::Terminal;

pub mod traits;
#[doc(inline)]
pub use traits::FromRow;

pub(crate) mod fragment;

// Value conversion utilities
pub(crate) mod value_conversion;
