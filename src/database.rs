//! Entry point for criteria chains.

use crate::config::DatabaseConfig;
use crate::executor::LifeExecutor;
use crate::mapping::MappedEntity;
use crate::query::stages::From;
use crate::query::{Criteria, QueryError};

/// Owns an executor and starts criteria chains against it
///
/// ```no_run
/// use lifeguard_criteria::{connection, Database, DatabaseConfig};
///
/// let config = DatabaseConfig::load().expect("config");
/// let executor = connection::connect_executor(&config).expect("connect");
/// let db = Database::with_config(executor, &config);
/// ```
pub struct Database<Ex> {
    executor: Ex,
    default_items_per_page: i64,
}

impl<Ex: LifeExecutor> Database<Ex> {
    pub fn new(executor: Ex) -> Self {
        Self::with_config(executor, &DatabaseConfig::default())
    }

    pub fn with_config(executor: Ex, config: &DatabaseConfig) -> Self {
        Self {
            executor,
            default_items_per_page: config.default_items_per_page,
        }
    }

    pub fn executor(&self) -> &Ex {
        &self.executor
    }

    /// Start a chain selecting every column of `T`.
    pub fn from<T: MappedEntity>(&self) -> From<'_, T, Ex> {
        From::new(
            Criteria::new(&self.executor).with_default_items_per_page(self.default_items_per_page),
        )
    }

    /// Start a chain selecting only `properties`; finish it with [`Select::from`].
    pub fn select<S: AsRef<str>>(&self, properties: &[S]) -> Select<'_, Ex> {
        Select {
            db: self,
            properties: properties.iter().map(|p| p.as_ref().to_string()).collect(),
        }
    }
}

/// Pending column selection, resolved against the entity passed to [`from`](Self::from)
pub struct Select<'e, Ex> {
    db: &'e Database<Ex>,
    properties: Vec<String>,
}

impl<'e, Ex: LifeExecutor> Select<'e, Ex> {
    /// # Errors
    ///
    /// Returns `QueryError::InvalidProperty` for the first property `T` does not map.
    pub fn from<T: MappedEntity>(self) -> Result<From<'e, T, Ex>, QueryError> {
        let criteria = Criteria::with_selection(&self.db.executor, &self.properties)?
            .with_default_items_per_page(self.db.default_items_per_page);
        Ok(From::new(criteria))
    }
}
