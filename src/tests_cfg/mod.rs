//! Test entities shared by the unit tests.

use crate::executor::LifeError;
use crate::mapping::{EntityMapping, MappedEntity};
use crate::mock::MockRow;
use crate::query::FromRow;
use fake::Dummy;
use once_cell::sync::Lazy;

#[derive(Debug, Clone, PartialEq, Dummy)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub age: i64,
}

static USER_MAPPING: Lazy<EntityMapping> = Lazy::new(|| {
    EntityMapping::builder("User", "users")
        .id("id", "id")
        .column("name", "user_name")
        .nullable("email", "email_address")
        .column("age", "age")
        .build()
});

impl MappedEntity for User {
    fn mapping() -> &'static EntityMapping {
        &USER_MAPPING
    }
}

impl FromRow<MockRow> for User {
    fn from_row(row: &MockRow) -> Result<Self, LifeError> {
        Ok(User {
            id: row.get_i64("id")?,
            name: row.get_string("user_name")?,
            email: row.get_opt_string("email_address")?,
            age: row.get_i64("age")?,
        })
    }
}

impl User {
    pub fn to_row(&self) -> MockRow {
        MockRow::new()
            .with("id", self.id)
            .with("user_name", self.name.clone())
            .with("email_address", self.email.clone())
            .with("age", self.age)
    }
}

pub fn user_row(id: i64, name: &str, age: i64) -> MockRow {
    MockRow::new()
        .with("id", id)
        .with("user_name", name)
        .with("email_address", format!("{}@example.com", name.to_lowercase()))
        .with("age", age)
}
