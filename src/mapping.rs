//! Entity mappings and property-to-column resolution.
//!
//! Each entity type registers one [`EntityMapping`] (usually in a `Lazy` static) that
//! names its table and maps every symbolic property to a physical column. Mappings
//! are immutable once built and shared by every query against that type.
//!
//! # Example
//!
//! ```
//! use lifeguard_criteria::{EntityMapping, MappedEntity};
//! use once_cell::sync::Lazy;
//!
//! struct User;
//!
//! static USER: Lazy<EntityMapping> = Lazy::new(|| {
//!     EntityMapping::builder("User", "users")
//!         .id("id", "id")
//!         .column("name", "user_name")
//!         .nullable("email", "email")
//!         .build()
//! });
//!
//! impl MappedEntity for User {
//!     fn mapping() -> &'static EntityMapping {
//!         &USER
//!     }
//! }
//!
//! assert_eq!(User::mapping().column_for("name").unwrap(), "user_name");
//! ```

use crate::query::QueryError;
use std::collections::HashMap;

/// Selection token that always passes through resolution unchanged.
pub const SELECT_ALL: &str = "*";

/// Role a column plays in the entity's key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyRole {
    /// Plain data column
    None,
    /// Part of the primary key
    Primary,
}

/// One mapped property
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    pub property: &'static str,
    pub column: &'static str,
    pub nullable: bool,
    pub key: KeyRole,
}

/// Table name plus property -> column descriptors for one entity type
#[derive(Debug, Clone)]
pub struct EntityMapping {
    entity: &'static str,
    table: &'static str,
    columns: Vec<ColumnDescriptor>,
    by_property: HashMap<&'static str, usize>,
}

impl EntityMapping {
    /// Start registering the mapping for `entity`, stored in `table`.
    pub fn builder(entity: &'static str, table: &'static str) -> EntityMappingBuilder {
        EntityMappingBuilder {
            entity,
            table,
            columns: Vec::new(),
        }
    }

    pub fn entity_name(&self) -> &'static str {
        self.entity
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Descriptors in registration order
    pub fn columns(&self) -> &[ColumnDescriptor] {
        &self.columns
    }

    pub fn property(&self, property: &str) -> Option<&ColumnDescriptor> {
        self.by_property.get(property).map(|&i| &self.columns[i])
    }

    pub fn primary_key(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| c.key == KeyRole::Primary)
    }

    /// Resolve a symbolic property name to its column name.
    ///
    /// `"*"` resolves to itself without lookup.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidProperty` if the property is not mapped.
    pub fn column_for(&self, property: &str) -> Result<&'static str, QueryError> {
        if property == SELECT_ALL {
            return Ok(SELECT_ALL);
        }
        self.property(property)
            .map(|c| c.column)
            .ok_or_else(|| QueryError::InvalidProperty {
                entity: self.entity,
                property: property.to_string(),
            })
    }

    /// Resolve a selection list in order, stopping at the first unknown property.
    ///
    /// # Errors
    ///
    /// Returns `QueryError::InvalidProperty` naming the first unmapped entry.
    pub fn resolve_selection<S: AsRef<str>>(
        &self,
        properties: &[S],
    ) -> Result<Vec<&'static str>, QueryError> {
        properties
            .iter()
            .map(|p| self.column_for(p.as_ref()))
            .collect()
    }
}

/// Registration builder returned by [`EntityMapping::builder`]
///
/// Registering the same property twice replaces the earlier descriptor in place.
#[derive(Debug)]
pub struct EntityMappingBuilder {
    entity: &'static str,
    table: &'static str,
    columns: Vec<ColumnDescriptor>,
}

impl EntityMappingBuilder {
    /// Primary key column
    pub fn id(self, property: &'static str, column: &'static str) -> Self {
        self.descriptor(ColumnDescriptor {
            property,
            column,
            nullable: false,
            key: KeyRole::Primary,
        })
    }

    /// Non-null data column
    pub fn column(self, property: &'static str, column: &'static str) -> Self {
        self.descriptor(ColumnDescriptor {
            property,
            column,
            nullable: false,
            key: KeyRole::None,
        })
    }

    /// Nullable data column
    pub fn nullable(self, property: &'static str, column: &'static str) -> Self {
        self.descriptor(ColumnDescriptor {
            property,
            column,
            nullable: true,
            key: KeyRole::None,
        })
    }

    pub fn descriptor(mut self, descriptor: ColumnDescriptor) -> Self {
        match self
            .columns
            .iter_mut()
            .find(|c| c.property == descriptor.property)
        {
            Some(existing) => *existing = descriptor,
            None => self.columns.push(descriptor),
        }
        self
    }

    pub fn build(self) -> EntityMapping {
        let by_property = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, c)| (c.property, i))
            .collect();
        EntityMapping {
            entity: self.entity,
            table: self.table,
            columns: self.columns,
            by_property,
        }
    }
}

/// A type with a registered table and property mapping
pub trait MappedEntity: Sized {
    fn mapping() -> &'static EntityMapping;
}
