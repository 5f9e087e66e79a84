//! Capability traits every persisted record type implements.
//!
//! The generic repository never looks up tables or columns by name at
//! runtime: an entity states its table and columns through [`Entity`], the
//! columns it can be filtered on through [`Queryable`], its identifier through
//! [`Identifiable`] and the fields it accepts in a partial update through
//! [`Updatable`]. New rows are described by an [`Insertable`] draft.

use std::fmt;

use sqlx::sqlite::SqliteRow;
use sqlx::FromRow;

use crate::DbError;

/// A value bound into a statement: filter operand, identifier or attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Bool(bool),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Integer(v.into())
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

/// A named column of some entity's table.
pub trait Column: Copy + fmt::Debug + Send + Sync + 'static {
    fn name(self) -> &'static str;
}

/// A record type backed by one table.
pub trait Entity: for<'r> FromRow<'r, SqliteRow> + Send + Unpin + 'static {
    /// Table holding the records.
    const TABLE: &'static str;
    /// Every column, in the order rows are selected.
    const COLUMNS: &'static [&'static str];
}

/// An entity whose records can be filtered by column.
pub trait Queryable: Entity {
    type Column: Column;
}

/// An entity with a unique identifier column.
pub trait Identifiable: Queryable {
    type Id: Clone + Into<FieldValue> + fmt::Debug + Send + Sync;

    fn id_column() -> Self::Column;
    fn id(&self) -> &Self::Id;
}

/// A single field assignment applied by a partial update.
pub trait Assignment: Send {
    fn into_assignment(self) -> (&'static str, FieldValue);
}

/// An entity that accepts partial updates.
pub trait Updatable: Identifiable {
    type Change: Assignment;
}

/// A description of a new record, turned into its column/value list when
/// the insert runs.
pub trait Insertable: Send {
    type Entity: Identifiable;

    fn into_values(self) -> Result<Vec<(&'static str, FieldValue)>, DbError>;
}
