//! `tichet-db` — ticket persistence layer.
//!
//! Provides the SQLite connection pool, the entity capability traits, a
//! generic repository whose every operation answers with an
//! [`OperationResponse`] envelope, and the `Tichet` model with its
//! convenience wrappers. No business logic lives here.

pub mod entity;
pub mod envelope;
pub mod error;
pub mod models;
pub mod pool;
pub mod query;
pub mod repository;

pub use entity::FieldValue;
pub use envelope::OperationResponse;
pub use error::{DbError, OperationStep};
pub use pool::{DbPool, StoreConfig};
pub use query::Filter;

#[cfg(test)]
mod repository_tests;
