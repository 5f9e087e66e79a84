//! Typed error type for the db crate.

use std::fmt;

use thiserror::Error;

/// The step of a unit of work that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStep {
    Begin,
    Query,
    Insert,
    Update,
    Delete,
    Commit,
}

impl fmt::Display for OperationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin  => write!(f, "begin"),
            Self::Query  => write!(f, "query"),
            Self::Insert => write!(f, "insert"),
            Self::Update => write!(f, "update"),
            Self::Delete => write!(f, "delete"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// A guarded data-access step failed; the unit of work was rolled back.
    #[error("store operation failed during {step}: {source}")]
    StoreOperationFailed {
        step: OperationStep,
        #[source]
        source: sqlx::Error,
    },

    /// An insert descriptor could not be turned into a row.
    #[error("invalid attributes for {entity}: {reason}")]
    InvalidAttributes {
        entity: &'static str,
        reason: String,
    },

    #[error("row not found")]
    NotFound,

    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl DbError {
    /// The failed step, when this error came out of a unit of work.
    pub fn step(&self) -> Option<OperationStep> {
        match self {
            Self::StoreOperationFailed { step, .. } => Some(*step),
            _ => None,
        }
    }
}

/// Tags a raw `sqlx` failure with the step it happened in.
pub(crate) trait DuringStep<T> {
    fn during(self, step: OperationStep) -> Result<T, DbError>;
}

impl<T> DuringStep<T> for Result<T, sqlx::Error> {
    fn during(self, step: OperationStep) -> Result<T, DbError> {
        self.map_err(|source| DbError::StoreOperationFailed { step, source })
    }
}
