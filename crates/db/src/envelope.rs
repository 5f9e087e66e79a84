//! The uniform result envelope returned by every repository operation.

use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::DbError;

/// Outcome of one unit of work.
///
/// Only three shapes exist:
///
/// | shape | `completed` | `payload` | `error` |
/// |-------|-------------|-----------|---------|
/// | done | `true` | `Some` | `None` |
/// | not found | `false` | `None` | `None` |
/// | failed (rolled back) | `false` | `None` | `Some` |
///
/// Always check [`OperationResponse::completed`] before trusting the payload.
#[derive(Debug)]
pub struct OperationResponse<T> {
    pub payload: Option<T>,
    pub error: Option<DbError>,
    pub completed: bool,
}

impl<T> OperationResponse<T> {
    pub fn completed(payload: T) -> Self {
        Self {
            payload: Some(payload),
            error: None,
            completed: true,
        }
    }

    pub fn not_found() -> Self {
        Self {
            payload: None,
            error: None,
            completed: false,
        }
    }

    pub fn failed(error: DbError) -> Self {
        Self {
            payload: None,
            error: Some(error),
            completed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// `true` when the operation ran cleanly but matched nothing.
    pub fn is_not_found(&self) -> bool {
        !self.completed && self.error.is_none()
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> OperationResponse<U> {
        OperationResponse {
            payload: self.payload.map(f),
            error: self.error,
            completed: self.completed,
        }
    }

    /// Collapse into a `Result`, reporting absence as [`DbError::NotFound`].
    pub fn into_found(self) -> Result<T, DbError> {
        match (self.payload, self.error) {
            (_, Some(err)) => Err(err),
            (Some(payload), None) if self.completed => Ok(payload),
            _ => Err(DbError::NotFound),
        }
    }
}

impl<T: Serialize> Serialize for OperationResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OperationResponse", 3)?;
        state.serialize_field("payload", &self.payload)?;
        state.serialize_field("error", &self.error.as_ref().map(ToString::to_string))?;
        state.serialize_field("completed", &self.completed)?;
        state.end()
    }
}
