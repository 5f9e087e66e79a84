//! Row structs that map 1-to-1 onto database tables, plus the typed
//! descriptors used to filter, create and update them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::entity::{Assignment, Column, Entity, FieldValue, Identifiable, Insertable, Queryable, Updatable};
use crate::DbError;

// ---------------------------------------------------------------------------
// tichete
// ---------------------------------------------------------------------------

/// A persisted ticket row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tichet {
    #[sqlx(rename = "idTichet")]
    #[serde(rename = "idTichet")]
    pub id_tichet: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: String,
    pub priority: i64,
    pub created_at: DateTime<Utc>,
}

/// Columns of the `tichete` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TichetColumn {
    IdTichet,
    Title,
    Description,
    Status,
    Priority,
    CreatedAt,
}

impl Column for TichetColumn {
    fn name(self) -> &'static str {
        match self {
            Self::IdTichet    => "idTichet",
            Self::Title       => "title",
            Self::Description => "description",
            Self::Status      => "status",
            Self::Priority    => "priority",
            Self::CreatedAt   => "created_at",
        }
    }
}

impl Entity for Tichet {
    const TABLE: &'static str = "tichete";
    const COLUMNS: &'static [&'static str] =
        &["idTichet", "title", "description", "status", "priority", "created_at"];
}

impl Queryable for Tichet {
    type Column = TichetColumn;
}

impl Identifiable for Tichet {
    type Id = i64;

    fn id_column() -> TichetColumn {
        TichetColumn::IdTichet
    }

    fn id(&self) -> &i64 {
        &self.id_tichet
    }
}

/// One field of a partial ticket update. `None` clears an optional field.
#[derive(Debug, Clone, PartialEq)]
pub enum TichetChange {
    Title(Option<String>),
    Description(Option<String>),
    Status(String),
    Priority(i64),
}

impl Assignment for TichetChange {
    fn into_assignment(self) -> (&'static str, FieldValue) {
        match self {
            Self::Title(v)       => (TichetColumn::Title.name(), v.into()),
            Self::Description(v) => (TichetColumn::Description.name(), v.into()),
            Self::Status(v)      => (TichetColumn::Status.name(), v.into()),
            Self::Priority(v)    => (TichetColumn::Priority.name(), v.into()),
        }
    }
}

impl Updatable for Tichet {
    type Change = TichetChange;
}

/// Builder for a new ticket. `status` is required; everything else is
/// optional and `created_at` is stamped when the row is built.
#[derive(Debug, Clone, Default)]
pub struct NewTichet {
    title: Option<String>,
    description: Option<String>,
    status: Option<String>,
    priority: Option<i64>,
}

impl NewTichet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }
}

impl Insertable for NewTichet {
    type Entity = Tichet;

    fn into_values(self) -> Result<Vec<(&'static str, FieldValue)>, DbError> {
        let status = self.status.ok_or_else(|| DbError::InvalidAttributes {
            entity: Tichet::TABLE,
            reason: "missing required field `status`".to_string(),
        })?;

        let mut values = vec![(TichetColumn::Status.name(), status.into())];
        if let Some(title) = self.title {
            values.push((TichetColumn::Title.name(), title.into()));
        }
        if let Some(description) = self.description {
            values.push((TichetColumn::Description.name(), description.into()));
        }
        if let Some(priority) = self.priority {
            values.push((TichetColumn::Priority.name(), priority.into()));
        }
        values.push((TichetColumn::CreatedAt.name(), Utc::now().to_rfc3339().into()));
        Ok(values)
    }
}
