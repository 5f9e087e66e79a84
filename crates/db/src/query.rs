//! Statement builders for the generic repository.
//!
//! Every statement is assembled with [`sqlx::QueryBuilder`] from the
//! entity's declared table and columns; values are always bound, never
//! interpolated.

use sqlx::{QueryBuilder, Sqlite};

use crate::entity::{Column, Entity, FieldValue, Identifiable};

/// An exact-match conjunction of `(column, value)` pairs.
///
/// ```ignore
/// let open_urgent = Filter::all()
///     .eq(TichetColumn::Status, "open")
///     .eq(TichetColumn::Priority, 3);
/// ```
#[derive(Debug, Clone)]
pub struct Filter<C: Column> {
    conditions: Vec<(C, FieldValue)>,
}

impl<C: Column> Filter<C> {
    /// A filter matching every record.
    pub fn all() -> Self {
        Self { conditions: Vec::new() }
    }

    /// Require `column == value`. A `Null` value matches `IS NULL`.
    pub fn eq(mut self, column: C, value: impl Into<FieldValue>) -> Self {
        self.conditions.push((column, value.into()));
        self
    }

    pub fn conditions(&self) -> &[(C, FieldValue)] {
        &self.conditions
    }
}

impl<C: Column> Default for Filter<C> {
    fn default() -> Self {
        Self::all()
    }
}

pub(crate) type Statement = QueryBuilder<'static, Sqlite>;

fn quote(ident: &str) -> String {
    format!("\"{ident}\"")
}

fn column_list(columns: &[&str]) -> String {
    columns.iter().map(|c| quote(c)).collect::<Vec<_>>().join(", ")
}

fn push_value(qb: &mut Statement, value: FieldValue) {
    match value {
        FieldValue::Null       => qb.push_bind(None::<String>),
        FieldValue::Integer(v) => qb.push_bind(v),
        FieldValue::Real(v)    => qb.push_bind(v),
        FieldValue::Text(v)    => qb.push_bind(v),
        FieldValue::Bool(v)    => qb.push_bind(v),
    };
}

fn push_condition(qb: &mut Statement, column: &str, value: FieldValue) {
    qb.push(quote(column));
    if value.is_null() {
        qb.push(" IS NULL");
    } else {
        qb.push(" = ");
        push_value(qb, value);
    }
}

fn push_returning<E: Entity>(qb: &mut Statement) {
    qb.push(" RETURNING ");
    qb.push(column_list(E::COLUMNS));
}

/// `SELECT … WHERE <filter> ORDER BY <id>`
pub(crate) fn select_matching<E: Identifiable>(filter: &Filter<E::Column>) -> Statement {
    let mut qb = QueryBuilder::new(format!(
        "SELECT {} FROM {}",
        column_list(E::COLUMNS),
        quote(E::TABLE)
    ));
    for (idx, (column, value)) in filter.conditions().iter().enumerate() {
        qb.push(if idx == 0 { " WHERE " } else { " AND " });
        push_condition(&mut qb, column.name(), value.clone());
    }
    qb.push(" ORDER BY ");
    qb.push(quote(E::id_column().name()));
    qb
}

/// First record, by identifier, where `column == value`.
pub(crate) fn select_first<E: Identifiable>(column: E::Column, value: FieldValue) -> Statement {
    let mut qb = select_matching::<E>(&Filter::all().eq(column, value));
    qb.push(" LIMIT 1");
    qb
}

/// `INSERT … RETURNING …`
pub(crate) fn insert<E: Entity>(values: Vec<(&'static str, FieldValue)>) -> Statement {
    let mut qb = QueryBuilder::new(format!("INSERT INTO {}", quote(E::TABLE)));
    if values.is_empty() {
        qb.push(" DEFAULT VALUES");
    } else {
        let names: Vec<&str> = values.iter().map(|(name, _)| *name).collect();
        qb.push(format!(" ({}) VALUES (", column_list(&names)));
        for (idx, (_, value)) in values.into_iter().enumerate() {
            if idx > 0 {
                qb.push(", ");
            }
            push_value(&mut qb, value);
        }
        qb.push(")");
    }
    push_returning::<E>(&mut qb);
    qb
}

/// `UPDATE … SET … WHERE <id> = ? RETURNING …`
///
/// `assignments` must not be empty.
pub(crate) fn update<E: Identifiable>(
    id: FieldValue,
    assignments: Vec<(&'static str, FieldValue)>,
) -> Statement {
    let mut qb = QueryBuilder::new(format!("UPDATE {} SET ", quote(E::TABLE)));
    for (idx, (column, value)) in assignments.into_iter().enumerate() {
        if idx > 0 {
            qb.push(", ");
        }
        qb.push(quote(column));
        qb.push(" = ");
        push_value(&mut qb, value);
    }
    qb.push(" WHERE ");
    push_condition(&mut qb, E::id_column().name(), id);
    push_returning::<E>(&mut qb);
    qb
}

/// `DELETE … WHERE <id> = ?`
pub(crate) fn delete<E: Identifiable>(id: FieldValue) -> Statement {
    let mut qb = QueryBuilder::new(format!("DELETE FROM {} WHERE ", quote(E::TABLE)));
    push_condition(&mut qb, E::id_column().name(), id);
    qb
}
