//! Generic entity repository.
//!
//! Every function takes the `&DbPool` store handle, runs exactly one unit of
//! work (a transaction) and returns an [`OperationResponse`]. Store failures
//! never escape: the transaction is rolled back and the error is carried in
//! the envelope. The entity is chosen by type parameter through the traits in
//! [`crate::entity`].

pub mod tichete;

use sqlx::{Sqlite, SqliteConnection, Transaction};
use tracing::{debug, info, instrument, warn};

use crate::entity::{Assignment, Entity, FieldValue, Identifiable, Insertable, Updatable};
use crate::error::{DuringStep, OperationStep};
use crate::query::{self, Filter};
use crate::{DbError, DbPool, OperationResponse};

// ---------------------------------------------------------------------------
// Unit of work
// ---------------------------------------------------------------------------

type UnitOfWork = Transaction<'static, Sqlite>;

async fn begin(pool: &DbPool) -> Result<UnitOfWork, DbError> {
    pool.begin().await.during(OperationStep::Begin)
}

async fn rollback(tx: UnitOfWork) {
    if let Err(e) = tx.rollback().await {
        warn!(error = %e, "rollback failed");
    }
}

/// Commit when the work produced a payload; roll back on absence or failure.
async fn finish<T>(tx: UnitOfWork, outcome: Result<Option<T>, DbError>) -> OperationResponse<T> {
    match outcome {
        Ok(Some(payload)) => match tx.commit().await.during(OperationStep::Commit) {
            Ok(()) => OperationResponse::completed(payload),
            Err(err) => {
                warn!(error = %err, "commit failed");
                OperationResponse::failed(err)
            }
        },
        Ok(None) => {
            rollback(tx).await;
            OperationResponse::not_found()
        }
        Err(err) => {
            warn!(error = %err, "unit of work failed, rolling back");
            rollback(tx).await;
            OperationResponse::failed(err)
        }
    }
}

async fn find_first<E: Identifiable>(
    conn: &mut SqliteConnection,
    column: E::Column,
    value: FieldValue,
) -> Result<Option<E>, DbError> {
    let mut stmt = query::select_first::<E>(column, value);
    debug!(sql = stmt.sql(), "looking up record");
    stmt.build_query_as::<E>()
        .fetch_optional(&mut *conn)
        .await
        .during(OperationStep::Query)
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// Every record matching `filter` (all records for an empty filter),
/// ordered by identifier.
#[instrument(skip_all, fields(table = E::TABLE, conditions = filter.conditions().len()))]
pub async fn get_all_entities<E: Identifiable>(
    pool: &DbPool,
    filter: &Filter<E::Column>,
) -> OperationResponse<Vec<E>> {
    let mut tx = match begin(pool).await {
        Ok(tx) => tx,
        Err(err) => return OperationResponse::failed(err),
    };

    let mut stmt = query::select_matching::<E>(filter);
    debug!(sql = stmt.sql(), "fetching records");
    let outcome = stmt
        .build_query_as::<E>()
        .fetch_all(&mut *tx)
        .await
        .during(OperationStep::Query)
        .map(Some);

    finish(tx, outcome).await
}

/// First record (lowest identifier) where `column == value`.
#[instrument(skip_all, fields(table = E::TABLE, column = ?column))]
pub async fn get_entity_by_identifier<E: Identifiable>(
    pool: &DbPool,
    column: E::Column,
    value: impl Into<FieldValue>,
) -> OperationResponse<E> {
    let mut tx = match begin(pool).await {
        Ok(tx) => tx,
        Err(err) => return OperationResponse::failed(err),
    };

    let outcome = find_first::<E>(&mut *tx, column, value.into()).await;
    finish(tx, outcome).await
}

/// Delete the first record where `column == value`. The deleted record is
/// returned as payload.
#[instrument(skip_all, fields(table = E::TABLE, column = ?column))]
pub async fn delete_entity_by_identifier<E: Identifiable>(
    pool: &DbPool,
    column: E::Column,
    value: impl Into<FieldValue>,
) -> OperationResponse<E> {
    let mut tx = match begin(pool).await {
        Ok(tx) => tx,
        Err(err) => return OperationResponse::failed(err),
    };

    let outcome = delete_first::<E>(&mut *tx, column, value.into()).await;
    let response = finish(tx, outcome).await;
    if let Some(deleted) = &response.payload {
        info!(id = ?deleted.id(), "record deleted");
    }
    response
}

async fn delete_first<E: Identifiable>(
    conn: &mut SqliteConnection,
    column: E::Column,
    value: FieldValue,
) -> Result<Option<E>, DbError> {
    let Some(record) = find_first::<E>(conn, column, value).await? else {
        return Ok(None);
    };

    let mut stmt = query::delete::<E>(record.id().clone().into());
    debug!(sql = stmt.sql(), "deleting record");
    stmt.build()
        .execute(&mut *conn)
        .await
        .during(OperationStep::Delete)?;

    Ok(Some(record))
}

/// Apply `changes` to the first record where `column == value` and return
/// the full updated record. Fields without a change are left untouched.
#[instrument(skip_all, fields(table = E::TABLE, column = ?column, changes = changes.len()))]
pub async fn update_entity_by_identifier<E: Updatable>(
    pool: &DbPool,
    column: E::Column,
    value: impl Into<FieldValue>,
    changes: Vec<E::Change>,
) -> OperationResponse<E> {
    let mut tx = match begin(pool).await {
        Ok(tx) => tx,
        Err(err) => return OperationResponse::failed(err),
    };

    let outcome = update_first::<E>(&mut *tx, column, value.into(), changes).await;
    let response = finish(tx, outcome).await;
    if let Some(updated) = &response.payload {
        info!(id = ?updated.id(), "record updated");
    }
    response
}

async fn update_first<E: Updatable>(
    conn: &mut SqliteConnection,
    column: E::Column,
    value: FieldValue,
    changes: Vec<E::Change>,
) -> Result<Option<E>, DbError> {
    let Some(current) = find_first::<E>(conn, column, value).await? else {
        return Ok(None);
    };
    if changes.is_empty() {
        return Ok(Some(current));
    }

    let assignments = changes.into_iter().map(Assignment::into_assignment).collect();
    let mut stmt = query::update::<E>(current.id().clone().into(), assignments);
    debug!(sql = stmt.sql(), "updating record");
    let updated = stmt
        .build_query_as::<E>()
        .fetch_one(&mut *conn)
        .await
        .during(OperationStep::Update)?;

    Ok(Some(updated))
}

/// Build a record from `draft`, insert it and return it as stored
/// (generated identifier included).
///
/// A draft that cannot be turned into a row is reported in the envelope as
/// [`DbError::InvalidAttributes`]; nothing is written.
#[instrument(skip_all, fields(table = <D::Entity as Entity>::TABLE))]
pub async fn insert_entity<D: Insertable>(pool: &DbPool, draft: D) -> OperationResponse<D::Entity> {
    let values = match draft.into_values() {
        Ok(values) => values,
        Err(err) => {
            warn!(error = %err, "rejected insert");
            return OperationResponse::failed(err);
        }
    };

    let mut tx = match begin(pool).await {
        Ok(tx) => tx,
        Err(err) => return OperationResponse::failed(err),
    };

    let mut stmt = query::insert::<D::Entity>(values);
    debug!(sql = stmt.sql(), "inserting record");
    let outcome = stmt
        .build_query_as::<D::Entity>()
        .fetch_one(&mut *tx)
        .await
        .during(OperationStep::Insert)
        .map(Some);

    let response = finish(tx, outcome).await;
    if let Some(inserted) = &response.payload {
        info!(id = ?inserted.id(), "record inserted");
    }
    response
}
