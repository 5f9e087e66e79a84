//! Ticket convenience wrappers.
//!
//! Each function binds the generic repository to [`Tichet`] and its
//! `idTichet` identifier column; nothing else happens here.

use crate::models::{NewTichet, Tichet, TichetChange, TichetColumn};
use crate::query::Filter;
use crate::{DbPool, OperationResponse};

use super::{
    delete_entity_by_identifier, get_all_entities, get_entity_by_identifier, insert_entity,
    update_entity_by_identifier,
};

/// Fetch a ticket by its `idTichet`.
pub async fn get_tichet_by_id_tichet(pool: &DbPool, id_tichet: i64) -> OperationResponse<Tichet> {
    get_entity_by_identifier::<Tichet>(pool, TichetColumn::IdTichet, id_tichet).await
}

/// All tickets matching `filter`; pass `Filter::all()` for every ticket.
pub async fn get_all_tichete_with_filters(
    pool: &DbPool,
    filter: &Filter<TichetColumn>,
) -> OperationResponse<Vec<Tichet>> {
    get_all_entities::<Tichet>(pool, filter).await
}

/// Apply a partial update to the ticket with the given `idTichet`.
pub async fn update_tichet(
    pool: &DbPool,
    id_tichet: i64,
    changes: Vec<TichetChange>,
) -> OperationResponse<Tichet> {
    update_entity_by_identifier::<Tichet>(pool, TichetColumn::IdTichet, id_tichet, changes).await
}

/// Delete the ticket with the given `idTichet`.
pub async fn delete_tichet_by_id_tichet(pool: &DbPool, id_tichet: i64) -> OperationResponse<Tichet> {
    delete_entity_by_identifier::<Tichet>(pool, TichetColumn::IdTichet, id_tichet).await
}

/// Create a ticket.
pub async fn insert_tichet(pool: &DbPool, draft: NewTichet) -> OperationResponse<Tichet> {
    insert_entity(pool, draft).await
}
