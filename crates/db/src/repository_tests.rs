//! Repository tests against an in-memory SQLite store.
//!
//! Every test opens its own `sqlite::memory:` pool, so tests never share
//! rows.

use sqlx::FromRow;

use crate::entity::{Column, Entity, FieldValue, Identifiable, Insertable, Queryable};
use crate::models::{NewTichet, Tichet, TichetChange, TichetColumn};
use crate::pool::{create_pool, run_migrations};
use crate::repository::tichete::{
    delete_tichet_by_id_tichet, get_all_tichete_with_filters, get_tichet_by_id_tichet,
    insert_tichet, update_tichet,
};
use crate::repository::{
    delete_entity_by_identifier, get_all_entities, get_entity_by_identifier, insert_entity,
};
use crate::{DbError, DbPool, Filter, OperationStep, StoreConfig};

async fn store() -> DbPool {
    let pool = create_pool(&StoreConfig::new("sqlite::memory:"))
        .await
        .expect("in-memory pool");
    run_migrations(&pool).await.expect("migrations apply");
    pool
}

async fn seed(pool: &DbPool, draft: NewTichet) -> Tichet {
    insert_tichet(pool, draft).await.into_found().expect("seed insert")
}

async fn count(pool: &DbPool) -> usize {
    get_all_tichete_with_filters(pool, &Filter::all())
        .await
        .into_found()
        .expect("count")
        .len()
}

// ============================================================
// Ticket lifecycle
// ============================================================

#[tokio::test]
async fn open_update_close_delete_scenario() {
    let pool = store().await;

    let inserted = insert_tichet(&pool, NewTichet::new().status("open")).await;
    assert!(inserted.completed);
    assert!(inserted.error.is_none());
    let ticket = inserted.payload.expect("payload on completed insert");
    assert!(ticket.id_tichet > 0);
    assert_eq!(ticket.status, "open");

    let updated = update_tichet(
        &pool,
        ticket.id_tichet,
        vec![TichetChange::Status("closed".into())],
    )
    .await;
    assert!(updated.completed);
    let closed = updated.payload.expect("payload on completed update");
    assert_eq!(closed.id_tichet, ticket.id_tichet);
    assert_eq!(closed.status, "closed");

    let deleted = delete_tichet_by_id_tichet(&pool, ticket.id_tichet).await;
    assert!(deleted.completed);
    assert_eq!(deleted.payload.map(|t| t.status), Some("closed".to_string()));

    let fetched = get_tichet_by_id_tichet(&pool, ticket.id_tichet).await;
    assert!(!fetched.completed);
    assert!(fetched.error.is_none());
    assert!(fetched.payload.is_none());
}

#[tokio::test]
async fn inserted_ticket_reads_back_identically() {
    let pool = store().await;
    let ticket = seed(
        &pool,
        NewTichet::new()
            .status("open")
            .title("VPN drops")
            .description("every 20 minutes")
            .priority(3),
    )
    .await;

    let fetched = get_tichet_by_id_tichet(&pool, ticket.id_tichet)
        .await
        .into_found()
        .expect("ticket exists");
    assert_eq!(fetched, ticket);
    assert_eq!(fetched.title.as_deref(), Some("VPN drops"));
    assert_eq!(fetched.description.as_deref(), Some("every 20 minutes"));
    assert_eq!(fetched.priority, 3);
}

#[tokio::test]
async fn identifiers_are_generated_per_insert() {
    let pool = store().await;
    let a = seed(&pool, NewTichet::new().status("open")).await;
    let b = seed(&pool, NewTichet::new().status("open")).await;
    assert_ne!(a.id_tichet, b.id_tichet);
}

// ============================================================
// fetch-all
// ============================================================

#[tokio::test]
async fn filters_are_an_exact_match_conjunction() {
    let pool = store().await;
    let a = seed(&pool, NewTichet::new().status("open").priority(1)).await;
    let b = seed(&pool, NewTichet::new().status("open").priority(2).title("disk")).await;
    let c = seed(&pool, NewTichet::new().status("closed").priority(2)).await;

    let all = get_all_tichete_with_filters(&pool, &Filter::all())
        .await
        .into_found()
        .unwrap();
    assert_eq!(all, vec![a.clone(), b.clone(), c.clone()]);

    let open = get_all_tichete_with_filters(&pool, &Filter::all().eq(TichetColumn::Status, "open"))
        .await
        .into_found()
        .unwrap();
    assert_eq!(open, vec![a.clone(), b.clone()]);

    let open_p2 = get_all_tichete_with_filters(
        &pool,
        &Filter::all()
            .eq(TichetColumn::Status, "open")
            .eq(TichetColumn::Priority, 2),
    )
    .await
    .into_found()
    .unwrap();
    assert_eq!(open_p2, vec![b.clone()]);

    let untitled = get_all_tichete_with_filters(
        &pool,
        &Filter::all().eq(TichetColumn::Title, None::<String>),
    )
    .await
    .into_found()
    .unwrap();
    assert_eq!(untitled, vec![a, c]);
}

#[tokio::test]
async fn no_match_is_a_completed_empty_list() {
    let pool = store().await;
    seed(&pool, NewTichet::new().status("open")).await;

    let response =
        get_all_tichete_with_filters(&pool, &Filter::all().eq(TichetColumn::Status, "archived")).await;
    assert!(response.completed);
    assert_eq!(response.payload, Some(Vec::new()));
}

// ============================================================
// fetch-by-identifier
// ============================================================

#[tokio::test]
async fn missing_ticket_is_not_found_without_error() {
    let pool = store().await;
    let response = get_tichet_by_id_tichet(&pool, 404).await;
    assert!(response.is_not_found());
    assert!(response.payload.is_none());
}

#[tokio::test]
async fn lookup_by_any_column_returns_first_match() {
    let pool = store().await;
    let first = seed(&pool, NewTichet::new().status("open").title("first")).await;
    seed(&pool, NewTichet::new().status("open").title("second")).await;

    let found = get_entity_by_identifier::<Tichet>(&pool, TichetColumn::Status, "open")
        .await
        .into_found()
        .unwrap();
    assert_eq!(found, first);
}

// ============================================================
// update
// ============================================================

#[tokio::test]
async fn update_touches_only_the_given_fields() {
    let pool = store().await;
    let ticket = seed(
        &pool,
        NewTichet::new().status("open").title("printer").description("jam").priority(1),
    )
    .await;

    let updated = update_tichet(
        &pool,
        ticket.id_tichet,
        vec![TichetChange::Priority(5), TichetChange::Description(None)],
    )
    .await
    .into_found()
    .unwrap();

    assert_eq!(updated.priority, 5);
    assert_eq!(updated.description, None);
    assert_eq!(updated.title, ticket.title);
    assert_eq!(updated.status, ticket.status);
    assert_eq!(updated.created_at, ticket.created_at);

    let stored = get_tichet_by_id_tichet(&pool, ticket.id_tichet)
        .await
        .into_found()
        .unwrap();
    assert_eq!(stored, updated);
}

#[tokio::test]
async fn empty_update_returns_the_record_unchanged() {
    let pool = store().await;
    let ticket = seed(&pool, NewTichet::new().status("open")).await;

    let response = update_tichet(&pool, ticket.id_tichet, Vec::new()).await;
    assert!(response.completed);
    assert_eq!(response.payload, Some(ticket));
}

#[tokio::test]
async fn updating_a_missing_ticket_is_not_found() {
    let pool = store().await;
    let response = update_tichet(&pool, 9, vec![TichetChange::Status("closed".into())]).await;
    assert!(response.is_not_found());
}

#[tokio::test]
async fn update_rejected_by_constraint_leaves_record_unchanged() {
    let pool = store().await;
    let ticket = seed(&pool, NewTichet::new().status("open").title("keep me")).await;

    let response = update_tichet(
        &pool,
        ticket.id_tichet,
        vec![
            TichetChange::Title(Some("lost".into())),
            TichetChange::Status(String::new()),
        ],
    )
    .await;
    assert!(!response.completed);
    assert!(response.payload.is_none());
    assert_eq!(
        response.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Update)
    );

    let stored = get_tichet_by_id_tichet(&pool, ticket.id_tichet)
        .await
        .into_found()
        .unwrap();
    assert_eq!(stored, ticket);
}

// ============================================================
// insert
// ============================================================

#[tokio::test]
async fn draft_without_status_is_reported_not_raised() {
    let pool = store().await;
    let response = insert_tichet(&pool, NewTichet::new().title("no status")).await;
    assert!(!response.completed);
    assert!(matches!(
        response.error,
        Some(DbError::InvalidAttributes { entity: "tichete", .. })
    ));
    assert_eq!(count(&pool).await, 0);
}

#[tokio::test]
async fn insert_rejected_by_constraint_writes_nothing() {
    let pool = store().await;
    let response = insert_tichet(&pool, NewTichet::new().status("")).await;
    assert!(!response.completed);
    assert_eq!(
        response.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Insert)
    );
    assert_eq!(count(&pool).await, 0);
}

// ============================================================
// delete
// ============================================================

#[tokio::test]
async fn deleting_a_missing_ticket_is_not_found() {
    let pool = store().await;
    seed(&pool, NewTichet::new().status("open")).await;

    let response = delete_tichet_by_id_tichet(&pool, 77).await;
    assert!(!response.completed);
    assert!(response.error.is_none());
    assert_eq!(count(&pool).await, 1);
}

#[tokio::test]
async fn delete_removes_only_the_target() {
    let pool = store().await;
    let keep = seed(&pool, NewTichet::new().status("open")).await;
    let gone = seed(&pool, NewTichet::new().status("open")).await;

    assert!(delete_tichet_by_id_tichet(&pool, gone.id_tichet).await.completed);
    let remaining = get_all_tichete_with_filters(&pool, &Filter::all())
        .await
        .into_found()
        .unwrap();
    assert_eq!(remaining, vec![keep]);
}

// ============================================================
// Store failures
// ============================================================

#[tokio::test]
async fn missing_table_is_captured_as_query_failure() {
    let pool = create_pool(&StoreConfig::new("sqlite::memory:")).await.unwrap();

    let response = get_all_tichete_with_filters(&pool, &Filter::all()).await;
    assert!(!response.completed);
    assert!(response.payload.is_none());
    assert_eq!(
        response.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Query)
    );

    let response = get_tichet_by_id_tichet(&pool, 1).await;
    assert!(!response.is_not_found());
    assert_eq!(
        response.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Query)
    );
}

#[tokio::test]
async fn closed_pool_is_captured_as_begin_failure() {
    let pool = store().await;
    pool.close().await;

    let begin_failed = |error: Option<&DbError>| error.and_then(DbError::step) == Some(OperationStep::Begin);

    let response = insert_tichet(&pool, NewTichet::new().status("open")).await;
    assert!(!response.completed);
    assert!(begin_failed(response.error.as_ref()));

    let response = get_all_tichete_with_filters(&pool, &Filter::all()).await;
    assert!(!response.completed);
    assert!(response.payload.is_none());
    assert!(begin_failed(response.error.as_ref()));

    let response = get_tichet_by_id_tichet(&pool, 1).await;
    assert!(!response.completed);
    assert!(begin_failed(response.error.as_ref()));

    let response = update_tichet(&pool, 1, vec![TichetChange::Status("closed".into())]).await;
    assert!(!response.completed);
    assert!(begin_failed(response.error.as_ref()));

    let response = delete_tichet_by_id_tichet(&pool, 1).await;
    assert!(!response.completed);
    assert!(begin_failed(response.error.as_ref()));
}

#[tokio::test]
async fn failed_delete_statement_keeps_the_row() {
    let pool = store().await;
    let ticket = seed(&pool, NewTichet::new().status("open")).await;
    sqlx::query(
        "CREATE TRIGGER tichete_locked BEFORE DELETE ON tichete \
         BEGIN SELECT RAISE(ABORT, 'tickets are locked'); END",
    )
    .execute(&pool)
    .await
    .unwrap();

    let response = delete_tichet_by_id_tichet(&pool, ticket.id_tichet).await;
    assert!(!response.completed);
    assert!(response.payload.is_none());
    assert_eq!(
        response.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Delete)
    );
    assert_eq!(count(&pool).await, 1);
}

/// A deferred foreign key lets the DELETE run and only fails at COMMIT, so
/// the rollback has a real write to undo.
#[tokio::test]
async fn failed_commit_undoes_the_delete() {
    let pool = store().await;
    let ticket = seed(&pool, NewTichet::new().status("open")).await;
    sqlx::query(
        "CREATE TABLE watchers (\
             id INTEGER PRIMARY KEY, \
             tichet_id INTEGER NOT NULL \
                 REFERENCES tichete (idTichet) DEFERRABLE INITIALLY DEFERRED)",
    )
    .execute(&pool)
    .await
    .unwrap();
    sqlx::query("INSERT INTO watchers (tichet_id) VALUES (?)")
        .bind(ticket.id_tichet)
        .execute(&pool)
        .await
        .unwrap();

    let response = delete_tichet_by_id_tichet(&pool, ticket.id_tichet).await;
    assert!(!response.completed);
    assert!(response.payload.is_none());
    assert_eq!(
        response.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Commit)
    );

    let stored = get_tichet_by_id_tichet(&pool, ticket.id_tichet)
        .await
        .into_found()
        .unwrap();
    assert_eq!(stored, ticket);
}

// ============================================================
// A second entity through the same generic operations
// ============================================================

#[derive(Debug, Clone, PartialEq, FromRow)]
struct Label {
    code: String,
    name: String,
}

#[derive(Debug, Clone, Copy)]
enum LabelColumn {
    Code,
    Name,
}

impl Column for LabelColumn {
    fn name(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Name => "name",
        }
    }
}

impl Entity for Label {
    const TABLE: &'static str = "labels";
    const COLUMNS: &'static [&'static str] = &["code", "name"];
}

impl Queryable for Label {
    type Column = LabelColumn;
}

impl Identifiable for Label {
    type Id = String;

    fn id_column() -> LabelColumn {
        LabelColumn::Code
    }

    fn id(&self) -> &String {
        &self.code
    }
}

impl Insertable for Label {
    type Entity = Label;

    fn into_values(self) -> Result<Vec<(&'static str, FieldValue)>, DbError> {
        Ok(vec![("code", self.code.into()), ("name", self.name.into())])
    }
}

#[tokio::test]
async fn generic_operations_work_for_text_identifiers() {
    let pool = store().await;
    sqlx::query("CREATE TABLE labels (code TEXT PRIMARY KEY, name TEXT NOT NULL)")
        .execute(&pool)
        .await
        .unwrap();

    let bug = Label { code: "bug".into(), name: "Bug".into() };
    let inserted = insert_entity(&pool, bug.clone()).await.into_found().unwrap();
    assert_eq!(inserted, bug);
    insert_entity(&pool, Label { code: "ops".into(), name: "Operations".into() })
        .await
        .into_found()
        .unwrap();

    let by_name = get_entity_by_identifier::<Label>(&pool, LabelColumn::Name, "Bug")
        .await
        .into_found()
        .unwrap();
    assert_eq!(by_name, bug);

    let duplicate = insert_entity(&pool, bug.clone()).await;
    assert_eq!(
        duplicate.error.as_ref().and_then(DbError::step),
        Some(OperationStep::Insert)
    );

    let deleted = delete_entity_by_identifier::<Label>(&pool, LabelColumn::Code, "bug").await;
    assert!(deleted.completed);

    let remaining = get_all_entities::<Label>(&pool, &Filter::all()).await.into_found().unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].code, "ops");
}
