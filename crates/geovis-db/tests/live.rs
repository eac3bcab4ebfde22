//! Live integration tests for geovis-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/geovis-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use geovis_core::CollectorResultStatus::{self, Completed, Failed, Pending, Processing, Running};
use geovis_db::{
    create_collector_result, get_collector_result, get_collector_result_by_execution,
    list_score_rows_for_query, transition_collector_result, transition_collector_result_from,
    upsert_score_row, DbError, TransitionContext, TransitionFields, TransitionOutcome,
};
use geovis_scoring::{ScoreRow, SentimentSentences};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Insert a pending collector result and return its `id`.
async fn insert_pending(pool: &sqlx::PgPool, collector_type: &str) -> i64 {
    create_collector_result(pool, Uuid::new_v4(), collector_type)
        .await
        .unwrap_or_else(|e| panic!("create_collector_result failed for '{collector_type}': {e}"))
        .id
}

fn ctx(source: &str) -> TransitionContext {
    TransitionContext::new(source)
}

fn with_answer(answer: &str) -> TransitionFields {
    TransitionFields {
        raw_answer: Some(answer.to_string()),
        error_message: None,
    }
}

fn make_score_row(competitor: &str, brand_mentions: u64) -> ScoreRow {
    ScoreRow {
        brand_name: "Acme".to_string(),
        competitor_name: competitor.to_string(),
        collector_type: "chatgpt".to_string(),
        visibility_index: Some(0.67),
        visibility_index_competitor: Some(0.0),
        sentiment_score: Some(1.0),
        sentiment_score_competitor: None,
        share_of_answers: Some(100.0),
        share_of_answers_competitor: Some(0.0),
        brand_mentions,
        competitor_mentions: 0,
        brand_positions: vec![1],
        competitor_positions: Vec::new(),
        brand_sentences: SentimentSentences {
            positive: vec!["Acme is great.".to_string()],
            negative: Vec::new(),
        },
        competitor_sentences: SentimentSentences::default(),
        total_words: 6,
        count_provider: Some("primary".to_string()),
    }
}

// ---------------------------------------------------------------------------
// Pool + migrations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn health_check_succeeds(pool: sqlx::PgPool) {
    geovis_db::health_check(&pool).await.unwrap();
}

// ---------------------------------------------------------------------------
// collector_results reads
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn created_result_is_pending_with_empty_history(pool: sqlx::PgPool) {
    let execution_id = Uuid::new_v4();
    let created = create_collector_result(&pool, execution_id, "chatgpt")
        .await
        .unwrap();

    assert_eq!(created.status().unwrap(), Pending);
    assert!(created.history().is_empty());
    assert!(created.raw_answer.is_none());

    let by_execution = get_collector_result_by_execution(&pool, execution_id, "chatgpt")
        .await
        .unwrap();
    assert_eq!(by_execution.id, created.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn missing_result_is_not_found(pool: sqlx::PgPool) {
    assert!(matches!(
        get_collector_result(&pool, 9_999).await,
        Err(DbError::NotFound)
    ));
    assert!(matches!(
        transition_collector_result(
            &pool,
            9_999,
            Running,
            &ctx("test"),
            &TransitionFields::default()
        )
        .await,
        Err(DbError::NotFound)
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn duplicate_execution_and_collector_is_rejected(pool: sqlx::PgPool) {
    let execution_id = Uuid::new_v4();
    create_collector_result(&pool, execution_id, "chatgpt")
        .await
        .unwrap();
    assert!(matches!(
        create_collector_result(&pool, execution_id, "chatgpt").await,
        Err(DbError::Sqlx(_))
    ));
    create_collector_result(&pool, execution_id, "perplexity")
        .await
        .unwrap();
}

// ---------------------------------------------------------------------------
// Status guard
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn transition_appends_history_in_order(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;

    let outcome = transition_collector_result(
        &pool,
        id,
        Running,
        &ctx("worker"),
        &TransitionFields::default(),
    )
    .await
    .unwrap();
    assert_eq!(
        outcome,
        TransitionOutcome::Updated {
            from: Pending,
            to: Running,
            coerced: false
        }
    );

    transition_collector_result(
        &pool,
        id,
        Completed,
        &ctx("worker").with_reason("answer stored"),
        &with_answer("Acme is great."),
    )
    .await
    .unwrap();

    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.status().unwrap(), Completed);
    assert_eq!(row.raw_answer.as_deref(), Some("Acme is great."));
    assert!(row.started_at.is_some());
    assert!(row.completed_at.is_some());

    let history = row.history();
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].from, history[0].to), (Pending, Running));
    assert_eq!((history[1].from, history[1].to), (Running, Completed));
    assert_eq!(history[1].reason.as_deref(), Some("answer stored"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn completed_without_answer_is_recorded_as_processing(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;

    let outcome = transition_collector_result(
        &pool,
        id,
        Completed,
        &ctx("worker"),
        &with_answer("   "),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Updated {
            from: Pending,
            to: Processing,
            coerced: true
        }
    );
    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.status().unwrap(), Processing);
    assert_eq!(row.history()[0].to, Processing);
    assert!(row.raw_answer.is_none(), "blank answer must not be stored");
}

#[sqlx::test(migrations = "../../migrations")]
async fn completed_with_no_fields_is_recorded_as_processing(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;

    let outcome = transition_collector_result(
        &pool,
        id,
        Completed,
        &ctx("worker"),
        &TransitionFields::default(),
    )
    .await
    .unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Updated {
            from: Pending,
            to: Processing,
            coerced: true
        }
    );
    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.status().unwrap(), Processing);
    assert!(row.raw_answer.is_none());
    assert!(row.completed_at.is_none());
    assert!(row.started_at.is_some());
}

#[sqlx::test(migrations = "../../migrations")]
async fn completed_uses_previously_stored_answer(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;
    transition_collector_result(&pool, id, Running, &ctx("worker"), &with_answer("Acme rocks."))
        .await
        .unwrap();

    let outcome = transition_collector_result(
        &pool,
        id,
        Completed,
        &ctx("worker"),
        &TransitionFields::default(),
    )
    .await
    .unwrap();

    assert!(matches!(
        outcome,
        TransitionOutcome::Updated {
            to: Completed,
            coerced: false,
            ..
        }
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn terminal_result_is_never_moved(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;
    let failure = TransitionFields {
        raw_answer: None,
        error_message: Some("provider timeout".to_string()),
    };
    transition_collector_result(&pool, id, Failed, &ctx("worker"), &failure)
        .await
        .unwrap();

    let outcome = transition_collector_result(
        &pool,
        id,
        Running,
        &ctx("retry"),
        &TransitionFields::default(),
    )
    .await
    .unwrap();
    assert_eq!(outcome, TransitionOutcome::SkippedTerminal { status: Failed });

    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.status().unwrap(), Failed);
    assert_eq!(row.error_message.as_deref(), Some("provider timeout"));
    assert_eq!(row.history().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn stale_expected_status_is_not_updated(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;
    transition_collector_result(&pool, id, Running, &ctx("a"), &TransitionFields::default())
        .await
        .unwrap();

    let outcome = transition_collector_result_from(
        &pool,
        id,
        Pending,
        Processing,
        &ctx("b"),
        &TransitionFields::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome, TransitionOutcome::NotUpdated);
    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.status().unwrap(), Running);
    assert_eq!(row.history().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn terminal_result_is_skipped_even_with_stale_expected_status(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;
    transition_collector_result(
        &pool,
        id,
        Completed,
        &ctx("worker"),
        &with_answer("Acme is great."),
    )
    .await
    .unwrap();

    let outcome = transition_collector_result_from(
        &pool,
        id,
        Pending,
        Running,
        &ctx("retry"),
        &TransitionFields::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome, TransitionOutcome::SkippedTerminal { status: Completed });
    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.status().unwrap(), Completed);
    assert_eq!(row.history().len(), 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn concurrent_transitions_have_exactly_one_winner(pool: sqlx::PgPool) {
    let id = insert_pending(&pool, "chatgpt").await;
    let none = TransitionFields::default();
    let (ctx_a, ctx_b) = (ctx("worker-a"), ctx("worker-b"));

    let (a, b) = tokio::join!(
        transition_collector_result_from(&pool, id, Pending, Running, &ctx_a, &none),
        transition_collector_result_from(&pool, id, Pending, Processing, &ctx_b, &none),
    );
    let outcomes = [a.unwrap(), b.unwrap()];

    let updated = outcomes
        .iter()
        .filter(|o| matches!(o, TransitionOutcome::Updated { .. }))
        .count();
    let not_updated = outcomes
        .iter()
        .filter(|o| **o == TransitionOutcome::NotUpdated)
        .count();
    assert_eq!((updated, not_updated), (1, 1), "got: {outcomes:?}");

    let row = get_collector_result(&pool, id).await.unwrap();
    assert_eq!(row.history().len(), 1);
    let winner: CollectorResultStatus = row.status().unwrap();
    assert_eq!(row.history()[0].to, winner);
}

// ---------------------------------------------------------------------------
// score_rows
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn upsert_score_row_is_idempotent_per_key(pool: sqlx::PgPool) {
    let brand_id = Uuid::new_v4();
    let query_id = Uuid::new_v4();

    let first = upsert_score_row(&pool, brand_id, query_id, &make_score_row("Globex", 1))
        .await
        .unwrap();
    let second = upsert_score_row(&pool, brand_id, query_id, &make_score_row("Globex", 2))
        .await
        .unwrap();
    upsert_score_row(&pool, brand_id, query_id, &make_score_row("Initech", 1))
        .await
        .unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(second.brand_mentions, 2);

    let rows = list_score_rows_for_query(&pool, query_id).await.unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].competitor_name, "Globex");

    let restored = rows[0].clone().into_score_row().unwrap();
    assert_eq!(restored, make_score_row("Globex", 2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn score_rows_are_scoped_to_query(pool: sqlx::PgPool) {
    let brand_id = Uuid::new_v4();
    upsert_score_row(&pool, brand_id, Uuid::new_v4(), &make_score_row("Globex", 1))
        .await
        .unwrap();

    let rows = list_score_rows_for_query(&pool, Uuid::new_v4())
        .await
        .unwrap();
    assert!(rows.is_empty());
}
