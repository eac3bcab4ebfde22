//! Database operations for `collector_results` and its status guard.
//!
//! Every status move is a compare-and-swap on `(id, status)`: the row in
//! Postgres decides which of two racing writers wins, and the loser gets
//! [`TransitionOutcome::NotUpdated`] instead of an error.

use chrono::{DateTime, Utc};
use geovis_core::{
    has_payload, plan_transition, status_history, CollectorResultStatus, TransitionEntry,
    TransitionPlan,
};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `collector_results` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectorResultRow {
    pub id: i64,
    pub public_id: Uuid,
    pub execution_id: Uuid,
    pub collector_type: String,
    pub status: String,
    pub raw_answer: Option<String>,
    pub error_message: Option<String>,
    /// `JSONB NOT NULL DEFAULT '{}'`; holds `status_history`.
    pub metadata: serde_json::Value,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectorResultRow {
    /// Parse the stored status column.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Core`] if the column holds an unknown status.
    pub fn status(&self) -> Result<CollectorResultStatus, DbError> {
        Ok(self.status.parse()?)
    }

    /// The transition log, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<TransitionEntry> {
        status_history(&self.metadata)
    }
}

/// Who asked for a transition and why; recorded in the history entry.
#[derive(Debug, Clone)]
pub struct TransitionContext {
    pub source: String,
    pub reason: Option<String>,
}

impl TransitionContext {
    #[must_use]
    pub fn new(source: &str) -> Self {
        Self {
            source: source.to_string(),
            reason: None,
        }
    }

    #[must_use]
    pub fn with_reason(mut self, reason: &str) -> Self {
        self.reason = Some(reason.to_string());
        self
    }
}

/// Column values written alongside the status. `None` leaves the column as is.
#[derive(Debug, Clone, Default)]
pub struct TransitionFields {
    pub raw_answer: Option<String>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Updated {
        from: CollectorResultStatus,
        to: CollectorResultStatus,
        /// `true` when a `completed` request was written as `processing`.
        coerced: bool,
    },
    /// The record was already terminal; nothing was written.
    SkippedTerminal { status: CollectorResultStatus },
    /// Another writer moved the record first.
    NotUpdated,
}

const COLUMNS: &str = "id, public_id, execution_id, collector_type, status, raw_answer, \
                       error_message, metadata, started_at, completed_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Reads and inserts
// ---------------------------------------------------------------------------

/// Creates a collector result in `pending` status with empty metadata.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when a result
/// already exists for `(execution_id, collector_type)`.
pub async fn create_collector_result(
    pool: &PgPool,
    execution_id: Uuid,
    collector_type: &str,
) -> Result<CollectorResultRow, DbError> {
    let public_id = Uuid::new_v4();

    let row = sqlx::query_as::<_, CollectorResultRow>(&format!(
        "INSERT INTO collector_results (public_id, execution_id, collector_type, status) \
         VALUES ($1, $2, $3, 'pending') \
         RETURNING {COLUMNS}"
    ))
    .bind(public_id)
    .bind(execution_id)
    .bind(collector_type)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Fetches a collector result by its internal id.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] on
/// query failure.
pub async fn get_collector_result(pool: &PgPool, id: i64) -> Result<CollectorResultRow, DbError> {
    sqlx::query_as::<_, CollectorResultRow>(&format!(
        "SELECT {COLUMNS} FROM collector_results WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Fetches the result one collector produced for one execution.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists, or [`DbError::Sqlx`] on
/// query failure.
pub async fn get_collector_result_by_execution(
    pool: &PgPool,
    execution_id: Uuid,
    collector_type: &str,
) -> Result<CollectorResultRow, DbError> {
    sqlx::query_as::<_, CollectorResultRow>(&format!(
        "SELECT {COLUMNS} FROM collector_results \
         WHERE execution_id = $1 AND collector_type = $2"
    ))
    .bind(execution_id)
    .bind(collector_type)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

// ---------------------------------------------------------------------------
// Status guard
// ---------------------------------------------------------------------------

/// Moves a collector result to `to`, starting from whatever status it holds now.
///
/// Terminal records are left alone. A `completed` request with no non-empty
/// `raw_answer` (in `fields` or already stored) is written as `processing`.
/// The history entry is appended in the same statement as the status change.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the record does not exist,
/// [`DbError::Core`] if its stored status is unknown, or [`DbError::Sqlx`]
/// on query failure. Losing a race is [`TransitionOutcome::NotUpdated`].
pub async fn transition_collector_result(
    pool: &PgPool,
    id: i64,
    to: CollectorResultStatus,
    ctx: &TransitionContext,
    fields: &TransitionFields,
) -> Result<TransitionOutcome, DbError> {
    let current = get_collector_result(pool, id).await?;
    let from = current.status()?;
    apply_transition(pool, &current, from, to, ctx, fields).await
}

/// Like [`transition_collector_result`], but only succeeds if the record is
/// still at `expected`, the status the caller last observed. A terminal record
/// yields [`TransitionOutcome::SkippedTerminal`]; any other record that has
/// moved on yields [`TransitionOutcome::NotUpdated`].
///
/// # Errors
///
/// Same as [`transition_collector_result`].
pub async fn transition_collector_result_from(
    pool: &PgPool,
    id: i64,
    expected: CollectorResultStatus,
    to: CollectorResultStatus,
    ctx: &TransitionContext,
    fields: &TransitionFields,
) -> Result<TransitionOutcome, DbError> {
    let current = get_collector_result(pool, id).await?;
    let stored = current.status()?;
    if stored.is_terminal() {
        return apply_transition(pool, &current, stored, to, ctx, fields).await;
    }
    if stored != expected {
        tracing::debug!(
            id,
            expected = %expected,
            stored = %current.status,
            source = %ctx.source,
            "collector result no longer at expected status"
        );
        return Ok(TransitionOutcome::NotUpdated);
    }
    apply_transition(pool, &current, expected, to, ctx, fields).await
}

async fn apply_transition(
    pool: &PgPool,
    current: &CollectorResultRow,
    from: CollectorResultStatus,
    requested: CollectorResultStatus,
    ctx: &TransitionContext,
    fields: &TransitionFields,
) -> Result<TransitionOutcome, DbError> {
    let payload =
        has_payload(fields.raw_answer.as_deref()) || has_payload(current.raw_answer.as_deref());

    let (from, to, coerced) = match plan_transition(from, requested, payload) {
        TransitionPlan::SkipTerminal { current: status } => {
            tracing::info!(
                id = current.id,
                status = %status,
                requested = %requested,
                source = %ctx.source,
                "collector result already terminal; transition skipped"
            );
            return Ok(TransitionOutcome::SkippedTerminal { status });
        }
        TransitionPlan::Apply { from, to, coerced } => (from, to, coerced),
    };

    if coerced {
        tracing::warn!(
            id = current.id,
            from = %from,
            source = %ctx.source,
            "completed requested without an answer; recording processing instead"
        );
    }

    let entry = TransitionEntry::new(from, to, &ctx.source, ctx.reason.as_deref());
    let entry = serde_json::to_value(&entry)?;

    let result = sqlx::query(
        "UPDATE collector_results \
         SET status = $1::text, \
             raw_answer = COALESCE($2, raw_answer), \
             error_message = COALESCE($3, error_message), \
             started_at = CASE WHEN $1::text IN ('processing', 'running') \
                               THEN COALESCE(started_at, NOW()) ELSE started_at END, \
             completed_at = CASE WHEN $1::text IN ('completed', 'failed') \
                                 THEN NOW() ELSE completed_at END, \
             metadata = jsonb_set( \
                 metadata, '{status_history}', \
                 COALESCE(metadata -> 'status_history', '[]'::jsonb) || jsonb_build_array($4::jsonb)), \
             updated_at = NOW() \
         WHERE id = $5 AND status = $6 AND status NOT IN ('completed', 'failed')",
    )
    .bind(to.as_str())
    .bind(fields.raw_answer.as_deref().filter(|v| has_payload(Some(*v))))
    .bind(fields.error_message.as_deref())
    .bind(entry)
    .bind(current.id)
    .bind(from.as_str())
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        tracing::debug!(
            id = current.id,
            expected = %from,
            requested = %to,
            source = %ctx.source,
            "collector result moved concurrently; transition not applied"
        );
        return Ok(TransitionOutcome::NotUpdated);
    }

    tracing::debug!(
        id = current.id,
        from = %from,
        to = %to,
        source = %ctx.source,
        "collector result transitioned"
    );
    Ok(TransitionOutcome::Updated { from, to, coerced })
}
