//! `transition` and `show-result` command handlers.

use geovis_core::CollectorResultStatus;
use geovis_db::{CollectorResultRow, TransitionContext, TransitionFields, TransitionOutcome};

/// Apply one guarded status transition and report what happened.
///
/// # Errors
///
/// Returns an error if the record does not exist or the database query fails.
pub(crate) async fn run_transition(
    pool: &sqlx::PgPool,
    id: i64,
    status: CollectorResultStatus,
    ctx: &TransitionContext,
    fields: &TransitionFields,
) -> anyhow::Result<()> {
    let outcome = geovis_db::transition_collector_result(pool, id, status, ctx, fields).await?;
    println!("{}", describe_outcome(id, status, outcome));
    Ok(())
}

/// Print a collector result and its status history.
///
/// # Errors
///
/// Returns an error if the record does not exist or the database query fails.
pub(crate) async fn run_show_result(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let row = geovis_db::get_collector_result(pool, id).await?;
    print!("{}", render_result(&row));
    Ok(())
}

fn describe_outcome(
    id: i64,
    requested: CollectorResultStatus,
    outcome: TransitionOutcome,
) -> String {
    match outcome {
        TransitionOutcome::Updated {
            from,
            to,
            coerced: false,
        } => format!("result {id}: {from} -> {to}"),
        TransitionOutcome::Updated {
            from,
            to,
            coerced: true,
        } => format!("result {id}: {from} -> {to} ({requested} requested without an answer)"),
        TransitionOutcome::SkippedTerminal { status } => {
            format!("result {id}: already {status}; {requested} not applied")
        }
        TransitionOutcome::NotUpdated => {
            format!("result {id}: changed concurrently; {requested} not applied")
        }
    }
}

fn render_result(row: &CollectorResultRow) -> String {
    let mut out = format!(
        "id:         {}\npublic_id:  {}\nexecution:  {}\ncollector:  {}\nstatus:     {}\nupdated_at: {}\n",
        row.id,
        row.public_id,
        row.execution_id,
        row.collector_type,
        row.status,
        row.updated_at.format("%Y-%m-%d %H:%M:%S"),
    );
    if let Some(message) = &row.error_message {
        out.push_str(&format!("error:      {message}\n"));
    }
    if let Some(answer) = &row.raw_answer {
        out.push_str(&format!("answer:     {} chars\n", answer.chars().count()));
    }

    let history = row.history();
    if history.is_empty() {
        out.push_str("history:    (none)\n");
        return out;
    }
    out.push_str(&format!("\n{:<22}{:<15}{:<15}{:<12}REASON\n", "AT", "FROM", "TO", "SOURCE"));
    for entry in &history {
        out.push_str(&format!(
            "{:<22}{:<15}{:<15}{:<12}{}\n",
            entry.at.format("%Y-%m-%d %H:%M:%S"),
            entry.from,
            entry.to,
            entry.source,
            entry.reason.as_deref().unwrap_or("-"),
        ));
    }
    out
}
