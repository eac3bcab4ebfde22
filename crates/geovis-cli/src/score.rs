//! `score` command: score answers, print rows as JSON, optionally persist them.

use std::io::Read as _;
use std::path::{Path, PathBuf};

use geovis_core::{load_entities, AppConfig};
use geovis_llm::ProviderChain;
use geovis_scoring::{AnswerInput, HybridScorer, ScoreRow, ScoringError};
use uuid::Uuid;

#[derive(Debug)]
pub(crate) struct ScoreOptions {
    pub answers: Vec<PathBuf>,
    pub entities: PathBuf,
    pub collector: String,
    pub local_only: bool,
    /// `(brand_id, query_id)` to upsert rows under.
    pub target: Option<(Uuid, Uuid)>,
}

/// Score every answer and print the rows as JSON, one inner array per answer.
///
/// Answers that cannot be scored are logged and skipped.
///
/// # Errors
///
/// Returns an error if the answer list is invalid, the entities file or an
/// answer cannot be read, no provider is configured for LLM scoring, every
/// answer fails, or persisting a row fails.
pub(crate) async fn run_score(config: &AppConfig, options: ScoreOptions) -> anyhow::Result<()> {
    validate_answers(&options.answers, options.target.is_some())?;
    let entities = load_entities(&options.entities)?;
    let brand = entities.brand_aliases();
    let competitors = entities.competitor_aliases();

    let inputs = options
        .answers
        .iter()
        .map(|path| -> anyhow::Result<AnswerInput> {
            Ok(AnswerInput {
                answer: read_answer(path)?,
                brand: brand.clone(),
                competitors: competitors.clone(),
                collector_type: options.collector.clone(),
            })
        })
        .collect::<anyhow::Result<Vec<_>>>()?;

    let results: Vec<Result<Vec<ScoreRow>, ScoringError>> = if options.local_only {
        let scorer = HybridScorer::local_only();
        inputs
            .iter()
            .map(|input| scorer.score_answer_local(input))
            .collect()
    } else {
        let chain = ProviderChain::from_config(config)?;
        tracing::info!(
            providers = ?chain.provider_names(),
            answers = inputs.len(),
            "scoring with LLM counts"
        );
        HybridScorer::new(chain)
            .with_max_tokens(config.llm_max_tokens)
            .score_batch(&inputs, config.max_concurrent_answers)
            .await
    };

    let rows = collect_rows(&options.answers, results)?;
    println!("{}", serde_json::to_string_pretty(&rows)?);

    if let Some((brand_id, query_id)) = options.target {
        persist_rows(config, brand_id, query_id, &rows).await?;
    }
    Ok(())
}

/// `-` may appear once; a `(brand_id, query_id)` target takes exactly one answer.
fn validate_answers(answers: &[PathBuf], has_target: bool) -> anyhow::Result<()> {
    let from_stdin = answers.iter().filter(|p| p.as_os_str() == "-").count();
    if from_stdin > 1 {
        anyhow::bail!("`--answer -` can be given at most once (got {from_stdin})");
    }
    if has_target && answers.len() > 1 {
        anyhow::bail!(
            "--brand-id/--query-id persist a single answer, got {}",
            answers.len()
        );
    }
    Ok(())
}

fn read_answer(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut answer = String::new();
        std::io::stdin()
            .read_to_string(&mut answer)
            .map_err(|e| anyhow::anyhow!("failed to read answer from stdin: {e}"))?;
        return Ok(answer);
    }
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read answer {}: {e}", path.display()))
}

/// Keep the rows of answers that scored; fail only when none did.
fn collect_rows(
    paths: &[PathBuf],
    results: Vec<Result<Vec<ScoreRow>, ScoringError>>,
) -> anyhow::Result<Vec<Vec<ScoreRow>>> {
    let total = results.len();
    let mut rows = Vec::with_capacity(total);
    let mut failed = 0usize;

    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(answer_rows) => rows.push(answer_rows),
            Err(e) if e.is_unscoreable() => {
                tracing::warn!(answer = %path.display(), error = %e, "answer skipped");
                failed += 1;
            }
            Err(e) => {
                tracing::error!(answer = %path.display(), error = %e, "answer scoring failed");
                failed += 1;
            }
        }
    }

    if total > 0 && failed == total {
        anyhow::bail!("all {failed} answers failed scoring");
    }
    Ok(rows)
}

async fn persist_rows(
    config: &AppConfig,
    brand_id: Uuid,
    query_id: Uuid,
    rows: &[Vec<ScoreRow>],
) -> anyhow::Result<()> {
    let pool = geovis_db::connect_pool_from_config(config).await?;
    let mut written = 0usize;
    for row in rows.iter().flatten() {
        geovis_db::upsert_score_row(&pool, brand_id, query_id, row).await?;
        written += 1;
    }
    tracing::info!(%brand_id, %query_id, written, "score rows persisted");
    eprintln!("persisted {written} score rows for query {query_id}");
    Ok(())
}
