//! Database operations for `score_rows`.

use chrono::{DateTime, Utc};
use geovis_scoring::{ScoreRow, SentimentSentences};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

/// A row from the `score_rows` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScoreRowRecord {
    pub id: i64,
    pub brand_id: Uuid,
    pub query_id: Uuid,
    pub competitor_name: String,
    pub collector_type: String,
    pub brand_name: String,
    pub visibility_index: Option<f64>,
    pub visibility_index_competitor: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_score_competitor: Option<f64>,
    pub share_of_answers: Option<f64>,
    pub share_of_answers_competitor: Option<f64>,
    pub brand_mentions: i64,
    pub competitor_mentions: i64,
    /// JSONB array of 1-based token positions.
    pub brand_positions: serde_json::Value,
    pub competitor_positions: serde_json::Value,
    /// JSONB `{"positive": [..], "negative": [..]}`.
    pub brand_sentences: serde_json::Value,
    pub competitor_sentences: serde_json::Value,
    pub total_words: i32,
    pub count_provider: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ScoreRowRecord {
    /// Convert back into the scoring crate's row type.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::Json`] if a JSONB column does not hold the expected shape.
    pub fn into_score_row(self) -> Result<ScoreRow, DbError> {
        Ok(ScoreRow {
            brand_name: self.brand_name,
            competitor_name: self.competitor_name,
            collector_type: self.collector_type,
            visibility_index: self.visibility_index,
            visibility_index_competitor: self.visibility_index_competitor,
            sentiment_score: self.sentiment_score,
            sentiment_score_competitor: self.sentiment_score_competitor,
            share_of_answers: self.share_of_answers,
            share_of_answers_competitor: self.share_of_answers_competitor,
            brand_mentions: u64::try_from(self.brand_mentions).unwrap_or(0),
            competitor_mentions: u64::try_from(self.competitor_mentions).unwrap_or(0),
            brand_positions: serde_json::from_value(self.brand_positions)?,
            competitor_positions: serde_json::from_value(self.competitor_positions)?,
            brand_sentences: serde_json::from_value::<SentimentSentences>(self.brand_sentences)?,
            competitor_sentences: serde_json::from_value::<SentimentSentences>(
                self.competitor_sentences,
            )?,
            total_words: usize::try_from(self.total_words).unwrap_or(0),
            count_provider: self.count_provider,
        })
    }
}

const COLUMNS: &str = "id, brand_id, query_id, competitor_name, collector_type, brand_name, \
                       visibility_index, visibility_index_competitor, \
                       sentiment_score, sentiment_score_competitor, \
                       share_of_answers, share_of_answers_competitor, \
                       brand_mentions, competitor_mentions, brand_positions, competitor_positions, \
                       brand_sentences, competitor_sentences, total_words, count_provider, \
                       created_at, updated_at";

/// Inserts or replaces the metrics for one (brand, query, competitor, collector).
///
/// Re-scoring the same answer overwrites the earlier row in place.
///
/// # Errors
///
/// Returns [`DbError::Json`] if a nested field cannot be serialized, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_score_row(
    pool: &PgPool,
    brand_id: Uuid,
    query_id: Uuid,
    row: &ScoreRow,
) -> Result<ScoreRowRecord, DbError> {
    let record = sqlx::query_as::<_, ScoreRowRecord>(&format!(
        "INSERT INTO score_rows ( \
             brand_id, query_id, competitor_name, collector_type, brand_name, \
             visibility_index, visibility_index_competitor, \
             sentiment_score, sentiment_score_competitor, \
             share_of_answers, share_of_answers_competitor, \
             brand_mentions, competitor_mentions, brand_positions, competitor_positions, \
             brand_sentences, competitor_sentences, total_words, count_provider) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19) \
         ON CONFLICT (brand_id, query_id, competitor_name, collector_type) DO UPDATE SET \
             brand_name = EXCLUDED.brand_name, \
             visibility_index = EXCLUDED.visibility_index, \
             visibility_index_competitor = EXCLUDED.visibility_index_competitor, \
             sentiment_score = EXCLUDED.sentiment_score, \
             sentiment_score_competitor = EXCLUDED.sentiment_score_competitor, \
             share_of_answers = EXCLUDED.share_of_answers, \
             share_of_answers_competitor = EXCLUDED.share_of_answers_competitor, \
             brand_mentions = EXCLUDED.brand_mentions, \
             competitor_mentions = EXCLUDED.competitor_mentions, \
             brand_positions = EXCLUDED.brand_positions, \
             competitor_positions = EXCLUDED.competitor_positions, \
             brand_sentences = EXCLUDED.brand_sentences, \
             competitor_sentences = EXCLUDED.competitor_sentences, \
             total_words = EXCLUDED.total_words, \
             count_provider = EXCLUDED.count_provider, \
             updated_at = NOW() \
         RETURNING {COLUMNS}"
    ))
    .bind(brand_id)
    .bind(query_id)
    .bind(&row.competitor_name)
    .bind(&row.collector_type)
    .bind(&row.brand_name)
    .bind(row.visibility_index)
    .bind(row.visibility_index_competitor)
    .bind(row.sentiment_score)
    .bind(row.sentiment_score_competitor)
    .bind(row.share_of_answers)
    .bind(row.share_of_answers_competitor)
    .bind(i64::try_from(row.brand_mentions).unwrap_or(i64::MAX))
    .bind(i64::try_from(row.competitor_mentions).unwrap_or(i64::MAX))
    .bind(serde_json::to_value(&row.brand_positions)?)
    .bind(serde_json::to_value(&row.competitor_positions)?)
    .bind(serde_json::to_value(&row.brand_sentences)?)
    .bind(serde_json::to_value(&row.competitor_sentences)?)
    .bind(i32::try_from(row.total_words).unwrap_or(i32::MAX))
    .bind(row.count_provider.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Lists every score row stored for a query, ordered by competitor then collector.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn list_score_rows_for_query(
    pool: &PgPool,
    query_id: Uuid,
) -> Result<Vec<ScoreRowRecord>, DbError> {
    let rows = sqlx::query_as::<_, ScoreRowRecord>(&format!(
        "SELECT {COLUMNS} FROM score_rows \
         WHERE query_id = $1 \
         ORDER BY competitor_name, collector_type"
    ))
    .bind(query_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
