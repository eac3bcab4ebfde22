use geovis_core::AliasSet;
use serde::{Deserialize, Serialize};

/// Where one entity was mentioned in one answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    positions: Vec<usize>,
}

impl Occurrence {
    /// Build from 1-based start positions in scan order.
    pub(crate) fn from_positions(positions: Vec<usize>) -> Self {
        Self { positions }
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    /// 1-based token positions where a mention starts, strictly increasing.
    #[must_use]
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    #[must_use]
    pub fn first_position(&self) -> Option<usize> {
        self.positions.first().copied()
    }
}

/// One answer to score against a brand and its competitors.
#[derive(Debug, Clone)]
pub struct AnswerInput {
    pub answer: String,
    pub brand: AliasSet,
    pub competitors: Vec<AliasSet>,
    /// Which collector (LLM surface) produced the answer, e.g. `chatgpt`.
    pub collector_type: String,
}

/// Positive and negative sentences about one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSentences {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// Metrics for one (brand, competitor, collector) tuple of one answer.
///
/// Brand-side fields are identical across the rows emitted for one answer.
/// `None` metrics mean no score was possible, which is not the same as `0.0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub brand_name: String,
    pub competitor_name: String,
    pub collector_type: String,

    pub visibility_index: Option<f64>,
    pub visibility_index_competitor: Option<f64>,
    pub sentiment_score: Option<f64>,
    pub sentiment_score_competitor: Option<f64>,
    pub share_of_answers: Option<f64>,
    pub share_of_answers_competitor: Option<f64>,

    pub brand_mentions: u64,
    pub competitor_mentions: u64,
    pub brand_positions: Vec<usize>,
    pub competitor_positions: Vec<usize>,
    pub brand_sentences: SentimentSentences,
    pub competitor_sentences: SentimentSentences,

    pub total_words: usize,
    /// Provider that supplied the mention counts; `None` for local counts.
    pub count_provider: Option<String>,
}
