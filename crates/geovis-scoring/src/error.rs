use geovis_llm::LlmError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("answer text is empty")]
    EmptyAnswer,

    #[error("no competitors to score against")]
    NoCompetitors,

    #[error("answer contains no words")]
    NoWords,

    #[error("LLM counting failed: {0}")]
    Llm(#[from] LlmError),
}

impl ScoringError {
    /// `true` for input that can never be scored; such answers are skipped
    /// rather than retried.
    #[must_use]
    pub fn is_unscoreable(&self) -> bool {
        matches!(self, Self::EmptyAnswer | Self::NoCompetitors | Self::NoWords)
    }
}
