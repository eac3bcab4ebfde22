//! Brand visibility scoring for LLM answers.
//!
//! Tokenizes an answer once, locates brand and competitor mentions by alias,
//! and turns mention counts into Visibility Index, Share of Answers and
//! sentence-level sentiment. [`HybridScorer`] combines those local
//! measurements with LLM-reported counts.

pub mod error;
pub mod lexicon;
pub mod matcher;
pub mod metrics;
pub mod pipeline;
pub mod tokenizer;
pub mod types;

mod prompts;

pub use error::ScoringError;
pub use lexicon::{Polarity, SentimentLexicon};
pub use matcher::{find_occurrences, find_occurrences_with_sentences};
pub use metrics::{share_of_answers, visibility_index, ScoringWeights};
pub use pipeline::{HybridScorer, MAX_PRODUCT_NAMES};
pub use tokenizer::{tokenize, Sentence, TextUnit};
pub use types::{AnswerInput, Occurrence, ScoreRow, SentimentSentences};
