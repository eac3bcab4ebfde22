//! LLM plumbing for geovis.
//!
//! An OpenAI-compatible chat client, the [`CompletionProvider`] seam with a
//! bounded [`ProviderChain`] for fallback, and the structured-output
//! extractor that turns raw model text into validated payloads.

pub mod client;
pub mod error;
pub mod extract;
pub mod provider;
pub mod shapes;
pub mod types;

mod retry;

pub use client::ChatClient;
pub use error::LlmError;
pub use extract::{
    extract_competitors, extract_mention_counts, extract_object, extract_product_names,
    CompetitorSuggestion, Extracted, ExtractionError, Provenance, Stage, StageFailure,
};
pub use provider::{ChainResponse, CompletionProvider, ProviderChain, MAX_PROVIDERS};
pub use shapes::{parse_count, LlmPayload, MentionCounts};
pub use types::{ChatMessage, CompletionRequest};
