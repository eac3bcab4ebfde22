//! Structured-output extraction for LLM responses.
//!
//! Raw model text goes through a fixed sequence of pure stages, stopping at
//! the first one that yields a payload passing validation:
//!
//! 1. strip framing (end-of-generation tokens, code fences)
//! 2. brace-match the first `{ ... }` span
//! 3. strict parse
//! 4. cleaned parse (bounded textual repairs)
//! 5. regex recovery, competitor lists only
//!
//! Every parse is followed by completeness and payload validation. When no
//! stage succeeds the caller gets an [`ExtractionError`] listing why each
//! stage failed, never partial data.

mod braces;
mod fallback;
mod framing;
mod repair;
mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::shapes::{LlmPayload, MentionCounts};

/// Which stage produced an accepted value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    Strict,
    Cleaned,
    RegexFallback,
    /// The caller rejected a well-formed payload.
    Plausibility,
}

impl Provenance {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Cleaned => "cleaned",
            Self::RegexFallback => "regex_fallback",
            Self::Plausibility => "plausibility",
        }
    }
}

/// A validated value plus the stage that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted<T> {
    pub value: T,
    pub provenance: Provenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    StripFraming,
    BraceMatch,
    StrictParse,
    CleanedParse,
    RegexFallback,
    Plausibility,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StripFraming => "strip_framing",
            Self::BraceMatch => "brace_match",
            Self::StrictParse => "strict_parse",
            Self::CleanedParse => "cleaned_parse",
            Self::RegexFallback => "regex_fallback",
            Self::Plausibility => "plausibility",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub reason: String,
}

impl StageFailure {
    fn new(stage: Stage, reason: impl Into<String>) -> Self {
        Self {
            stage,
            reason: reason.into(),
        }
    }
}

/// Every stage rejected the response.
#[derive(Debug, Clone, Error)]
#[error("no usable structured output ({})", render_attempts(.attempts))]
pub struct ExtractionError {
    pub attempts: Vec<StageFailure>,
}

impl ExtractionError {
    /// Reject a payload that parsed but cannot be true, so a provider chain
    /// moves on to the next provider.
    #[must_use]
    pub fn implausible(reason: impl Into<String>) -> Self {
        Self {
            attempts: vec![StageFailure::new(Stage::Plausibility, reason)],
        }
    }

    /// `true` if `stage` was tried and failed.
    #[must_use]
    pub fn failed_at(&self, stage: Stage) -> bool {
        self.attempts.iter().any(|a| a.stage == stage)
    }
}

fn render_attempts(attempts: &[StageFailure]) -> String {
    attempts
        .iter()
        .map(|a| format!("{}: {}", a.stage, a.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// One entry of a competitor-discovery response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitorSuggestion {
    pub name: String,
    pub domain: String,
    pub industry: String,
    pub relevance: String,
}

type ParseStage = fn(&str) -> Result<Value, String>;

const PARSE_STAGES: [(Stage, Provenance, ParseStage); 2] = [
    (Stage::StrictParse, Provenance::Strict, parse_strict),
    (Stage::CleanedParse, Provenance::Cleaned, parse_cleaned),
];

fn parse_strict(candidate: &str) -> Result<Value, String> {
    let value = serde_json::from_str(candidate).map_err(|e| e.to_string())?;
    validate::check_complete(candidate)?;
    Ok(value)
}

fn parse_cleaned(candidate: &str) -> Result<Value, String> {
    let cleaned = repair::clean(candidate);
    let value = serde_json::from_str(&cleaned).map_err(|e| e.to_string())?;
    validate::check_complete(&cleaned)?;
    Ok(value)
}

type Recover<T> = fn(&str) -> Result<T, String>;

fn run<T>(
    text: &str,
    accept: impl Fn(Value) -> Result<T, String>,
    recover: Option<Recover<T>>,
) -> Result<Extracted<T>, ExtractionError> {
    let mut attempts = Vec::new();
    let stripped = framing::strip_framing(text);

    if stripped.is_empty() {
        attempts.push(StageFailure::new(
            Stage::StripFraming,
            "nothing left after removing framing",
        ));
        return Err(ExtractionError { attempts });
    }

    match braces::first_object(&stripped) {
        Some(candidate) => {
            for &(stage, provenance, parse) in &PARSE_STAGES {
                match parse(candidate).and_then(&accept) {
                    Ok(value) => return Ok(Extracted { value, provenance }),
                    Err(reason) => attempts.push(StageFailure::new(stage, reason)),
                }
            }
        }
        None => attempts.push(StageFailure::new(Stage::BraceMatch, "no `{` in response")),
    }

    if let Some(recover) = recover {
        match recover(&stripped) {
            Ok(value) => {
                tracing::debug!(
                    failed_stages = attempts.len(),
                    "structured output recovered by regex fallback"
                );
                return Ok(Extracted {
                    value,
                    provenance: Provenance::RegexFallback,
                });
            }
            Err(reason) => attempts.push(StageFailure::new(Stage::RegexFallback, reason)),
        }
    }

    Err(ExtractionError { attempts })
}

/// Extract the first JSON object in `text`.
///
/// # Errors
///
/// Returns [`ExtractionError`] if no stage yields a complete object.
pub fn extract_object(text: &str) -> Result<Extracted<Value>, ExtractionError> {
    run(text, Ok, None)
}

/// Extract a validated `{"competitors": [...]}` list.
///
/// This is the only payload with a regex fallback; recovered items still
/// have to pass field validation.
///
/// # Errors
///
/// Returns [`ExtractionError`] if the list is missing, empty, or any item
/// lacks a plausible `name`, `domain`, `industry` or `relevance`.
pub fn extract_competitors(
    text: &str,
) -> Result<Extracted<Vec<CompetitorSuggestion>>, ExtractionError> {
    run(text, |v| validate::competitors(&v), Some(fallback::competitors))
}

/// Extract per-entity mention counts from any recognized counting shape.
///
/// # Errors
///
/// Returns [`ExtractionError`] if the payload is not a counting shape or a
/// count is not a non-negative integer.
pub fn extract_mention_counts(text: &str) -> Result<Extracted<MentionCounts>, ExtractionError> {
    run(text, |v| LlmPayload::classify(v).mention_counts(), None)
}

/// Extract a `{"products": [...]}` list of product names.
///
/// Non-string and blank entries are dropped. An empty list is a valid answer.
///
/// # Errors
///
/// Returns [`ExtractionError`] if there is no `products` array.
pub fn extract_product_names(text: &str) -> Result<Extracted<Vec<String>>, ExtractionError> {
    run(
        text,
        |v| {
            let items = v
                .get("products")
                .and_then(Value::as_array)
                .ok_or_else(|| "missing `products` array".to_string())?;
            Ok(items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect())
        },
        None,
    )
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
