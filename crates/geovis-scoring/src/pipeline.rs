//! Hybrid answer scoring: local matching for positions and sentences, LLM
//! counts for mention totals.

use futures::stream::{self, StreamExt};
use geovis_core::{normalize_form, AliasSet};
use geovis_llm::{
    extract_mention_counts, extract_product_names, ExtractionError, LlmError, MentionCounts,
    ProviderChain,
};

use crate::error::ScoringError;
use crate::lexicon::SentimentLexicon;
use crate::matcher::find_occurrences_with_sentences;
use crate::metrics::{share_of_answers, visibility_index, ScoringWeights};
use crate::prompts::{counts_request, products_request};
use crate::tokenizer::TextUnit;
use crate::types::{AnswerInput, Occurrence, ScoreRow, SentimentSentences};

/// Upper bound on LLM-suggested product names merged into the brand aliases.
pub const MAX_PRODUCT_NAMES: usize = 20;

const MIN_PRODUCT_NAME_CHARS: usize = 2;
const DEFAULT_MAX_TOKENS: u32 = 500;

/// Scores answers against a brand and its competitors.
///
/// Build once and share by reference; scoring holds no mutable state.
pub struct HybridScorer {
    chain: Option<ProviderChain>,
    weights: ScoringWeights,
    lexicon: SentimentLexicon,
    max_tokens: u32,
}

/// One entity's local measurements plus the count used for metrics.
struct Measured {
    occurrence: Occurrence,
    sentences: Vec<String>,
    mentions: u64,
}

/// Metrics for one side of a score row.
struct Side {
    visibility_index: Option<f64>,
    sentiment: Option<f64>,
    sentences: SentimentSentences,
}

impl HybridScorer {
    #[must_use]
    pub fn new(chain: ProviderChain) -> Self {
        Self {
            chain: Some(chain),
            weights: ScoringWeights::default(),
            lexicon: SentimentLexicon::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// A scorer with no providers; only [`HybridScorer::score_answer_local`] succeeds.
    #[must_use]
    pub fn local_only() -> Self {
        Self {
            chain: None,
            weights: ScoringWeights::default(),
            lexicon: SentimentLexicon::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    #[must_use]
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.weights = weights;
        self
    }

    #[must_use]
    pub fn with_lexicon(mut self, lexicon: SentimentLexicon) -> Self {
        self.lexicon = lexicon;
        self
    }

    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Score one answer, using the provider chain for mention counts.
    ///
    /// 1. Reject unscoreable input.
    /// 2. Ask for brand product names and merge them into the brand aliases;
    ///    failure here only loses the extra names.
    /// 3. Match every entity locally for positions and sentences.
    /// 4. Ask for mention counts; entities missing from the reply keep their
    ///    local count. A reply counting any entity more often than the answer
    ///    has words is rejected and the next provider is tried.
    /// 5. Emit one row per competitor.
    ///
    /// # Errors
    ///
    /// - [`ScoringError::EmptyAnswer`], [`ScoringError::NoCompetitors`],
    ///   [`ScoringError::NoWords`] for unscoreable input.
    /// - [`ScoringError::Llm`] when no provider returned usable counts.
    pub async fn score_answer(&self, input: &AnswerInput) -> Result<Vec<ScoreRow>, ScoringError> {
        let unit = prepare(input)?;
        let Some(chain) = &self.chain else {
            return Err(ScoringError::Llm(LlmError::NoProviders));
        };

        let products = self.extract_products(chain, input).await;
        let brand = input.brand.with_products(&products);

        let brand_local = measure(&unit, &brand);
        let competitors_local: Vec<(Occurrence, Vec<String>)> = input
            .competitors
            .iter()
            .map(|c| measure(&unit, c))
            .collect();

        let total_words = unit.total_words();
        let request = counts_request(&brand, &input.competitors, unit.raw(), self.max_tokens);
        let response = chain
            .complete_with(&request, |text| {
                let extracted = extract_mention_counts(text)?;
                check_counts(&extracted.value, &brand, &input.competitors, total_words)?;
                Ok(extracted)
            })
            .await?;
        let counts = response.value.value;
        tracing::debug!(
            brand = %input.brand.name(),
            provider = %response.provider,
            provenance = response.value.provenance.as_str(),
            entities = counts.len(),
            "mention counts received"
        );

        let brand_llm = brand_count(&counts, &brand);
        let brand = resolve(&brand, brand_local, brand_llm);
        let competitors: Vec<Measured> = input
            .competitors
            .iter()
            .zip(competitors_local)
            .map(|(set, local)| resolve(set, local, llm_count(&counts, set)))
            .collect();

        let rows = self.rows(input, &unit, &brand, &competitors, Some(&response.provider));
        tracing::info!(
            brand = %input.brand.name(),
            collector = %input.collector_type,
            provider = %response.provider,
            rows = rows.len(),
            total_words,
            "answer scored"
        );
        Ok(rows)
    }

    /// Score one answer from local matching alone, with no LLM calls.
    ///
    /// # Errors
    ///
    /// Returns the same unscoreable-input errors as [`HybridScorer::score_answer`].
    pub fn score_answer_local(&self, input: &AnswerInput) -> Result<Vec<ScoreRow>, ScoringError> {
        let unit = prepare(input)?;
        let as_local = |set: &AliasSet| {
            let (occurrence, sentences) = measure(&unit, set);
            Measured {
                mentions: occurrence.count() as u64,
                occurrence,
                sentences,
            }
        };

        let brand = as_local(&input.brand);
        let competitors: Vec<Measured> = input.competitors.iter().map(as_local).collect();
        Ok(self.rows(input, &unit, &brand, &competitors, None))
    }

    /// Score many answers, at most `concurrency` at a time.
    ///
    /// Results come back in input order; one failure never stops the others.
    pub async fn score_batch(
        &self,
        inputs: &[AnswerInput],
        concurrency: usize,
    ) -> Vec<Result<Vec<ScoreRow>, ScoringError>> {
        let mut results = stream::iter(inputs.iter().enumerate().map(|(i, input)| async move {
            (i, self.score_answer(input).await)
        }))
        .buffer_unordered(concurrency.max(1))
        .collect::<Vec<_>>()
        .await;

        results.sort_by_key(|(i, _)| *i);

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        if failed > 0 {
            tracing::warn!(total = inputs.len(), failed, "some answers could not be scored");
        }
        results.into_iter().map(|(_, r)| r).collect()
    }

    async fn extract_products(&self, chain: &ProviderChain, input: &AnswerInput) -> Vec<String> {
        let request = products_request(&input.brand, &input.answer, self.max_tokens);
        match chain.complete_with(&request, extract_product_names).await {
            Ok(response) => {
                let names = filter_product_names(response.value.value, &input.competitors);
                tracing::debug!(
                    brand = %input.brand.name(),
                    provider = %response.provider,
                    products = names.len(),
                    "product names extracted"
                );
                names
            }
            Err(e) => {
                tracing::warn!(
                    brand = %input.brand.name(),
                    error = %e,
                    "product name extraction failed; scoring without extra product terms"
                );
                Vec::new()
            }
        }
    }

    fn side(&self, measured: &Measured, total_words: usize) -> Side {
        Side {
            visibility_index: visibility_index(
                measured.mentions,
                measured.occurrence.first_position(),
                total_words,
                &self.weights,
            ),
            sentiment: self.lexicon.sentiment_score(&measured.sentences),
            sentences: self.lexicon.extract_sentiment_sentences(&measured.sentences),
        }
    }

    fn rows(
        &self,
        input: &AnswerInput,
        unit: &TextUnit,
        brand: &Measured,
        competitors: &[Measured],
        provider: Option<&str>,
    ) -> Vec<ScoreRow> {
        let total_words = unit.total_words();
        let brand_side = self.side(brand, total_words);

        input
            .competitors
            .iter()
            .zip(competitors)
            .map(|(set, competitor)| {
                let competitor_side = self.side(competitor, total_words);
                ScoreRow {
                    brand_name: input.brand.name().to_string(),
                    competitor_name: set.name().to_string(),
                    collector_type: input.collector_type.clone(),
                    visibility_index: brand_side.visibility_index,
                    visibility_index_competitor: competitor_side.visibility_index,
                    sentiment_score: brand_side.sentiment,
                    sentiment_score_competitor: competitor_side.sentiment,
                    share_of_answers: share_of_answers(brand.mentions, competitor.mentions),
                    share_of_answers_competitor: share_of_answers(
                        competitor.mentions,
                        brand.mentions,
                    ),
                    brand_mentions: brand.mentions,
                    competitor_mentions: competitor.mentions,
                    brand_positions: brand.occurrence.positions().to_vec(),
                    competitor_positions: competitor.occurrence.positions().to_vec(),
                    brand_sentences: brand_side.sentences.clone(),
                    competitor_sentences: competitor_side.sentences,
                    total_words,
                    count_provider: provider.map(str::to_string),
                }
            })
            .collect()
    }
}

fn prepare(input: &AnswerInput) -> Result<TextUnit, ScoringError> {
    if input.answer.trim().is_empty() {
        return Err(ScoringError::EmptyAnswer);
    }
    if input.competitors.is_empty() {
        return Err(ScoringError::NoCompetitors);
    }
    let unit = TextUnit::new(input.answer.as_str());
    if unit.total_words() == 0 {
        return Err(ScoringError::NoWords);
    }
    Ok(unit)
}

fn measure(unit: &TextUnit, set: &AliasSet) -> (Occurrence, Vec<String>) {
    find_occurrences_with_sentences(unit, set)
}

/// Count for any form of `set`, canonical name first.
fn llm_count(counts: &MentionCounts, set: &AliasSet) -> Option<u64> {
    std::iter::once(set.name())
        .chain(set.forms().iter().map(String::as_str))
        .find_map(|form| counts.get(form))
}

fn brand_count(counts: &MentionCounts, brand: &AliasSet) -> Option<u64> {
    llm_count(counts, brand).or(counts.brand(brand.name()))
}

/// Reject counts that exceed the number of words in the answer.
fn check_counts(
    counts: &MentionCounts,
    brand: &AliasSet,
    competitors: &[AliasSet],
    total_words: usize,
) -> Result<(), ExtractionError> {
    let counted = std::iter::once((brand, brand_count(counts, brand)))
        .chain(competitors.iter().map(|set| (set, llm_count(counts, set))));
    for (set, count) in counted {
        if let Some(count) = count.filter(|&c| c > total_words as u64) {
            return Err(ExtractionError::implausible(format!(
                "{} counted {count} times in {total_words} words",
                set.name()
            )));
        }
    }
    Ok(())
}

fn resolve(
    set: &AliasSet,
    (occurrence, sentences): (Occurrence, Vec<String>),
    llm_count: Option<u64>,
) -> Measured {
    let mentions = match llm_count {
        Some(count) => count,
        None => {
            tracing::debug!(
                entity = %set.name(),
                local = occurrence.count(),
                "entity missing from LLM counts; using local count"
            );
            occurrence.count() as u64
        }
    };
    Measured {
        occurrence,
        sentences,
        mentions,
    }
}

/// Normalize LLM-suggested product names and drop anything unusable.
///
/// Names shorter than two characters, names that are a competitor's alias,
/// and duplicates are removed; at most [`MAX_PRODUCT_NAMES`] survive.
fn filter_product_names(names: Vec<String>, competitors: &[AliasSet]) -> Vec<String> {
    let mut kept: Vec<String> = Vec::new();
    for name in names {
        let name = normalize_form(&name);
        if name.chars().count() < MIN_PRODUCT_NAME_CHARS
            || competitors.iter().any(|c| c.contains(&name))
            || kept.contains(&name)
        {
            continue;
        }
        kept.push(name);
        if kept.len() == MAX_PRODUCT_NAMES {
            break;
        }
    }
    kept
}

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod tests;
