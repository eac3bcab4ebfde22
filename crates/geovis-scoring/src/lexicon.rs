//! Keyword lexicon for sentence-level sentiment about a brand.

use crate::types::SentimentSentences;

/// Default positive keywords.
///
/// Matched as case-insensitive substrings, so entries avoid being substrings
/// of common negative words (no "reliable", which sits inside "unreliable",
/// and no "leading", which sits inside "misleading").
pub const POSITIVE_KEYWORDS: &[&str] = &[
    "great",
    "excellent",
    "best",
    "good",
    "love",
    "recommend",
    "trusted",
    "dependable",
    "innovative",
    "popular",
    "outstanding",
    "impressive",
    "favorite",
    "favourite",
    "high quality",
    "high-quality",
    "top-rated",
    "affordable",
    "superior",
    "standout",
    "praised",
];

/// Default negative keywords.
pub const NEGATIVE_KEYWORDS: &[&str] = &[
    "bad",
    "poor",
    "worst",
    "terrible",
    "awful",
    "avoid",
    "overpriced",
    "unreliable",
    "complaint",
    "lawsuit",
    "recall",
    "scam",
    "disappointing",
    "inferior",
    "outdated",
    "criticized",
    "criticised",
    "problem",
    "faulty",
    "misleading",
    "lacks",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

/// Positive and negative keyword lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentimentLexicon {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl Default for SentimentLexicon {
    fn default() -> Self {
        Self::new(POSITIVE_KEYWORDS, NEGATIVE_KEYWORDS)
    }
}

impl SentimentLexicon {
    /// Build a lexicon from custom lists. Keywords are lowercased; blanks dropped.
    #[must_use]
    pub fn new<S: AsRef<str>>(positive: &[S], negative: &[S]) -> Self {
        let clean = |words: &[S]| {
            words
                .iter()
                .map(|w| w.as_ref().trim().to_lowercase())
                .filter(|w| !w.is_empty())
                .collect::<Vec<String>>()
        };
        Self {
            positive: clean(positive),
            negative: clean(negative),
        }
    }

    /// A sentence with only positive keywords is positive, only negative is
    /// negative; both or neither is neutral.
    #[must_use]
    pub fn classify(&self, sentence: &str) -> Polarity {
        let lower = sentence.to_lowercase();
        let positive = self.positive.iter().any(|k| lower.contains(k.as_str()));
        let negative = self.negative.iter().any(|k| lower.contains(k.as_str()));
        match (positive, negative) {
            (true, false) => Polarity::Positive,
            (false, true) => Polarity::Negative,
            _ => Polarity::Neutral,
        }
    }

    /// `(positive - negative) / sentences`, or `None` with no sentences.
    ///
    /// No sentences means the entity was never placed in the answer, which is
    /// reported differently from a neutral mention (`Some(0.0)`).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sentiment_score<S: AsRef<str>>(&self, sentences: &[S]) -> Option<f64> {
        if sentences.is_empty() {
            return None;
        }
        let net: i64 = sentences
            .iter()
            .map(|s| match self.classify(s.as_ref()) {
                Polarity::Positive => 1,
                Polarity::Negative => -1,
                Polarity::Neutral => 0,
            })
            .sum();
        Some(net as f64 / sentences.len() as f64)
    }

    /// The literal positive and negative sentences, in input order.
    #[must_use]
    pub fn extract_sentiment_sentences<S: AsRef<str>>(
        &self,
        sentences: &[S],
    ) -> SentimentSentences {
        let mut out = SentimentSentences::default();
        for sentence in sentences {
            let sentence = sentence.as_ref();
            match self.classify(sentence) {
                Polarity::Positive => out.positive.push(sentence.to_string()),
                Polarity::Negative => out.negative.push(sentence.to_string()),
                Polarity::Neutral => {}
            }
        }
        out
    }
}
