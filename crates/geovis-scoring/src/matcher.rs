//! Token-sequence matching of alias sets against an answer.

use geovis_core::AliasSet;

use crate::tokenizer::{tokenize, TextUnit};
use crate::types::Occurrence;

/// Token patterns for every form in `aliases`, longest first.
///
/// Duplicate token sequences are dropped. The sort is stable, so patterns of
/// equal length keep alias-set order.
fn alias_patterns(aliases: &AliasSet) -> Vec<Vec<String>> {
    let mut patterns: Vec<Vec<String>> = Vec::new();
    for form in aliases.forms() {
        let tokens = tokenize(form);
        if !tokens.is_empty() && !patterns.contains(&tokens) {
            patterns.push(tokens);
        }
    }
    patterns.sort_by(|a, b| b.len().cmp(&a.len()));
    patterns
}

/// Find every non-overlapping mention of `aliases` in `tokens`.
///
/// At each index the first (longest) pattern that matches wins; the scan then
/// skips past the matched span. Positions are 1-based.
#[must_use]
pub fn find_occurrences(tokens: &[String], aliases: &AliasSet) -> Occurrence {
    let patterns = alias_patterns(aliases);
    let mut positions = Vec::new();
    let mut i = 0;

    while i < tokens.len() {
        match patterns
            .iter()
            .find(|p| tokens[i..].starts_with(p.as_slice()))
        {
            Some(pattern) => {
                positions.push(i + 1);
                i += pattern.len();
            }
            None => i += 1,
        }
    }

    Occurrence::from_positions(positions)
}

/// Like [`find_occurrences`], plus the sentences containing each mention.
///
/// Sentences are deduplicated and returned in first-seen order.
#[must_use]
pub fn find_occurrences_with_sentences(
    unit: &TextUnit,
    aliases: &AliasSet,
) -> (Occurrence, Vec<String>) {
    let occurrence = find_occurrences(unit.tokens(), aliases);
    let sentences = unit.sentences();
    let mut matched: Vec<String> = Vec::new();

    for &position in occurrence.positions() {
        let index = position - 1;
        if let Some(sentence) = sentences.iter().find(|s| s.covers(index)) {
            if !matched.iter().any(|m| m == sentence.text) {
                matched.push(sentence.text.to_string());
            }
        }
    }

    (occurrence, matched)
}
