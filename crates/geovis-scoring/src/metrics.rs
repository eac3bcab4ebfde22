//! Visibility Index and Share of Answers.

/// Weights of the two Visibility Index terms.
///
/// The defaults are calibration values, not derived constants.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoringWeights {
    pub prominence: f64,
    pub density: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            prominence: 0.6,
            density: 0.4,
        }
    }
}

/// `1 / log10(first_position + 9)`; exactly `1.0` at position 1.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn prominence(first_position: usize) -> f64 {
    1.0 / (first_position as f64 + 9.0).log10()
}

/// Weighted blend of prominence and density.
///
/// Returns `None` when there are no words to score, `Some(0.0)` when the
/// entity was not mentioned. When mentions were counted but none could be
/// placed (`first_position` is `None`), prominence is taken at the last word.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn visibility_index(
    occurrences: u64,
    first_position: Option<usize>,
    total_words: usize,
    weights: &ScoringWeights,
) -> Option<f64> {
    if total_words == 0 {
        return None;
    }
    if occurrences == 0 {
        return Some(0.0);
    }
    let first = first_position.unwrap_or(total_words).max(1);
    let density = occurrences as f64 / total_words as f64;
    Some(weights.prominence * prominence(first) + weights.density * density)
}

/// `100 * a / (a + b)`, or `None` when neither side was mentioned.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn share_of_answers(a: u64, b: u64) -> Option<f64> {
    let total = a.saturating_add(b);
    if total == 0 {
        return None;
    }
    Some(100.0 * a as f64 / total as f64)
}
