//! The payload shapes LLMs actually return for counting prompts.
//!
//! A response is classified once into [`LlmPayload`]; consumers match on the
//! variant instead of probing keys.

use std::collections::BTreeMap;

use geovis_core::normalize_form;
use serde::Serialize;
use serde_json::{Map, Value};

const BRAND_METRICS_KEY: &str = "brand_metrics";
const COMPETITORS_KEY: &str = "competitors";
const SCORES_KEY: &str = "scores";

/// Keys under which a nested metrics object may carry its count.
const COUNT_KEYS: [&str; 3] = ["mentions", "mention_count", "count"];

#[derive(Debug, Clone, PartialEq)]
pub enum LlmPayload {
    /// `{"brand_metrics": {...}, "competitors": [{...}, ...]}`
    BrandIntelligence {
        brand_metrics: Value,
        competitors: Vec<Value>,
    },
    /// `{"scores": {"Name": n, ...}}`
    Scores(Map<String, Value>),
    /// `{"Name": n, ...}`
    FlatCounts(Map<String, Value>),
    /// A top-level array.
    FlatArray(Vec<Value>),
    Unrecognized(Value),
}

impl LlmPayload {
    #[must_use]
    pub fn classify(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::FlatArray(items),
            Value::Object(map) => Self::classify_object(map),
            other => Self::Unrecognized(other),
        }
    }

    fn classify_object(mut map: Map<String, Value>) -> Self {
        if map.contains_key(BRAND_METRICS_KEY)
            && map.get(COMPETITORS_KEY).is_some_and(Value::is_array)
        {
            let brand_metrics = map.remove(BRAND_METRICS_KEY).unwrap_or_default();
            let competitors = match map.remove(COMPETITORS_KEY) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            };
            return Self::BrandIntelligence {
                brand_metrics,
                competitors,
            };
        }

        if map.get(SCORES_KEY).is_some_and(Value::is_object) {
            if let Some(Value::Object(scores)) = map.remove(SCORES_KEY) {
                return Self::Scores(scores);
            }
        }

        if !map.is_empty() && map.values().all(|v| parse_count(v).is_some()) {
            return Self::FlatCounts(map);
        }

        Self::Unrecognized(Value::Object(map))
    }

    /// Short label for logs and diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BrandIntelligence { .. } => "brand_intelligence",
            Self::Scores(_) => "scores",
            Self::FlatCounts(_) => "flat_counts",
            Self::FlatArray(_) => "flat_array",
            Self::Unrecognized(_) => "unrecognized",
        }
    }

    /// Derive per-entity mention counts.
    ///
    /// # Errors
    ///
    /// Returns a reason string when the shape carries no counts, or any count
    /// is not a non-negative integer.
    pub fn mention_counts(&self) -> Result<MentionCounts, String> {
        match self {
            Self::Scores(map) | Self::FlatCounts(map) => {
                let mut counts = MentionCounts::default();
                for (name, value) in map {
                    counts.insert(name, count_of(value, name)?);
                }
                Ok(counts)
            }
            Self::BrandIntelligence {
                brand_metrics,
                competitors,
            } => {
                let mut counts = MentionCounts {
                    brand: Some(count_of(brand_metrics, BRAND_METRICS_KEY)?),
                    ..MentionCounts::default()
                };
                if let (Some(name), Some(n)) =
                    (brand_metrics.get("name").and_then(Value::as_str), counts.brand)
                {
                    counts.insert(name, n);
                }
                for (i, competitor) in competitors.iter().enumerate() {
                    let name = competitor
                        .get("name")
                        .and_then(Value::as_str)
                        .ok_or_else(|| format!("competitor {i} has no name"))?;
                    counts.insert(name, count_of(competitor, name)?);
                }
                Ok(counts)
            }
            Self::FlatArray(_) | Self::Unrecognized(_) => {
                Err(format!("payload shape `{}` carries no counts", self.kind()))
            }
        }
    }
}

/// Mention counts keyed by normalized entity name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MentionCounts {
    /// Brand count from a `brand_metrics` block, which may not name the brand.
    brand: Option<u64>,
    by_name: BTreeMap<String, u64>,
}

impl MentionCounts {
    fn insert(&mut self, name: &str, count: u64) {
        let key = normalize_form(name);
        if !key.is_empty() {
            self.by_name.insert(key, count);
        }
    }

    /// Count for `name`, matched case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<u64> {
        self.by_name.get(&normalize_form(name)).copied()
    }

    /// Brand count: by name first, then an unnamed `brand_metrics` block.
    #[must_use]
    pub fn brand(&self, brand_name: &str) -> Option<u64> {
        self.get(brand_name).or(self.brand)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty() && self.brand.is_none()
    }
}

impl<S: AsRef<str>> FromIterator<(S, u64)> for MentionCounts {
    fn from_iter<I: IntoIterator<Item = (S, u64)>>(iter: I) -> Self {
        let mut counts = Self::default();
        for (name, n) in iter {
            counts.insert(name.as_ref(), n);
        }
        counts
    }
}

fn count_of(value: &Value, label: &str) -> Result<u64, String> {
    let raw = match value {
        Value::Object(fields) => COUNT_KEYS
            .iter()
            .find_map(|k| fields.get(*k))
            .ok_or_else(|| format!("`{label}` has no mention count"))?,
        other => other,
    };
    parse_count(raw).ok_or_else(|| format!("count for `{label}` is not a non-negative integer: {raw}"))
}

/// A non-negative integer, as a JSON number or numeric string.
///
/// Whole floats like `3.0` are accepted; `2.5`, negatives and non-numbers are not.
#[must_use]
pub fn parse_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_float)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(whole_float))
        }
        _ => None,
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::float_cmp
)]
fn whole_float(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then(|| f as u64)
}
