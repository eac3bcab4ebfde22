//! Completeness and payload-level validation applied after every parse.

use serde_json::Value;

use super::braces::balance;
use super::CompetitorSuggestion;

/// Shortest accepted value for a competitor field after trimming.
const MIN_FIELD_CHARS: usize = 2;

/// Reject text that parsed but still looks cut off.
pub(crate) fn check_complete(text: &str) -> Result<(), String> {
    let trimmed = text.trim_end();
    if !(trimmed.ends_with('}') || trimmed.ends_with(']')) {
        return Err("payload does not end with `}` or `]`".to_string());
    }
    let counts = balance(trimmed);
    if !counts.is_balanced() {
        return Err(format!(
            "unbalanced payload (braces {:+}, brackets {:+})",
            counts.braces, counts.brackets
        ));
    }
    Ok(())
}

/// Validate a `{"competitors": [...]}` payload.
pub(crate) fn competitors(value: &Value) -> Result<Vec<CompetitorSuggestion>, String> {
    let items = value
        .get("competitors")
        .and_then(Value::as_array)
        .ok_or_else(|| "missing `competitors` array".to_string())?;
    if items.is_empty() {
        return Err("competitor list is empty".to_string());
    }
    items
        .iter()
        .enumerate()
        .map(|(i, item)| competitor(item).map_err(|reason| format!("competitor {i}: {reason}")))
        .collect()
}

/// Validate one competitor object; every field must be present and plausible.
pub(crate) fn competitor(item: &Value) -> Result<CompetitorSuggestion, String> {
    Ok(CompetitorSuggestion {
        name: field(item, "name")?,
        domain: field(item, "domain")?,
        industry: field(item, "industry")?,
        relevance: field(item, "relevance")?,
    })
}

fn field(item: &Value, name: &str) -> Result<String, String> {
    let raw = item
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing `{name}`"))?;
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_FIELD_CHARS {
        return Err(format!("`{name}` is too short: {raw:?}"));
    }
    Ok(trimmed.to_string())
}
