//! Last-resort recovery of competitor lists from text that never parses.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::{validate, CompetitorSuggestion};

static FIELD_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""(name|domain|industry|relevance)"\s*:\s*"((?:[^"\\]|\\.)*)""#)
        .expect("valid regex")
});

/// Pull `"key": "value"` pairs out of `text` and group them into items.
///
/// A new item starts whenever a key repeats within the current one. Every
/// recovered item must pass the same field validation as a parsed payload;
/// one bad item fails the whole fallback.
pub(crate) fn competitors(text: &str) -> Result<Vec<CompetitorSuggestion>, String> {
    let mut groups: Vec<Map<String, Value>> = Vec::new();
    let mut current = Map::new();

    for caps in FIELD_PAIR.captures_iter(text) {
        let key = caps[1].to_string();
        if current.contains_key(&key) {
            groups.push(std::mem::take(&mut current));
        }
        current.insert(key, Value::String(unescape(&caps[2])));
    }
    if !current.is_empty() {
        groups.push(current);
    }

    if groups.is_empty() {
        return Err("no competitor fields found".to_string());
    }

    groups
        .into_iter()
        .enumerate()
        .map(|(i, group)| {
            validate::competitor(&Value::Object(group))
                .map_err(|reason| format!("recovered item {i}: {reason}"))
        })
        .collect()
}

fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{raw}\"")).unwrap_or_else(|_| raw.to_string())
}
