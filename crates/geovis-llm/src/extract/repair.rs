//! Bounded textual repairs for almost-JSON.

use std::sync::LazyLock;

use regex::Regex;

static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
static ADJACENT_OBJECTS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\}\s*\{").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Apply the fixed repair set: quote normalization, whitespace collapse,
/// trailing-comma removal, and comma insertion between adjacent objects.
///
/// Whitespace collapse also folds raw newlines inside strings, which strict
/// JSON rejects.
pub(crate) fn clean(text: &str) -> String {
    let quotes = normalize_quotes(text);
    let collapsed = WHITESPACE.replace_all(quotes.trim(), " ");
    let no_trailing = TRAILING_COMMA.replace_all(&collapsed, "$1");
    ADJACENT_OBJECTS
        .replace_all(&no_trailing, "},{")
        .into_owned()
}

fn normalize_quotes(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{2033}' => '"',
            '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{2032}' => '\'',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn removes_trailing_commas() {
        assert_eq!(clean(r#"{"a": [1, 2,], }"#), r#"{"a": [1, 2]}"#);
    }

    #[test]
    fn normalizes_smart_quotes() {
        assert_eq!(clean("{\u{201C}a\u{201D}: 1}"), r#"{"a": 1}"#);
    }

    #[test]
    fn collapses_whitespace_and_newlines() {
        assert_eq!(clean("{\n  \"a\":\n\t1\n}"), r#"{ "a": 1 }"#);
    }

    #[test]
    fn inserts_comma_between_adjacent_objects() {
        assert_eq!(clean(r#"[{"a": 1} {"b": 2}]"#), r#"[{"a": 1},{"b": 2}]"#);
    }

    #[test]
    fn cleaned_output_parses() {
        let repaired = clean("{\u{201C}items\u{201D}: [{\"x\": 1}\n{\"x\": 2},],}");
        let value: serde_json::Value = serde_json::from_str(&repaired).expect("should parse");
        assert_eq!(value["items"].as_array().map(Vec::len), Some(2));
    }
}
