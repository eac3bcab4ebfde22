//! Removal of generation artifacts around a JSON payload.

/// End-of-generation markers some models leak into their output.
const END_TOKENS: &[&str] = &["<|endoftext|>", "<|im_end|>", "<|eot_id|>", "<|end|>", "</s>"];

const FENCE: &str = "```";

/// Strip end-of-generation tokens and Markdown code fences.
///
/// When a fence is present, only the fenced body is kept (the language tag
/// line is dropped). An unterminated fence keeps everything after it, which
/// is what a response cut off by a token limit looks like.
pub(crate) fn strip_framing(text: &str) -> String {
    let mut cleaned = text.to_string();
    for token in END_TOKENS {
        if cleaned.contains(token) {
            cleaned = cleaned.replace(token, "");
        }
    }
    strip_code_fence(&cleaned).trim().to_string()
}

fn strip_code_fence(text: &str) -> &str {
    let Some(open) = text.find(FENCE) else {
        return text;
    };
    let after_fence = &text[open + FENCE.len()..];

    // Drop the info string (`json`, `JSON`, ...) up to the end of the line.
    let body = match after_fence.find('\n') {
        Some(nl) if !after_fence[..nl].contains('{') => &after_fence[nl + 1..],
        _ => after_fence,
    };

    match body.find(FENCE) {
        Some(close) => &body[..close],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_json_is_untouched() {
        assert_eq!(strip_framing(r#"  {"a": 1}  "#), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_end_of_text_token() {
        assert_eq!(strip_framing(r#"{"a": 1} <|endoftext|>"#), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_multiple_token_kinds() {
        assert_eq!(strip_framing("{}<|im_end|></s>"), "{}");
    }

    #[test]
    fn strips_json_fence() {
        let text = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks!";
        assert_eq!(strip_framing(text), r#"{"a": 1}"#);
    }

    #[test]
    fn strips_bare_fence() {
        assert_eq!(strip_framing("```\n{\"a\": 1}\n```"), r#"{"a": 1}"#);
    }

    #[test]
    fn unterminated_fence_keeps_tail() {
        assert_eq!(
            strip_framing("```json\n{\"a\": [1, 2"),
            "{\"a\": [1, 2"
        );
    }

    #[test]
    fn fence_with_json_on_same_line() {
        assert_eq!(strip_framing("```{\"a\": 1}```"), r#"{"a": 1}"#);
    }
}
