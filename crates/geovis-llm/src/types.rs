//! Chat-completion request and response types.
//!
//! Providers speak the OpenAI-compatible envelope. The response side is
//! deliberately loose: every field is optional so that odd-but-valid bodies
//! surface as "empty content" rather than a deserialization failure.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// A provider-agnostic completion request.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub messages: Vec<ChatMessage>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Deterministic single-turn request with a system instruction.
    #[must_use]
    pub fn new(system: &str, user: &str, max_tokens: u32) -> Self {
        Self {
            messages: vec![ChatMessage::system(system), ChatMessage::user(user)],
            temperature: 0.0,
            max_tokens,
        }
    }
}

/// Body posted to `{base}/chat/completions`.
#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionBody<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    pub temperature: f32,
    pub max_tokens: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Choice {
    #[serde(default)]
    pub message: Option<ChoiceMessage>,
    /// Legacy completions-style payload.
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of the first choice: `message.content`, else `text`.
    ///
    /// Returns `None` when there is no choice or the text is blank.
    pub(crate) fn first_text(self) -> Option<String> {
        let choice = self.choices.into_iter().next()?;
        choice
            .message
            .and_then(|m| m.content)
            .filter(|c| !c.trim().is_empty())
            .or(choice.text)
            .filter(|c| !c.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(body: &str) -> ChatCompletionResponse {
        serde_json::from_str(body).expect("envelope should parse")
    }

    #[test]
    fn first_text_prefers_message_content() {
        let resp = parse(r#"{"choices":[{"message":{"content":"hello"},"text":"legacy"}]}"#);
        assert_eq!(resp.first_text().as_deref(), Some("hello"));
    }

    #[test]
    fn first_text_falls_back_to_text() {
        let resp = parse(r#"{"choices":[{"text":"legacy"}]}"#);
        assert_eq!(resp.first_text().as_deref(), Some("legacy"));
    }

    #[test]
    fn first_text_blank_content_uses_text() {
        let resp = parse(r#"{"choices":[{"message":{"content":"  "},"text":"legacy"}]}"#);
        assert_eq!(resp.first_text().as_deref(), Some("legacy"));
    }

    #[test]
    fn first_text_empty_choices_is_none() {
        assert!(parse(r#"{"choices":[]}"#).first_text().is_none());
        assert!(parse("{}").first_text().is_none());
    }

    #[test]
    fn first_text_null_content_is_none() {
        let resp = parse(r#"{"choices":[{"message":{"content":null}}]}"#);
        assert!(resp.first_text().is_none());
    }

    #[test]
    fn request_body_serializes_openai_shape() {
        let messages = vec![ChatMessage::user("hi")];
        let body = ChatCompletionBody {
            model: "m",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 10,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "m");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["max_tokens"], 10);
    }
}
