//! HTTP client for OpenAI-compatible chat-completion providers.
//!
//! Wraps `reqwest` with bearer auth, a per-request timeout, and a lenient
//! reading of the completion envelope. Any non-2xx status becomes
//! [`LlmError::UnexpectedStatus`]; a response without text becomes
//! [`LlmError::EmptyContent`].

use std::time::Duration;

use async_trait::async_trait;
use geovis_core::ProviderConfig;
use reqwest::{Client, Url};

use crate::error::LlmError;
use crate::provider::CompletionProvider;
use crate::types::{ChatCompletionBody, ChatCompletionResponse, CompletionRequest};

/// Client for one chat-completion provider.
///
/// Use [`ChatClient::from_config`] for production or
/// [`ChatClient::with_base_url`] to point at a mock server in tests.
pub struct ChatClient {
    client: Client,
    name: String,
    model: String,
    api_key: String,
    endpoint: Url,
}

impl ChatClient {
    /// Creates a client from a configured provider entry.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed, or [`LlmError::InvalidBaseUrl`] if the configured base URL
    /// is invalid.
    pub fn from_config(config: &ProviderConfig, timeout_secs: u64) -> Result<Self, LlmError> {
        Self::with_base_url(
            &config.name,
            &config.api_key,
            &config.model,
            timeout_secs,
            &config.base_url,
        )
    }

    /// Creates a client with an explicit base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Http`] if the underlying `reqwest::Client` cannot be
    /// constructed, or [`LlmError::InvalidBaseUrl`] if `base_url` is not a
    /// valid URL.
    pub fn with_base_url(
        name: &str,
        api_key: &str,
        model: &str,
        timeout_secs: u64,
        base_url: &str,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("geovis/0.1 (answer-scoring)")
            .build()?;

        // A single trailing slash makes `join` append rather than replace the
        // last path segment (`/v1` + `chat/completions`).
        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&normalised)
            .and_then(|base| base.join("chat/completions"))
            .map_err(|e| LlmError::InvalidBaseUrl {
                provider: name.to_string(),
                reason: format!("'{base_url}': {e}"),
            })?;

        Ok(Self {
            client,
            name: name.to_string(),
            model: model.to_string(),
            api_key: api_key.to_string(),
            endpoint,
        })
    }

    /// Full URL requests are posted to.
    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Sends one completion request and returns the first choice's text.
    ///
    /// # Errors
    ///
    /// - [`LlmError::Http`] on network failure.
    /// - [`LlmError::UnexpectedStatus`] on a non-2xx HTTP status.
    /// - [`LlmError::Deserialize`] if the body is not a JSON envelope.
    /// - [`LlmError::EmptyContent`] if the envelope holds no text.
    pub async fn chat(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatCompletionBody {
            model: &self.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(provider = %self.name, %status, "provider returned non-success status");
            return Err(LlmError::UnexpectedStatus {
                provider: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await?;
        let envelope: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| LlmError::Deserialize {
                context: format!("chat completion from {}", self.name),
                source: e,
            })?;

        envelope.first_text().ok_or_else(|| LlmError::EmptyContent {
            provider: self.name.clone(),
        })
    }
}

#[async_trait]
impl CompletionProvider for ChatClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        self.chat(request).await
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
