use thiserror::Error;

use crate::extract::ExtractionError;

/// Errors returned by LLM provider calls and the fallback chain.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status.
    #[error("provider {provider} returned HTTP {status}")]
    UnexpectedStatus { provider: String, status: u16 },

    /// The configured base URL cannot be turned into an endpoint.
    #[error("invalid base URL for provider {provider}: {reason}")]
    InvalidBaseUrl { provider: String, reason: String },

    /// The completion envelope parsed but carried no text.
    #[error("provider {provider} returned empty content")]
    EmptyContent { provider: String },

    /// The response body could not be deserialized into the expected envelope.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    /// The per-attempt deadline elapsed.
    #[error("provider {provider} timed out after {timeout_ms} ms")]
    Timeout { provider: String, timeout_ms: u64 },

    /// The provider answered, but the text held no usable structured payload.
    #[error("provider {provider} returned an unusable response: {source}")]
    Extraction {
        provider: String,
        #[source]
        source: ExtractionError,
    },

    /// The chain was built without any provider.
    #[error("no LLM providers configured")]
    NoProviders,

    /// Every provider in the chain failed; one diagnostic per attempt.
    #[error("all LLM providers failed: {}", .attempts.join("; "))]
    AllProvidersFailed { attempts: Vec<String> },
}
