//! Provider abstraction and the ordered fallback chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use geovis_core::AppConfig;

use crate::client::ChatClient;
use crate::error::LlmError;
use crate::extract::ExtractionError;
use crate::retry::retry_with_backoff;
use crate::types::CompletionRequest;

/// Upper bound on chain length.
pub const MAX_PROVIDERS: usize = 4;

const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

/// Anything that turns a completion request into raw text.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Label used in logs, diagnostics, and score rows.
    fn name(&self) -> &str;

    /// Run one completion.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError`] on transport failure, non-2xx status, or empty content.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

/// A response accepted by the chain.
#[derive(Debug, Clone)]
pub struct ChainResponse<T> {
    pub value: T,
    /// Name of the provider whose response was accepted.
    pub provider: String,
}

/// Providers tried in fixed priority order; the first usable answer wins.
pub struct ProviderChain {
    providers: Vec<Arc<dyn CompletionProvider>>,
    attempt_timeout: Duration,
    retries_per_provider: u32,
    backoff_base_ms: u64,
}

impl ProviderChain {
    /// Build a chain from providers in priority order.
    ///
    /// Providers beyond [`MAX_PROVIDERS`] are dropped with a warning.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NoProviders`] if `providers` is empty.
    pub fn new(
        mut providers: Vec<Arc<dyn CompletionProvider>>,
        attempt_timeout: Duration,
    ) -> Result<Self, LlmError> {
        if providers.is_empty() {
            return Err(LlmError::NoProviders);
        }
        if providers.len() > MAX_PROVIDERS {
            tracing::warn!(
                configured = providers.len(),
                max = MAX_PROVIDERS,
                "too many LLM providers configured; extra providers ignored"
            );
            providers.truncate(MAX_PROVIDERS);
        }
        Ok(Self {
            providers,
            attempt_timeout,
            retries_per_provider: 0,
            backoff_base_ms: DEFAULT_BACKOFF_BASE_MS,
        })
    }

    /// Build HTTP-backed providers from application config.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::NoProviders`] if no provider has an API key, or any
    /// client construction error.
    pub fn from_config(config: &AppConfig) -> Result<Self, LlmError> {
        let providers = config
            .llm_providers
            .iter()
            .map(|p| {
                ChatClient::from_config(p, config.llm_timeout_secs)
                    .map(|c| Arc::new(c) as Arc<dyn CompletionProvider>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(
            Self::new(providers, Duration::from_secs(config.llm_timeout_secs))?
                .with_retries(config.llm_retries_per_provider, DEFAULT_BACKOFF_BASE_MS),
        )
    }

    /// Allow `retries` extra attempts per provider on transient errors.
    #[must_use]
    pub fn with_retries(mut self, retries: u32, backoff_base_ms: u64) -> Self {
        self.retries_per_provider = retries;
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    #[must_use]
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Send `request` to each provider in order until `accept` turns a
    /// response into a value.
    ///
    /// A provider's answer that `accept` rejects counts as that provider
    /// failing; the next provider is tried.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::AllProvidersFailed`] with one diagnostic per
    /// provider when none produced an accepted response.
    pub async fn complete_with<T, F>(
        &self,
        request: &CompletionRequest,
        accept: F,
    ) -> Result<ChainResponse<T>, LlmError>
    where
        F: Fn(&str) -> Result<T, ExtractionError>,
    {
        let mut attempts = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            let name = provider.name().to_string();
            let outcome = retry_with_backoff(
                &name,
                self.retries_per_provider,
                self.backoff_base_ms,
                || self.attempt(provider, request),
            )
            .await;

            let err = match outcome {
                Ok(text) => match accept(&text) {
                    Ok(value) => {
                        tracing::debug!(provider = %name, "provider response accepted");
                        return Ok(ChainResponse {
                            value,
                            provider: name,
                        });
                    }
                    Err(source) => LlmError::Extraction {
                        provider: name.clone(),
                        source,
                    },
                },
                Err(e) => e,
            };

            tracing::warn!(provider = %name, error = %err, "LLM provider failed, trying next");
            attempts.push(err.to_string());
        }

        Err(LlmError::AllProvidersFailed { attempts })
    }

    async fn attempt(
        &self,
        provider: &Arc<dyn CompletionProvider>,
        request: &CompletionRequest,
    ) -> Result<String, LlmError> {
        match tokio::time::timeout(self.attempt_timeout, provider.complete(request)).await {
            Ok(result) => result,
            Err(_) => Err(LlmError::Timeout {
                provider: provider.name().to_string(),
                timeout_ms: u64::try_from(self.attempt_timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }
}
