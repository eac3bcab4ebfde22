//! Bounded retry with exponential back-off and jitter for a single provider.
//!
//! The provider chain calls [`retry_with_backoff`] once per provider, so the
//! total number of attempts for one request is at most
//! `providers * (retries_per_provider + 1)`.

use std::future::Future;
use std::time::Duration;

use crate::error::LlmError;

/// Returns `true` for errors that are worth retrying against the same provider.
///
/// **Retriable:**
/// - Network-level failures: timeout, connection reset.
/// - HTTP 429 and 5xx responses.
/// - [`LlmError::Timeout`] from the chain's per-attempt deadline.
///
/// **Not retriable:**
/// - [`LlmError::EmptyContent`], [`LlmError::Extraction`], [`LlmError::Deserialize`]:
///   the provider answered; asking it the same question again is left to
///   the next provider in the chain.
/// - Configuration errors.
pub(crate) fn is_retriable(err: &LlmError) -> bool {
    match err {
        LlmError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        LlmError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        LlmError::Timeout { .. } => true,
        LlmError::InvalidBaseUrl { .. }
        | LlmError::EmptyContent { .. }
        | LlmError::Deserialize { .. }
        | LlmError::Extraction { .. }
        | LlmError::NoProviders
        | LlmError::AllProvidersFailed { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Delay before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 % jitter,
/// capped at 10 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    provider: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    const MAX_DELAY_MS: u64 = 10_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    provider,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "LLM provider transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
