//! Retry wrapper for transient provider failures.

use async_trait::async_trait;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use smart_ticket_core::{
    config::ModelGatewayConfig,
    traits::{ChatMessage, CompletionOptions, LlmClient, LlmResponse},
    Result,
};

/// Bounded exponential backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub max_retries: u32,
    /// Delay before the first retry; doubled for each following one.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub fn from_settings(settings: &ModelGatewayConfig) -> Self {
        Self::new(
            settings.max_retries,
            Duration::from_millis(settings.retry_base_delay_ms),
        )
    }

    /// Delay before retry number `retry` (0-based), with up to 100% jitter
    /// added on top of the exponential step.
    pub fn backoff(&self, retry: u32) -> Duration {
        let step = self.base_delay.saturating_mul(2u32.saturating_pow(retry.min(16)));
        let jitter_ms = step.as_millis().min(u64::MAX as u128) as u64;
        let jitter = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        step.saturating_add(Duration::from_millis(jitter))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, Duration::from_millis(250))
    }
}

/// A wrapper client that retries transient failures of the inner client.
///
/// Non-transient errors (bad credentials, malformed envelopes, 4xx other
/// than 429) are returned immediately.
pub struct RetryingLlmClient {
    inner: Arc<dyn LlmClient>,
    policy: RetryPolicy,
}

impl RetryingLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl LlmClient for RetryingLlmClient {
    async fn chat(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<LlmResponse> {
        let mut retry = 0;
        loop {
            match self.inner.chat(messages, options).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && retry < self.policy.max_retries => {
                    let delay = self.policy.backoff(retry);
                    tracing::warn!(
                        model = %self.inner.model_id(),
                        attempt = retry + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Transient provider failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }
}
