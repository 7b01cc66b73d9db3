//! Chat gateway used by the narrative analyst.

pub mod error;
pub mod openrouter;
pub mod types;

use std::time::Duration;

use tokio::time::sleep;
use tracing::{debug, warn};

use openrouter::{ChatProvider, OpenRouterAdapter};

pub use error::{ErrorContext, ProviderError};
pub use types::*;

#[async_trait::async_trait]
pub trait ChatGateway: Send + Sync {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError>;
}

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub max_retries: u32,
    pub retry_base_delay: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
        }
    }
}

/// Retrying wrapper around a [`ChatProvider`].
pub struct ProviderGateway<P: ChatProvider = OpenRouterAdapter> {
    provider: P,
    config: GatewayConfig,
}

#[async_trait::async_trait]
impl<P: ChatProvider> ChatGateway for ProviderGateway<P> {
    async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError> {
        ProviderGateway::chat(self, req).await
    }
}

impl ProviderGateway<OpenRouterAdapter> {
    pub fn from_env() -> Result<Self, ProviderError> {
        Ok(Self::with_config(
            OpenRouterAdapter::from_env()?,
            GatewayConfig::default(),
        ))
    }
}

impl<P: ChatProvider> ProviderGateway<P> {
    pub fn with_config(provider: P, config: GatewayConfig) -> Self {
        Self { provider, config }
    }

    pub async fn chat(&self, req: ChatRequest) -> Result<ChatResponse, ProviderError> {
        let mut last_error: Option<ProviderError> = None;

        for attempt in 0..=self.config.max_retries {
            match self.provider.chat(&req).await {
                Ok(resp) => {
                    debug!(
                        caller = req.attribution.caller,
                        model = req.model.model_id(),
                        input_tokens = resp.input_tokens,
                        output_tokens = resp.output_tokens,
                        latency_ms = resp.latency.as_millis() as u64,
                        "chat completed"
                    );
                    return Ok(resp);
                }
                Err(err) => {
                    warn!(
                        caller = req.attribution.caller,
                        attempt,
                        code = err.code(),
                        request_id = err.request_id().unwrap_or("-"),
                        "chat failed: {err}"
                    );
                    if !err.is_retryable() || attempt == self.config.max_retries {
                        return Err(err);
                    }

                    let delay = backoff_delay(self.config.retry_base_delay, attempt);
                    last_error = Some(err);
                    sleep(delay).await;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ProviderError::provider("openrouter", "unknown error", false)))
    }
}

fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    let multiplier = 2u64.pow(attempt.min(5));
    base * multiplier as u32
}
