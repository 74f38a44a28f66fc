#![deny(unused)]
//! Model Gateway for Smart Ticket.
//!
//! This crate provides:
//! - An OpenRouter chat-completions client
//! - Bounded retry with jittered backoff for transient provider failures
//! - Client construction from configuration

pub mod openrouter;
pub mod retry;

pub use openrouter::{OpenRouterClient, OpenRouterConfig};
pub use retry::{RetryPolicy, RetryingLlmClient};

use std::sync::Arc;

use smart_ticket_core::{
    config::{ModelGatewayConfig, ProviderKind},
    traits::LlmClient,
    Result,
};

/// Engine chosen from configuration.
pub enum ClientSelection {
    /// Calls go to a remote provider.
    Remote(Arc<dyn LlmClient>),
    /// No provider; callers use their offline heuristics.
    Offline,
}

/// Create an LLM client from configuration.
///
/// A missing API key is not an error here: with `offline_when_unconfigured`
/// the offline engine is selected, otherwise the client is built and every
/// call fails fast without touching the network.
pub fn create_client_from_config(config: &ModelGatewayConfig) -> Result<ClientSelection> {
    match config.provider {
        ProviderKind::Offline => {
            tracing::info!("Offline provider configured, using keyword heuristics");
            Ok(ClientSelection::Offline)
        }
        ProviderKind::OpenRouter => {
            if config.api_key.is_none() {
                if config.offline_when_unconfigured {
                    tracing::warn!("No API key configured, falling back to keyword heuristics");
                    return Ok(ClientSelection::Offline);
                }
                tracing::warn!("No API key configured, every classification will use the fallback result");
            }

            let client: Arc<dyn LlmClient> =
                Arc::new(OpenRouterClient::new(OpenRouterConfig::from_settings(config))?);

            if config.max_retries == 0 {
                return Ok(ClientSelection::Remote(client));
            }

            let policy = RetryPolicy::from_settings(config);
            tracing::info!(max_retries = policy.max_retries, "Provider retries enabled");
            Ok(ClientSelection::Remote(Arc::new(RetryingLlmClient::new(client, policy))))
        }
    }
}
