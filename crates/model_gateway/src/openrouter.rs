//! OpenRouter chat-completions client.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol with bearer
//! authentication and OpenRouter's attribution headers.

use async_trait::async_trait;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use smart_ticket_core::{
    config::ModelGatewayConfig,
    traits::{ChatMessage, CompletionOptions, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

/// Connection settings for [`OpenRouterClient`].
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API root, e.g. `https://openrouter.ai/api/v1`.
    pub base_url: String,
    /// Fixed model identifier.
    pub model: String,
    /// Bearer credential; calls fail fast when absent.
    pub api_key: Option<Secret<String>>,
    /// `HTTP-Referer` attribution header.
    pub referer: String,
    /// `X-Title` attribution header.
    pub title: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl OpenRouterConfig {
    pub fn from_settings(settings: &ModelGatewayConfig) -> Self {
        Self {
            base_url: settings.base_url.clone(),
            model: settings.model.clone(),
            api_key: settings.api_key.clone(),
            referer: settings.referer.clone(),
            title: settings.title.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }

    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(Secret::new(key.into()));
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self::from_settings(&ModelGatewayConfig::default())
    }
}

/// OpenRouter-backed LLM client.
pub struct OpenRouterClient {
    config: OpenRouterConfig,
    client: reqwest::Client,
}

impl OpenRouterClient {
    /// Create a new client with the given configuration.
    pub fn new(config: OpenRouterConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::model_provider(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionEnvelope {
    #[serde(default)]
    choices: Option<Vec<Choice>>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMessage>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Usage {
    prompt_tokens: u64,
    completion_tokens: u64,
    total_tokens: u64,
}

/// Turn a decoded 2xx body into a response, rejecting envelopes without a
/// usable first choice.
fn parse_envelope(body: &str, fallback_model: &str) -> Result<LlmResponse> {
    let envelope: CompletionEnvelope = serde_json::from_str(body)?;

    let choice = envelope
        .choices
        .and_then(|choices| choices.into_iter().next())
        .ok_or_else(|| Error::model_provider("response contained no choices"))?;

    let content = choice
        .message
        .and_then(|m| m.content)
        .ok_or_else(|| Error::model_provider("first choice has no message content"))?;

    let usage = envelope.usage.unwrap_or_default();

    Ok(LlmResponse {
        content,
        model: envelope.model.unwrap_or_else(|| fallback_model.to_string()),
        finish_reason: choice.finish_reason,
        usage: LlmUsage {
            prompt_tokens: usage.prompt_tokens,
            completion_tokens: usage.completion_tokens,
            total_tokens: usage.total_tokens,
        },
    })
}

/// Best-effort message from an error body (`{"error": {"message": ...}}`).
fn provider_error_message(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body).ok();
    parsed
        .as_ref()
        .and_then(|json| {
            json["error"]["message"]
                .as_str()
                .or_else(|| json["message"].as_str())
                .or_else(|| json["error"].as_str())
        })
        .map(str::to_string)
        .unwrap_or_else(|| body.chars().take(200).collect())
}

fn transport_error(err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout(err.to_string())
    } else {
        Error::Transport(err.to_string())
    }
}

#[async_trait]
impl LlmClient for OpenRouterClient {
    async fn chat(&self, messages: &[ChatMessage], options: &CompletionOptions) -> Result<LlmResponse> {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .ok_or_else(|| Error::model_provider("API key not configured"))?;

        tracing::debug!(
            model = %self.config.model,
            messages = messages.len(),
            temperature = options.temperature,
            max_tokens = options.max_tokens,
            "Calling OpenRouter"
        );

        let body = CompletionBody {
            model: &self.config.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(api_key.expose_secret())
            .header("HTTP-Referer", self.config.referer.as_str())
            .header("X-Title", self.config.title.as_str())
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            let message = provider_error_message(&text);
            tracing::warn!(status = status.as_u16(), error = %message, "OpenRouter returned an error status");
            return Err(Error::ProviderStatus {
                status: status.as_u16(),
                message,
            });
        }

        parse_envelope(&text, &self.config.model)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_envelope() {
        let body = r#"{
            "id": "gen-1",
            "model": "deepseek/deepseek-chat-v3-0324:free",
            "choices": [{"message": {"role": "assistant", "content": "{\"type\":\"incident\"}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 120, "completion_tokens": 40, "total_tokens": 160}
        }"#;
        let response = parse_envelope(body, "fallback").unwrap();
        assert_eq!(response.content, "{\"type\":\"incident\"}");
        assert_eq!(response.finish_reason.as_deref(), Some("stop"));
        assert_eq!(response.usage.total_tokens, 160);
    }

    #[test]
    fn test_missing_choices_is_an_error() {
        let err = parse_envelope(r#"{"id": "gen-1"}"#, "m").unwrap_err();
        assert!(matches!(err, Error::ModelProvider(msg) if msg.contains("no choices")));

        let err = parse_envelope(r#"{"choices": []}"#, "m").unwrap_err();
        assert!(matches!(err, Error::ModelProvider(_)));
    }

    #[test]
    fn test_missing_content_is_an_error() {
        let err = parse_envelope(r#"{"choices": [{"message": {"role": "assistant"}}]}"#, "m").unwrap_err();
        assert!(matches!(err, Error::ModelProvider(msg) if msg.contains("no message content")));
    }

    #[test]
    fn test_non_json_body_is_a_serialization_error() {
        let err = parse_envelope("<html>bad gateway</html>", "m").unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[test]
    fn test_provider_error_message() {
        assert_eq!(
            provider_error_message(r#"{"error": {"message": "Rate limit exceeded", "code": 429}}"#),
            "Rate limit exceeded"
        );
        assert_eq!(provider_error_message("upstream down"), "upstream down");
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = OpenRouterConfig::default().with_base_url("http://127.0.0.1:9999/api/v1/");
        let client = OpenRouterClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:9999/api/v1/chat/completions");
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network() {
        let config = OpenRouterConfig::default().with_base_url("http://127.0.0.1:1");
        let client = OpenRouterClient::new(config).unwrap();
        let err = client
            .chat(&[ChatMessage::user("bonjour")], &CompletionOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModelProvider(msg) if msg.contains("API key")));
    }
}
