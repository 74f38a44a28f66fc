use config::{Config, ConfigError, Environment, File};
use secrecy::Secret;
use serde::Deserialize;

/// Environment variable consulted when no key is configured in the layers.
pub const API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub model_gateway: ModelGatewayConfig,
    pub triage: TriageConfig,
    pub governance: GovernanceConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    pub enable_cors: bool,
    pub enable_tracing: bool,
}

/// Which engine answers classification requests.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// OpenAI-compatible chat completions served by OpenRouter.
    OpenRouter,
    /// Keyword heuristics, no network.
    Offline,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ModelGatewayConfig {
    pub provider: ProviderKind,
    pub base_url: String,
    pub model: String,
    pub api_key: Option<Secret<String>>,
    /// Sent as `HTTP-Referer` for provider attribution.
    pub referer: String,
    /// Sent as `X-Title` for provider attribution.
    pub title: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub request_timeout_secs: u64,
    /// Extra attempts for transient failures; 0 means a single attempt.
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    /// Use the keyword heuristics when no API key is available.
    pub offline_when_unconfigured: bool,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct TriageConfig {
    /// Most recent conversation turns embedded in a conversational prompt.
    pub max_history_turns: usize,
}

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct GovernanceConfig {
    pub json_logs: bool,
    pub metrics_enabled: bool,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(File::with_name("config/local").required(false))
            // Map APP__SERVER__PORT=3000 to server.port
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?;

        let mut config: Self = s.try_deserialize()?;
        if config.model_gateway.api_key.is_none() {
            config.model_gateway.api_key = std::env::var(API_KEY_ENV)
                .ok()
                .filter(|key| !key.trim().is_empty())
                .map(Secret::new);
        }
        Ok(config)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

impl Default for ModelGatewayConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::OpenRouter,
            base_url: "https://openrouter.ai/api/v1".into(),
            model: "deepseek/deepseek-chat-v3-0324:free".into(),
            api_key: None,
            referer: "http://localhost:3000".into(),
            title: "Smart Ticket Assistant".into(),
            temperature: 0.3,
            max_tokens: 500,
            request_timeout_secs: 15,
            max_retries: 0,
            retry_base_delay_ms: 250,
            offline_when_unconfigured: false,
        }
    }
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
        }
    }
}
