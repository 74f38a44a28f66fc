//! Axum-based HTTP server for the gateway.

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{Instrument, Span};
use uuid::Uuid;

use smart_ticket_core::{
    config::AppConfig,
    types::{CategoryPrediction, ClassificationRequest, ClassificationResult, SupportReply, TicketContext},
    Error, Result,
};
use smart_ticket_governance::track_request;
use smart_ticket_triage::TriageService;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Enable CORS.
    pub enable_cors: bool,
    /// Enable request tracing.
    pub enable_tracing: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            enable_cors: true,
            enable_tracing: true,
        }
    }
}

impl GatewayConfig {
    /// Server settings from the application configuration.
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            host: config.server.host.clone(),
            port: config.server.port,
            enable_cors: config.gateway.enable_cors,
            enable_tracing: config.gateway.enable_tracing,
        }
    }
}

/// Shared application state.
pub struct AppState {
    /// Classification and support pipeline.
    pub triage: Arc<TriageService>,
}

/// Gateway server.
pub struct GatewayServer {
    config: GatewayConfig,
    state: Arc<AppState>,
    metrics_handle: Option<PrometheusHandle>,
}

impl GatewayServer {
    /// Create a new gateway server.
    pub fn new(config: GatewayConfig, triage: Arc<TriageService>) -> Self {
        Self {
            config,
            state: Arc::new(AppState { triage }),
            metrics_handle: None,
        }
    }

    /// Set metrics handle.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics_handle = Some(handle);
        self
    }

    /// Build the Axum router.
    pub fn build_router(&self) -> Router {
        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/api/chat-ai-direct", post(chat_ai_direct_handler))
            .route("/api/predict-ticket", post(predict_ticket_handler))
            .route("/api/predict-category", post(predict_category_handler))
            .route("/api/chat-support", post(chat_support_handler))
            .with_state(self.state.clone());

        if let Some(handle) = &self.metrics_handle {
            let handle = handle.clone();
            router = router.route("/metrics", get(move || async move { handle.render() }));
        }

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_tracing {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| Error::gateway(format!("Failed to bind: {}", e)))?;

        tracing::info!(addr = %addr, "Gateway server starting");

        axum::serve(listener, self.build_router())
            .await
            .map_err(|e| Error::gateway(format!("Server error: {}", e)))?;

        Ok(())
    }
}

// =============================================================================
// Request/Response Types
// =============================================================================

/// Ticket subject submitted for classification.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TicketSubject {
    pub title: Option<String>,
    pub description: Option<String>,
}

impl TicketSubject {
    fn parts(&self) -> (&str, &str) {
        (
            self.title.as_deref().unwrap_or(""),
            self.description.as_deref().unwrap_or(""),
        )
    }
}

/// Support chat request.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SupportChatRequest {
    pub message: Option<String>,
    pub ticket_context: Option<TicketContext>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Status.
    pub status: String,
    /// Version.
    pub version: String,
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message.
    pub error: String,
}

/// Error returned from handlers.
///
/// Only input errors reach clients with their message; anything else is
/// logged and reported as a bare 500.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self.0 {
            Error::InvalidRequest(message) => (StatusCode::BAD_REQUEST, message),
            other => {
                tracing::error!(error = %other, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check handler.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Span for one inbound request; pipeline events logged inside it carry the
/// request's trace id.
fn request_span(endpoint: &'static str) -> Span {
    let trace_id = Uuid::new_v4().to_string();
    track_request(endpoint);
    tracing::info_span!("request", trace_id = %trace_id, endpoint = endpoint)
}

/// Conversational classification handler.
async fn chat_ai_direct_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ClassificationRequest>,
) -> std::result::Result<Json<ClassificationResult>, ApiError> {
    async move {
        tracing::info!(
            user = %payload.user_email(),
            message_len = payload.message_text().len(),
            "Processing chat-ai-direct request"
        );

        let result = state.triage.converse(&payload).await?;
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(request_span("chat-ai-direct"))
    .await
}

/// Ticket classification handler.
async fn predict_ticket_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TicketSubject>,
) -> std::result::Result<Json<ClassificationResult>, ApiError> {
    async move {
        tracing::info!("Processing predict-ticket request");

        let (title, description) = payload.parts();
        let result = state.triage.classify_ticket(title, description).await?;
        Ok::<_, ApiError>(Json(result))
    }
    .instrument(request_span("predict-ticket"))
    .await
}

/// Category prediction handler.
async fn predict_category_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TicketSubject>,
) -> std::result::Result<Json<CategoryPrediction>, ApiError> {
    async move {
        tracing::info!("Processing predict-category request");

        let (title, description) = payload.parts();
        let prediction = state.triage.predict_category(title, description).await?;
        Ok::<_, ApiError>(Json(prediction))
    }
    .instrument(request_span("predict-category"))
    .await
}

/// Support chat handler.
async fn chat_support_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SupportChatRequest>,
) -> std::result::Result<Json<SupportReply>, ApiError> {
    async move {
        tracing::info!("Processing chat-support request");

        let message = payload.message.as_deref().unwrap_or("");
        let reply = state
            .triage
            .support_reply(message, payload.ticket_context.as_ref())
            .await?;
        Ok::<_, ApiError>(Json(reply))
    }
    .instrument(request_span("chat-support"))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_app_config() {
        let mut app = AppConfig::default();
        app.server.port = 8080;
        app.gateway.enable_cors = false;

        let config = GatewayConfig::from_app_config(&app);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert!(!config.enable_cors);
        assert!(config.enable_tracing);
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let response = ApiError(Error::internal("secret detail")).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let response = ApiError(Error::invalid_request("Message required")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
