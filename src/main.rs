#![deny(unused)]
//! Smart Ticket - AI support ticket assistant.
//!
//! Classifies support tickets into a fixed vocabulary and drafts replies,
//! through an OpenRouter model or offline keyword heuristics.

use std::sync::Arc;

use smart_ticket_core::config::AppConfig;
use smart_ticket_gateway::{GatewayConfig, GatewayServer};
use smart_ticket_model_gateway::{create_client_from_config, ClientSelection};
use smart_ticket_triage::{TriageService, TriageSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()?;

    smart_ticket_governance::configure_tracing(config.governance.json_logs)?;

    tracing::info!("Starting Smart Ticket v{}", env!("CARGO_PKG_VERSION"));

    // =========================================================================
    // Model provider & triage pipeline
    // =========================================================================
    let settings = TriageSettings::from_config(&config.triage, &config.model_gateway);
    let triage = match create_client_from_config(&config.model_gateway)? {
        ClientSelection::Remote(client) => {
            tracing::info!(model = %client.model_id(), "Using remote model provider");
            TriageService::new(client, settings)?
        }
        ClientSelection::Offline => TriageService::offline(settings)?,
    };

    // =========================================================================
    // HTTP gateway
    // =========================================================================
    let mut server = GatewayServer::new(GatewayConfig::from_app_config(&config), Arc::new(triage));

    if config.governance.metrics_enabled {
        match smart_ticket_governance::setup_metrics_recorder() {
            Ok(handle) => server = server.with_metrics(handle),
            Err(e) => tracing::warn!(error = %e, "Metrics disabled"),
        }
    }

    server.run().await?;

    Ok(())
}
