//! Metrics implementation using Prometheus.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use smart_ticket_core::{Error, Result};

/// Initialize Prometheus recorder and return the handle.
pub fn setup_metrics_recorder() -> Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| Error::internal(format!("Failed to install Prometheus recorder: {}", e)))?;

    tracing::info!("Prometheus metrics recorder initialized");
    Ok(handle)
}

/// Count an inbound request per endpoint.
pub fn track_request(endpoint: &str) {
    metrics::counter!("triage_requests_total", "endpoint" => endpoint.to_string()).increment(1);
}

/// Count a fallback per failing pipeline stage.
pub fn track_fallback(stage: &str) {
    metrics::counter!("triage_fallback_total", "stage" => stage.to_string()).increment(1);
}

/// Record provider call latency and outcome.
pub fn track_llm_call(model: &str, latency_sec: f64, success: bool) {
    let outcome = if success { "ok" } else { "error" };
    metrics::histogram!(
        "llm_request_duration_seconds",
        "model" => model.to_string(),
        "outcome" => outcome
    )
    .record(latency_sec);
}

/// Helper to track token usage.
pub fn track_tokens(model: &str, prompt: u64, completion: u64) {
    metrics::counter!("llm_token_usage_total", "model" => model.to_string(), "type" => "prompt").increment(prompt);
    metrics::counter!("llm_token_usage_total", "model" => model.to_string(), "type" => "completion").increment(completion);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tracking_without_recorder_is_a_no_op() {
        track_request("predict-ticket");
        track_fallback("provider");
        track_llm_call("mock", 0.25, false);
        track_tokens("mock", 10, 20);
    }
}
