#![deny(unused)]
//! Governance for Smart Ticket.
//!
//! This crate provides:
//! - Structured logging setup
//! - Prometheus metrics for requests, provider calls and fallbacks

pub mod metrics;
pub mod tracing_layer;

pub use crate::metrics::{setup_metrics_recorder, track_fallback, track_llm_call, track_request, track_tokens};
pub use crate::tracing_layer::configure_tracing;
