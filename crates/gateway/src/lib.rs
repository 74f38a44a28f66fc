#![deny(unused)]
//! HTTP entry point for Smart Ticket.
//!
//! Exposes the ticket classification, category prediction and support chat
//! operations as JSON endpoints.

pub mod server;

pub use server::{ApiError, AppState, GatewayConfig, GatewayServer};
