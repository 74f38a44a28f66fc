//! Core traits for Smart Ticket.
//!
//! - `llm`: model gateway contract (LlmClient) and its message types

pub mod llm;

pub use llm::*;
