#![deny(unused)]
//! Core types, traits, and error definitions for Smart Ticket.
//!
//! This crate provides the building blocks shared by every layer of the
//! ticket assistant: the closed classification vocabulary, the LLM client
//! contract, layered configuration and prompt template rendering.

pub mod config;
pub mod error;
pub mod mocks;
pub mod template;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
pub use traits::*;
pub use types::*;
