//! Core type definitions for Smart Ticket.
//!
//! Broken down into submodules:
//! - `ticket`: the closed classification vocabulary and result shapes
//! - `conversation`: inbound request context (ticket, history, user)

pub mod conversation;
pub mod ticket;

pub use conversation::*;
pub use ticket::*;
