#![deny(unused)]
//! Ticket classification and response pipeline.
//!
//! A request flows through four stages: prompt construction, one provider
//! call, extraction of the JSON object from the completion, and total
//! coercion into the closed classification vocabulary. Any failure after
//! input validation yields the fixed fallback result instead of an error.

pub mod extract;
pub mod heuristics;
pub mod prompt;
pub mod service;

pub use extract::{coerce_classification, json_span, parse_category, parse_classification, ExtractError};
pub use heuristics::KeywordHeuristics;
pub use prompt::{PromptBuilder, SYSTEM_PERSONA};
pub use service::{FallbackStage, Outcome, TriageOutcome, TriageService, TriageSettings};
