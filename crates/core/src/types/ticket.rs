use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Canned Texts
// =============================================================================

/// Substituted when the model answers without a usable suggested response.
pub const DEFAULT_SUGGESTED_RESPONSE: &str =
    "Merci pour votre demande. Notre équipe va examiner votre ticket et vous répondre rapidement.";

/// Returned when any stage of the classification pipeline fails.
pub const FALLBACK_RESPONSE: &str =
    "Merci pour votre demande. Notre équipe va examiner votre ticket et vous répondre dans les plus brefs délais.";

/// Returned by the support chat when the model produced an empty answer.
pub const SUPPORT_EMPTY_REPLY: &str =
    "Je suis désolé, je n'ai pas pu traiter votre demande. Veuillez contacter un agent humain pour une assistance personnalisée.";

/// Returned by the support chat when the provider call failed.
pub const SUPPORT_FAILURE_REPLY: &str =
    "Je rencontre actuellement des difficultés techniques. Veuillez contacter un agent humain pour une assistance immédiate.";

// =============================================================================
// Closed Vocabulary
// =============================================================================

/// Declares a closed string enum with a documented default.
///
/// Membership is exact and case-sensitive; `from_model` is total and maps
/// anything else (missing, non-string, unknown) to the default.
macro_rules! closed_enum {
    (
        $(#[$meta:meta])*
        $name:ident, default = $default:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $text:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            $( $(#[$vmeta])* $variant ),+
        }

        impl $name {
            /// Every accepted value, in prompt order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Wire representation.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Exact membership test against the wire representation.
            pub fn parse(value: &str) -> Option<Self> {
                match value {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }

            /// Coerce an untrusted JSON field, falling back to the default.
            pub fn from_model(value: Option<&Value>) -> Self {
                value
                    .and_then(Value::as_str)
                    .and_then(Self::parse)
                    .unwrap_or_default()
            }

            /// Comma-separated option list, as embedded in prompts.
            pub fn options() -> String {
                Self::ALL
                    .iter()
                    .map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

closed_enum! {
    /// Nature of a support ticket.
    TicketType, default = Request {
        /// Something is broken.
        Incident => "incident",
        /// The user asks for something.
        Request => "request",
        Complaint => "complaint",
        Suggestion => "suggestion",
    }
}

closed_enum! {
    /// Functional area a ticket belongs to.
    TicketCategory, default = Other {
        Technical => "technical",
        Account => "account",
        Billing => "billing",
        Feature => "feature",
        Bug => "bug",
        Other => "other",
    }
}

closed_enum! {
    /// Urgency of a ticket.
    TicketPriority, default = Medium {
        Low => "low",
        Medium => "medium",
        High => "high",
        Urgent => "urgent",
    }
}

// =============================================================================
// Results
// =============================================================================

/// Normalized classification returned to callers.
///
/// `suggested_response` and `response` always carry the same non-empty text;
/// the duplication exists for clients that read either key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub suggested_response: String,
    pub response: String,
}

impl ClassificationResult {
    /// Build a result, substituting the default text for a blank response.
    pub fn new(
        ticket_type: TicketType,
        category: TicketCategory,
        priority: TicketPriority,
        suggested_response: impl Into<String>,
    ) -> Self {
        let text = suggested_response.into();
        let text = if text.trim().is_empty() {
            DEFAULT_SUGGESTED_RESPONSE.to_string()
        } else {
            text
        };

        Self {
            ticket_type,
            category,
            priority,
            response: text.clone(),
            suggested_response: text,
        }
    }

    /// The fixed result used whenever the pipeline fails.
    pub fn fallback() -> Self {
        Self::new(
            TicketType::default(),
            TicketCategory::default(),
            TicketPriority::default(),
            FALLBACK_RESPONSE,
        )
    }
}

/// How much the caller should trust a category prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Low,
}

/// Category-only prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryPrediction {
    pub category: TicketCategory,
    pub confidence: Confidence,
}

impl CategoryPrediction {
    pub fn fallback() -> Self {
        Self {
            category: TicketCategory::default(),
            confidence: Confidence::Low,
        }
    }
}

/// Free-text answer from the support chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupportReply {
    pub response: String,
}

impl SupportReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_documented_values() {
        assert_eq!(TicketType::default(), TicketType::Request);
        assert_eq!(TicketCategory::default(), TicketCategory::Other);
        assert_eq!(TicketPriority::default(), TicketPriority::Medium);
    }

    #[test]
    fn test_from_model_is_exact_and_total() {
        assert_eq!(TicketPriority::from_model(Some(&json!("high"))), TicketPriority::High);
        assert_eq!(TicketPriority::from_model(Some(&json!("critical"))), TicketPriority::Medium);
        assert_eq!(TicketPriority::from_model(Some(&json!("HIGH"))), TicketPriority::Medium);
        assert_eq!(TicketPriority::from_model(Some(&json!(3))), TicketPriority::Medium);
        assert_eq!(TicketPriority::from_model(None), TicketPriority::Medium);
    }

    #[test]
    fn test_options_list() {
        assert_eq!(TicketType::options(), "incident, request, complaint, suggestion");
        assert_eq!(
            TicketCategory::options(),
            "technical, account, billing, feature, bug, other"
        );
        assert_eq!(TicketPriority::options(), "low, medium, high, urgent");
    }

    #[test]
    fn test_blank_response_is_replaced() {
        let result = ClassificationResult::new(
            TicketType::Incident,
            TicketCategory::Bug,
            TicketPriority::Low,
            "   ",
        );
        assert_eq!(result.suggested_response, DEFAULT_SUGGESTED_RESPONSE);
        assert_eq!(result.response, result.suggested_response);
    }

    #[test]
    fn test_result_wire_shape() {
        let value = serde_json::to_value(ClassificationResult::fallback()).unwrap();
        assert_eq!(value["type"], "request");
        assert_eq!(value["category"], "other");
        assert_eq!(value["priority"], "medium");
        assert_eq!(value["suggestedResponse"], FALLBACK_RESPONSE);
        assert_eq!(value["response"], FALLBACK_RESPONSE);
    }

    #[test]
    fn test_category_prediction_wire_shape() {
        let value = serde_json::to_value(CategoryPrediction::fallback()).unwrap();
        assert_eq!(value, json!({"category": "other", "confidence": "low"}));
    }
}
