use serde::{Deserialize, Serialize};

/// Email used in logs when the caller did not identify the user.
pub const UNKNOWN_USER_EMAIL: &str = "unknown@example.com";

// =============================================================================
// Request Context
// =============================================================================

/// Author of a prior conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// A prior turn supplied by the caller for conversational continuity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: None,
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: None,
        }
    }
}

/// Ticket fields forwarded by the front end. Every field is optional and
/// only used to enrich the prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TicketContext {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub priority: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: Option<String>,
    pub status: Option<String>,
}

impl TicketContext {
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            description: Some(description.into()),
            ..Default::default()
        }
    }

    /// Trimmed title, empty when absent.
    pub fn title(&self) -> &str {
        trimmed(&self.title)
    }

    /// Trimmed description, empty when absent.
    pub fn description(&self) -> &str {
        trimmed(&self.description)
    }

    /// Whether the ticket carries a title or a description.
    pub fn has_subject(&self) -> bool {
        !self.title().is_empty() || !self.description().is_empty()
    }
}

/// Identity of the caller, used for logging only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserContext {
    pub email: Option<String>,
}

/// Conversational classification request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClassificationRequest {
    pub message: Option<String>,
    pub ticket_context: Option<TicketContext>,
    pub conversation_history: Option<Vec<ChatTurn>>,
    pub user_context: Option<UserContext>,
}

impl ClassificationRequest {
    /// Create a request carrying only a user message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }

    /// Attach ticket context.
    pub fn with_ticket(mut self, ticket: TicketContext) -> Self {
        self.ticket_context = Some(ticket);
        self
    }

    /// Attach prior turns.
    pub fn with_history(mut self, history: Vec<ChatTurn>) -> Self {
        self.conversation_history = Some(history);
        self
    }

    /// Attach the caller's email.
    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        self.user_context = Some(UserContext {
            email: Some(email.into()),
        });
        self
    }

    /// Trimmed message, empty when absent.
    pub fn message_text(&self) -> &str {
        trimmed(&self.message)
    }

    /// Ticket context, or an empty one.
    pub fn ticket(&self) -> TicketContext {
        self.ticket_context.clone().unwrap_or_default()
    }

    pub fn history(&self) -> &[ChatTurn] {
        self.conversation_history.as_deref().unwrap_or(&[])
    }

    pub fn user_email(&self) -> &str {
        self.user_context
            .as_ref()
            .and_then(|u| u.email.as_deref())
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .unwrap_or(UNKNOWN_USER_EMAIL)
    }
}

fn trimmed(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_full_request() {
        let request: ClassificationRequest = serde_json::from_value(json!({
            "message": "Toujours bloqué",
            "ticketContext": {
                "title": "Impossible de me connecter",
                "description": "Mot de passe refusé",
                "type": "incident",
                "status": "OPEN"
            },
            "conversationHistory": [
                {"role": "user", "content": "Bonjour", "timestamp": "2024-05-01T10:00:00Z"},
                {"role": "assistant", "content": "Bonjour, que puis-je faire ?"}
            ],
            "userContext": {"email": "alice@example.com"}
        }))
        .unwrap();

        assert_eq!(request.message_text(), "Toujours bloqué");
        let ticket = request.ticket();
        assert_eq!(ticket.title(), "Impossible de me connecter");
        assert_eq!(ticket.ticket_type.as_deref(), Some("incident"));
        assert_eq!(request.history().len(), 2);
        assert_eq!(request.history()[1].role, ChatRole::Assistant);
        assert_eq!(request.user_email(), "alice@example.com");
    }

    #[test]
    fn test_nulls_and_missing_fields_are_tolerated() {
        let request: ClassificationRequest = serde_json::from_value(json!({
            "message": null,
            "ticketContext": {"title": null},
            "conversationHistory": null
        }))
        .unwrap();

        assert_eq!(request.message_text(), "");
        assert!(!request.ticket().has_subject());
        assert!(request.history().is_empty());
        assert_eq!(request.user_email(), UNKNOWN_USER_EMAIL);
    }

    #[test]
    fn test_whitespace_subject_is_blank() {
        let ticket = TicketContext::new("   ", "\n");
        assert!(!ticket.has_subject());
        assert!(TicketContext::new("", "Mot de passe refusé").has_subject());
    }
}
