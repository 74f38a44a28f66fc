//! Prompt construction.
//!
//! Every prompt asks the model for a bare answer in a fixed shape. User text
//! is bound as template data, so braces or template tags typed by a user are
//! reproduced literally.

use serde::Serialize;

use smart_ticket_core::{
    template::TemplateEngine,
    traits::ChatMessage,
    types::{ChatRole, ClassificationRequest, TicketCategory, TicketContext, TicketPriority, TicketType},
    Error, Result,
};

/// System message sent with every prompt.
pub const SYSTEM_PERSONA: &str = "Tu es un assistant IA utile et professionnel.";

/// Error message when a ticket has neither title nor description.
pub const SUBJECT_REQUIRED: &str = "Title or description required";

/// Error message when the support chat receives a blank message.
pub const MESSAGE_REQUIRED: &str = "Message required";

const CLASSIFY: &str = "classify";
const CONVERSE: &str = "converse";
const CATEGORY: &str = "category";
const SUPPORT: &str = "support";

const CLASSIFY_TEMPLATE: &str = r#"Tu es un assistant IA spécialisé dans la classification de tickets de support technique.

Analyse le titre et la description suivants et détermine :
1. Le TYPE de ticket parmi : {{ types }}
2. La CATÉGORIE parmi : {{ categories }}
3. La PRIORITÉ parmi : {{ priorities }}
4. Une RÉPONSE SUGGÉRÉE utile et professionnelle pour aider l'utilisateur

Titre: "{{ title }}"
Description: "{{ description }}"
{% if status %}Statut: "{{ status }}"
{% endif %}
Réponds UNIQUEMENT au format JSON suivant (sans texte autour) :
{
  "type": "valeur_type",
  "category": "valeur_categorie",
  "priority": "valeur_priorite",
  "suggestedResponse": "Réponse détaillée et utile en français"
}
"#;

const CONVERSE_TEMPLATE: &str = r#"Tu es un assistant IA de support client. Tu classes les tickets et tu réponds aux utilisateurs.

Analyse le ticket et la conversation ci-dessous et détermine :
1. Le TYPE de ticket parmi : {{ types }}
2. La CATÉGORIE parmi : {{ categories }}
3. La PRIORITÉ parmi : {{ priorities }}
4. Une RÉPONSE utile et professionnelle au dernier message de l'utilisateur

Ticket :
- Titre: "{{ title }}"
- Description: "{{ description }}"
{% if status %}- Statut: "{{ status }}"
{% endif %}{% if category %}- Catégorie actuelle: "{{ category }}"
{% endif %}{% if priority %}- Priorité actuelle: "{{ priority }}"
{% endif %}{% if ticket_type %}- Type actuel: "{{ ticket_type }}"
{% endif %}{% if history %}
Historique de la conversation :
{% for turn in history %}- {{ turn.speaker }}: "{{ turn.content }}"
{% endfor %}{% endif %}{% if message %}
Message de l'utilisateur: "{{ message }}"
{% endif %}
Réponds UNIQUEMENT au format JSON suivant (sans texte autour) :
{
  "type": "valeur_type",
  "category": "valeur_categorie",
  "priority": "valeur_priorite",
  "suggestedResponse": "Réponse détaillée et utile en français"
}
"#;

const CATEGORY_TEMPLATE: &str = r#"Tu es un assistant IA spécialisé dans la classification de tickets de support.
Analyse le titre et la description fournis et détermine la catégorie la plus appropriée parmi :
{% for option in options %}- {{ option.value }} ({{ option.label }})
{% endfor %}
Réponds uniquement avec la valeur de la catégorie ({{ categories }}).

Titre: {{ title }}
Description: {{ description }}
"#;

const SUPPORT_TEMPLATE: &str = r#"Tu es un assistant de support technique professionnel et bienveillant.
{% if ticket %}
Contexte du ticket :
- Titre: {{ ticket.title }}
- Description: {{ ticket.description }}
- Catégorie: {{ ticket.category }}
- Priorité: {{ ticket.priority }}
- Type: {{ ticket.ticket_type }}
{% endif %}
L'utilisateur te pose la question suivante : "{{ message }}"

Réponds de manière utile, professionnelle et en français. Donne des conseils pratiques et des solutions concrètes quand c'est possible. Si tu ne peux pas résoudre le problème, oriente vers un agent humain.
"#;

/// Shown in the support prompt for ticket fields the caller left out.
const UNSPECIFIED: &str = "non précisé";

// =============================================================================
// Validation
// =============================================================================

/// A classifiable ticket needs a title or a description.
pub fn require_subject(title: &str, description: &str) -> Result<()> {
    if title.trim().is_empty() && description.trim().is_empty() {
        return Err(Error::invalid_request(SUBJECT_REQUIRED));
    }
    Ok(())
}

/// A conversation needs a message or a ticket subject to talk about.
pub fn require_conversation(request: &ClassificationRequest) -> Result<()> {
    if request.message_text().is_empty() && !request.ticket().has_subject() {
        return Err(Error::invalid_request(SUBJECT_REQUIRED));
    }
    Ok(())
}

pub fn require_message(message: &str) -> Result<()> {
    if message.trim().is_empty() {
        return Err(Error::invalid_request(MESSAGE_REQUIRED));
    }
    Ok(())
}

/// Wrap a rendered prompt with the system persona.
pub fn messages(prompt: String) -> Vec<ChatMessage> {
    vec![ChatMessage::system(SYSTEM_PERSONA), ChatMessage::user(prompt)]
}

// =============================================================================
// Template Contexts
// =============================================================================

#[derive(Serialize)]
struct Vocabulary {
    types: String,
    categories: String,
    priorities: String,
}

impl Vocabulary {
    fn new() -> Self {
        Self {
            types: TicketType::options(),
            categories: TicketCategory::options(),
            priorities: TicketPriority::options(),
        }
    }
}

#[derive(Serialize)]
struct ClassifyVars<'a> {
    #[serde(flatten)]
    vocabulary: Vocabulary,
    title: &'a str,
    description: &'a str,
    status: &'a str,
}

#[derive(Serialize)]
struct TurnView<'a> {
    speaker: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ConverseVars<'a> {
    #[serde(flatten)]
    vocabulary: Vocabulary,
    title: &'a str,
    description: &'a str,
    status: &'a str,
    category: &'a str,
    priority: &'a str,
    ticket_type: &'a str,
    history: Vec<TurnView<'a>>,
    message: &'a str,
}

#[derive(Serialize)]
struct CategoryOption {
    value: &'static str,
    label: &'static str,
}

#[derive(Serialize)]
struct CategoryVars<'a> {
    options: Vec<CategoryOption>,
    categories: String,
    title: &'a str,
    description: &'a str,
}

#[derive(Serialize)]
struct TicketView<'a> {
    title: &'a str,
    description: &'a str,
    category: &'a str,
    priority: &'a str,
    ticket_type: &'a str,
}

#[derive(Serialize)]
struct SupportVars<'a> {
    ticket: Option<TicketView<'a>>,
    message: &'a str,
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or("")
}

fn or_unspecified(value: &Option<String>) -> &str {
    match field(value) {
        "" => UNSPECIFIED,
        text => text,
    }
}

fn speaker(role: ChatRole) -> &'static str {
    match role {
        ChatRole::User => "Utilisateur",
        ChatRole::Assistant => "Assistant",
    }
}

fn category_label(category: TicketCategory) -> &'static str {
    match category {
        TicketCategory::Technical => "Problème technique",
        TicketCategory::Account => "Compte utilisateur",
        TicketCategory::Billing => "Facturation",
        TicketCategory::Feature => "Demande de fonctionnalité",
        TicketCategory::Bug => "Signalement de bug",
        TicketCategory::Other => "Autre",
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Renders the fixed prompt templates from request fields.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    engine: TemplateEngine,
    max_history_turns: usize,
}

impl PromptBuilder {
    /// Create a builder keeping at most `max_history_turns` prior turns.
    pub fn new(max_history_turns: usize) -> Result<Self> {
        let engine = TemplateEngine::new([
            (CLASSIFY, CLASSIFY_TEMPLATE),
            (CONVERSE, CONVERSE_TEMPLATE),
            (CATEGORY, CATEGORY_TEMPLATE),
            (SUPPORT, SUPPORT_TEMPLATE),
        ])?;
        Ok(Self {
            engine,
            max_history_turns,
        })
    }

    /// Classification prompt for a ticket subject.
    pub fn classification(&self, title: &str, description: &str, status: Option<&str>) -> Result<String> {
        require_subject(title, description)?;
        self.engine.render(
            CLASSIFY,
            &ClassifyVars {
                vocabulary: Vocabulary::new(),
                title: title.trim(),
                description: description.trim(),
                status: status.map(str::trim).unwrap_or(""),
            },
        )
    }

    /// Classification-and-reply prompt for a conversational request.
    pub fn conversation(&self, request: &ClassificationRequest) -> Result<String> {
        require_conversation(request)?;

        let ticket = request.ticket();
        let history = request.history();
        let recent = &history[history.len().saturating_sub(self.max_history_turns)..];

        self.engine.render(
            CONVERSE,
            &ConverseVars {
                vocabulary: Vocabulary::new(),
                title: ticket.title(),
                description: ticket.description(),
                status: field(&ticket.status),
                category: field(&ticket.category),
                priority: field(&ticket.priority),
                ticket_type: field(&ticket.ticket_type),
                history: recent
                    .iter()
                    .map(|turn| TurnView {
                        speaker: speaker(turn.role),
                        content: turn.content.trim(),
                    })
                    .collect(),
                message: request.message_text(),
            },
        )
    }

    /// Single-word category prompt.
    pub fn category(&self, title: &str, description: &str) -> Result<String> {
        require_subject(title, description)?;
        self.engine.render(
            CATEGORY,
            &CategoryVars {
                options: TicketCategory::ALL
                    .iter()
                    .map(|c| CategoryOption {
                        value: c.as_str(),
                        label: category_label(*c),
                    })
                    .collect(),
                categories: TicketCategory::options(),
                title: title.trim(),
                description: description.trim(),
            },
        )
    }

    /// Free-text support answer prompt.
    pub fn support(&self, message: &str, ticket: Option<&TicketContext>) -> Result<String> {
        require_message(message)?;
        self.engine.render(
            SUPPORT,
            &SupportVars {
                ticket: ticket.map(|t| TicketView {
                    title: or_unspecified(&t.title),
                    description: or_unspecified(&t.description),
                    category: or_unspecified(&t.category),
                    priority: or_unspecified(&t.priority),
                    ticket_type: or_unspecified(&t.ticket_type),
                }),
                message: message.trim(),
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_ticket_core::types::ChatTurn;

    fn builder() -> PromptBuilder {
        PromptBuilder::new(2).unwrap()
    }

    #[test]
    fn test_classification_prompt_embeds_vocabulary_and_subject() {
        let prompt = builder()
            .classification("Impossible de me connecter", "Mot de passe refusé", None)
            .unwrap();

        assert!(prompt.contains("incident, request, complaint, suggestion"));
        assert!(prompt.contains("technical, account, billing, feature, bug, other"));
        assert!(prompt.contains("low, medium, high, urgent"));
        assert!(prompt.contains("Titre: \"Impossible de me connecter\""));
        assert!(prompt.contains("Description: \"Mot de passe refusé\""));
        assert!(prompt.contains("\"suggestedResponse\""));
        assert!(prompt.contains("UNIQUEMENT au format JSON"));
        assert!(!prompt.contains("Statut"));
    }

    #[test]
    fn test_classification_requires_subject() {
        let err = builder().classification("  ", "", None).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(msg) if msg == SUBJECT_REQUIRED));
    }

    #[test]
    fn test_user_text_is_interpolated_literally() {
        let prompt = builder()
            .classification("{{ types }} {% if x %}", "a & b <c>", Some("OPEN"))
            .unwrap();
        assert!(prompt.contains("Titre: \"{{ types }} {% if x %}\""));
        assert!(prompt.contains("Description: \"a & b <c>\""));
        assert!(prompt.contains("Statut: \"OPEN\""));
    }

    #[test]
    fn test_conversation_prompt_keeps_recent_history() {
        let request = ClassificationRequest::message("Toujours rien")
            .with_ticket(TicketContext {
                status: Some("IN_PROGRESS".to_string()),
                priority: Some("high".to_string()),
                ..TicketContext::new("Connexion", "Mot de passe refusé")
            })
            .with_history(vec![
                ChatTurn::user("premier"),
                ChatTurn::assistant("deuxième"),
                ChatTurn::user("troisième"),
            ]);

        let prompt = builder().conversation(&request).unwrap();

        assert!(!prompt.contains("premier"));
        assert!(prompt.contains("- Assistant: \"deuxième\""));
        assert!(prompt.contains("- Utilisateur: \"troisième\""));
        assert!(prompt.contains("Message de l'utilisateur: \"Toujours rien\""));
        assert!(prompt.contains("- Statut: \"IN_PROGRESS\""));
        assert!(prompt.contains("- Priorité actuelle: \"high\""));
        assert!(!prompt.contains("Catégorie actuelle"));
    }

    #[test]
    fn test_conversation_with_message_only_is_accepted() {
        let request = ClassificationRequest::message("Ma facture est fausse");
        assert!(builder().conversation(&request).is_ok());
        assert!(builder().conversation(&ClassificationRequest::default()).is_err());
    }

    #[test]
    fn test_category_prompt_lists_labels() {
        let prompt = builder().category("Facture", "Double prélèvement").unwrap();
        assert!(prompt.contains("- billing (Facturation)"));
        assert!(prompt.contains("- other (Autre)"));
        assert!(prompt.contains("Titre: Facture"));
    }

    #[test]
    fn test_support_prompt() {
        let ticket = TicketContext::new("Lenteur", "");
        let prompt = builder().support("Quand aurai-je une réponse ?", Some(&ticket)).unwrap();
        assert!(prompt.contains("- Titre: Lenteur"));
        assert!(prompt.contains("- Description: non précisé"));
        assert!(prompt.contains("\"Quand aurai-je une réponse ?\""));

        let bare = builder().support("Bonjour", None).unwrap();
        assert!(!bare.contains("Contexte du ticket"));

        let err = builder().support(" ", None).unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(msg) if msg == MESSAGE_REQUIRED));
    }

    #[test]
    fn test_messages_carry_persona() {
        let messages = messages("prompt".to_string());
        assert_eq!(messages[0], ChatMessage::system(SYSTEM_PERSONA));
        assert_eq!(messages[1].role, "user");
    }
}
