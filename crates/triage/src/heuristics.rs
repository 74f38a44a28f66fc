//! Keyword heuristics used when no model provider is configured.
//!
//! Rules run against the lowercased ticket text, in declaration order; the
//! first matching rule wins. French and English phrasings are both listed.

use smart_ticket_core::types::{
    CategoryPrediction, ClassificationRequest, ClassificationResult, Confidence, SupportReply, TicketCategory,
    TicketPriority, TicketType,
};

const INCIDENT_KEYWORDS: &[&str] = &[
    "problème",
    "bug",
    "erreur",
    "ne fonctionne pas",
    "problem",
    "error",
    "not working",
];

const SUGGESTION_KEYWORDS: &[&str] = &["suggestion", "amélioration", "improvement"];

const COMPLAINT_KEYWORDS: &[&str] = &["plainte", "mécontent", "complaint", "unhappy"];

const ACCOUNT_KEYWORDS: &[&str] = &[
    "compte",
    "profil",
    "connexion",
    "mot de passe",
    "account",
    "profile",
    "login",
    "password",
];

const BILLING_KEYWORDS: &[&str] = &[
    "facture",
    "paiement",
    "prix",
    "abonnement",
    "invoice",
    "payment",
    "price",
    "subscription",
];

const FEATURE_KEYWORDS: &[&str] = &["fonctionnalité", "ajouter", "feature"];

const BUG_KEYWORDS: &[&str] = &["bug", "erreur", "error"];

const URGENT_KEYWORDS: &[&str] = &["urgent", "immédiatement", "critique", "immediately", "critical"];

const HIGH_KEYWORDS: &[&str] = &["important", "rapidement", "quickly"];

const LOW_KEYWORDS: &[&str] = &["quand vous pouvez", "pas pressé", "no rush", "whenever"];

const GREETING_KEYWORDS: &[&str] = &["bonjour", "salut", "hello"];

const THANKS_KEYWORDS: &[&str] = &["merci", "thank"];

const DELAY_KEYWORDS: &[&str] = &["délai", "attendre", "quand", "combien de temps", "how long"];

const PROBLEM_KEYWORDS: &[&str] = &["problème", "bug", "erreur", "marche pas", "problem", "error"];

const HUMAN_KEYWORDS: &[&str] = &["agent", "humain", "personne", "human"];

fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| text.contains(keyword))
}

/// Keyword-rule classifier mirroring the model's output shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordHeuristics;

impl KeywordHeuristics {
    pub fn new() -> Self {
        Self
    }

    pub fn ticket_type(&self, text: &str) -> TicketType {
        let lower = text.to_lowercase();
        if contains_any(&lower, INCIDENT_KEYWORDS) {
            TicketType::Incident
        } else if contains_any(&lower, SUGGESTION_KEYWORDS) {
            TicketType::Suggestion
        } else if contains_any(&lower, COMPLAINT_KEYWORDS) {
            TicketType::Complaint
        } else {
            TicketType::Request
        }
    }

    pub fn category(&self, text: &str) -> TicketCategory {
        let lower = text.to_lowercase();
        if contains_any(&lower, ACCOUNT_KEYWORDS) {
            TicketCategory::Account
        } else if contains_any(&lower, BILLING_KEYWORDS) {
            TicketCategory::Billing
        } else if contains_any(&lower, FEATURE_KEYWORDS) {
            TicketCategory::Feature
        } else if contains_any(&lower, BUG_KEYWORDS) {
            TicketCategory::Bug
        } else {
            TicketCategory::Technical
        }
    }

    pub fn priority(&self, text: &str) -> TicketPriority {
        let lower = text.to_lowercase();
        if contains_any(&lower, URGENT_KEYWORDS) {
            TicketPriority::Urgent
        } else if contains_any(&lower, HIGH_KEYWORDS) {
            TicketPriority::High
        } else if contains_any(&lower, LOW_KEYWORDS) {
            TicketPriority::Low
        } else {
            TicketPriority::Medium
        }
    }

    /// Classify a ticket subject.
    pub fn classify(&self, title: &str, description: &str) -> ClassificationResult {
        let text = format!("{} {}", title, description);
        let ticket_type = self.ticket_type(&text);
        let category = self.category(&text);
        let priority = self.priority(&text);

        ClassificationResult::new(
            ticket_type,
            category,
            priority,
            suggested_response(title.trim(), ticket_type, category, priority),
        )
    }

    /// Classify a conversational request; the reply answers the last message
    /// when there is one.
    pub fn converse(&self, request: &ClassificationRequest) -> ClassificationResult {
        let ticket = request.ticket();
        let message = request.message_text();
        let text = format!("{} {} {}", ticket.title(), ticket.description(), message);
        let ticket_type = self.ticket_type(&text);
        let category = self.category(&text);
        let priority = self.priority(&text);

        let response = if message.is_empty() {
            suggested_response(ticket.title(), ticket_type, category, priority)
        } else {
            self.support_reply(message, Some(priority)).response
        };

        ClassificationResult::new(ticket_type, category, priority, response)
    }

    /// Category guess. Keyword matches are never reported with high confidence.
    pub fn predict_category(&self, title: &str, description: &str) -> CategoryPrediction {
        CategoryPrediction {
            category: self.category(&format!("{} {}", title, description)),
            confidence: Confidence::Low,
        }
    }

    /// Canned support answer chosen by keyword.
    ///
    /// The delay answer depends on the ticket priority; a missing priority
    /// gets the longest delay.
    pub fn support_reply(&self, message: &str, priority: Option<TicketPriority>) -> SupportReply {
        let lower = message.to_lowercase();

        let text = if contains_any(&lower, GREETING_KEYWORDS) {
            GREETING_REPLY
        } else if contains_any(&lower, THANKS_KEYWORDS) {
            THANKS_REPLY
        } else if contains_any(&lower, DELAY_KEYWORDS) {
            delay_reply(priority)
        } else if contains_any(&lower, PROBLEM_KEYWORDS) {
            PROBLEM_REPLY
        } else if contains_any(&lower, HUMAN_KEYWORDS) {
            HUMAN_REPLY
        } else {
            DEFAULT_REPLY
        };

        SupportReply::new(text)
    }
}

const GREETING_REPLY: &str = "Bonjour ! Comment puis-je vous aider concernant votre ticket ?";

const THANKS_REPLY: &str = "Je vous en prie ! N'hésitez pas si vous avez d'autres questions.";

const PROBLEM_REPLY: &str = "Je comprends que vous rencontrez un problème. Pourriez-vous me donner plus de détails ? Par exemple, quand est-ce que cela se produit et quelles sont les étapes pour reproduire le problème ?";

const HUMAN_REPLY: &str = "Je vais transférer votre demande à un agent humain. Un membre de notre équipe vous contactera dès que possible.";

const DEFAULT_REPLY: &str = "Merci pour votre message. Je vais transmettre ces informations à notre équipe qui traite votre ticket. Y a-t-il autre chose que je puisse faire pour vous aider ?";

fn delay_reply(priority: Option<TicketPriority>) -> &'static str {
    match priority {
        Some(TicketPriority::Urgent) => {
            "Votre ticket est marqué comme urgent. Un agent devrait vous répondre dans les 2 heures ouvrables."
        }
        Some(TicketPriority::High) => {
            "Votre ticket est prioritaire. Un agent devrait vous répondre dans les 4 heures ouvrables."
        }
        Some(TicketPriority::Medium) => "Un agent devrait traiter votre ticket dans les 24 heures.",
        Some(TicketPriority::Low) | None => "Votre ticket sera traité dans un délai de 72 heures maximum.",
    }
}

fn suggested_response(
    title: &str,
    ticket_type: TicketType,
    category: TicketCategory,
    priority: TicketPriority,
) -> String {
    let mut text = if title.is_empty() {
        "Merci pour votre ticket. ".to_string()
    } else {
        format!("Merci pour votre ticket concernant \"{}\". ", title)
    };

    match ticket_type {
        TicketType::Incident => {
            text.push_str("Nous sommes désolés pour ce problème. Notre équipe technique va l'examiner rapidement. ");
            match category {
                TicketCategory::Account => text.push_str(
                    "En attendant, essayez de vous déconnecter puis de vous reconnecter, ou de réinitialiser votre mot de passe. ",
                ),
                TicketCategory::Technical | TicketCategory::Bug => text.push_str(
                    "Pourriez-vous préciser votre navigateur et votre système d'exploitation ? ",
                ),
                _ => {}
            }
        }
        TicketType::Request => {
            text.push_str("Nous avons bien reçu votre demande et la traiterons dans les meilleurs délais. ")
        }
        TicketType::Suggestion => {
            text.push_str("Merci pour votre suggestion ! Nous la transmettons à l'équipe produit. ")
        }
        TicketType::Complaint => text.push_str(
            "Nous sommes désolés de cette mauvaise expérience. Un responsable va examiner votre réclamation. ",
        ),
    }

    if priority == TicketPriority::Urgent {
        text.push_str("Compte tenu de l'urgence, votre ticket est traité en priorité.");
    }

    text.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_french_login_incident() {
        let result = KeywordHeuristics::new().classify(
            "Impossible de me connecter",
            "Erreur : mot de passe refusé, c'est urgent",
        );
        assert_eq!(result.ticket_type, TicketType::Incident);
        assert_eq!(result.category, TicketCategory::Account);
        assert_eq!(result.priority, TicketPriority::Urgent);
        assert!(result.suggested_response.contains("\"Impossible de me connecter\""));
        assert!(result.suggested_response.ends_with("traité en priorité."));
        assert_eq!(result.response, result.suggested_response);
    }

    #[test]
    fn test_english_rules() {
        let h = KeywordHeuristics::new();
        assert_eq!(h.ticket_type("I have an improvement idea"), TicketType::Suggestion);
        assert_eq!(h.ticket_type("Formal complaint"), TicketType::Complaint);
        assert_eq!(h.category("Wrong invoice amount"), TicketCategory::Billing);
        assert_eq!(h.category("Please build a dark mode feature"), TicketCategory::Feature);
        assert_eq!(h.priority("No rush on this one"), TicketPriority::Low);
        assert_eq!(h.priority("Please fix quickly"), TicketPriority::High);
    }

    #[test]
    fn test_defaults_when_nothing_matches() {
        let result = KeywordHeuristics::new().classify("", "Question générale");
        assert_eq!(result.ticket_type, TicketType::Request);
        assert_eq!(result.category, TicketCategory::Technical);
        assert_eq!(result.priority, TicketPriority::Medium);
        assert!(result.suggested_response.starts_with("Merci pour votre ticket. "));
    }

    #[test]
    fn test_category_prediction_is_low_confidence() {
        let prediction = KeywordHeuristics::new().predict_category("Abonnement", "");
        assert_eq!(prediction.category, TicketCategory::Billing);
        assert_eq!(prediction.confidence, Confidence::Low);
    }

    #[test]
    fn test_support_reply_delay_follows_priority() {
        let h = KeywordHeuristics::new();
        let urgent = h.support_reply("Quel est le délai ?", Some(TicketPriority::Urgent));
        assert!(urgent.response.contains("2 heures ouvrables"));
        let high = h.support_reply("Quand aurai-je une réponse ?", Some(TicketPriority::High));
        assert!(high.response.contains("4 heures ouvrables"));
        let medium = h.support_reply("Dois-je attendre ?", Some(TicketPriority::Medium));
        assert_eq!(medium.response, "Un agent devrait traiter votre ticket dans les 24 heures.");
        let low = h.support_reply("Quel délai ?", Some(TicketPriority::Low));
        assert!(low.response.contains("72 heures"));
    }

    #[test]
    fn test_support_reply_without_priority_promises_longest_delay() {
        let reply = KeywordHeuristics::new().support_reply("Quel délai ?", None);
        assert_eq!(reply.response, "Votre ticket sera traité dans un délai de 72 heures maximum.");
    }

    #[test]
    fn test_support_reply_keywords() {
        let h = KeywordHeuristics::new();
        assert_eq!(
            h.support_reply("Bonjour", None).response,
            "Bonjour ! Comment puis-je vous aider concernant votre ticket ?"
        );
        assert_eq!(
            h.support_reply("Merci beaucoup", None).response,
            "Je vous en prie ! N'hésitez pas si vous avez d'autres questions."
        );
        assert!(h
            .support_reply("J'ai une erreur", None)
            .response
            .starts_with("Je comprends que vous rencontrez un problème. Pourriez-vous me donner plus de détails ?"));
        assert_eq!(
            h.support_reply("Je veux parler à un humain", None).response,
            "Je vais transférer votre demande à un agent humain. Un membre de notre équipe vous contactera dès que possible."
        );
        assert!(h
            .support_reply("Ok", None)
            .response
            .starts_with("Merci pour votre message. Je vais transmettre ces informations"));
    }

    #[test]
    fn test_converse_answers_message() {
        let request = ClassificationRequest::message("Merci pour votre aide")
            .with_ticket(smart_ticket_core::types::TicketContext::new("Facture erronée", ""));
        let result = KeywordHeuristics::new().converse(&request);
        assert_eq!(result.category, TicketCategory::Billing);
        assert!(result.response.starts_with("Je vous en prie"));
    }
}
