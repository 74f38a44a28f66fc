//! Triage service.
//!
//! Each operation validates its input, then runs prompt, provider call and
//! extraction strictly in sequence. Input errors are returned; every later
//! failure is absorbed into the operation's fixed fallback value.

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use smart_ticket_core::{
    config::{ModelGatewayConfig, TriageConfig},
    traits::{CompletionOptions, LlmClient},
    types::{
        CategoryPrediction, ClassificationRequest, ClassificationResult, Confidence, SupportReply, TicketContext,
        TicketPriority, SUPPORT_EMPTY_REPLY, SUPPORT_FAILURE_REPLY,
    },
    Result,
};
use smart_ticket_governance::{track_fallback, track_llm_call, track_tokens};

use crate::extract::{self, ExtractError};
use crate::heuristics::KeywordHeuristics;
use crate::prompt::{self, PromptBuilder};

/// Pipeline stage at which a request fell back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackStage {
    /// The prompt template failed to render.
    Prompt,
    /// The provider call failed or returned an unusable envelope.
    Provider,
    /// The completion held no `{...}` span.
    NoJsonSpan,
    /// The span did not parse as JSON.
    MalformedJson,
    /// A one-word answer named no known value.
    Unrecognized,
}

impl FallbackStage {
    /// Label used in logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            FallbackStage::Prompt => "prompt",
            FallbackStage::Provider => "provider",
            FallbackStage::NoJsonSpan => "no_json_span",
            FallbackStage::MalformedJson => "malformed_json",
            FallbackStage::Unrecognized => "unrecognized",
        }
    }
}

impl From<&ExtractError> for FallbackStage {
    fn from(err: &ExtractError) -> Self {
        match err {
            ExtractError::NoJsonSpan => FallbackStage::NoJsonSpan,
            ExtractError::Malformed(_) => FallbackStage::MalformedJson,
        }
    }
}

/// Result of a pipeline run, recording whether the fallback was used.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Succeeded(T),
    Fallback {
        value: T,
        stage: FallbackStage,
        detail: String,
    },
}

/// Outcome of a classification run.
pub type TriageOutcome = Outcome<ClassificationResult>;

impl<T> Outcome<T> {
    pub fn value(&self) -> &T {
        match self {
            Outcome::Succeeded(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            Outcome::Succeeded(value) | Outcome::Fallback { value, .. } => value,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Outcome::Fallback { .. })
    }

    pub fn stage(&self) -> Option<FallbackStage> {
        match self {
            Outcome::Succeeded(_) => None,
            Outcome::Fallback { stage, .. } => Some(*stage),
        }
    }
}

/// Sampling and context limits for each operation.
#[derive(Debug, Clone)]
pub struct TriageSettings {
    /// Prior turns kept in conversational prompts.
    pub max_history_turns: usize,
    pub classification: CompletionOptions,
    pub category: CompletionOptions,
    pub support: CompletionOptions,
}

impl Default for TriageSettings {
    fn default() -> Self {
        Self {
            max_history_turns: 10,
            classification: CompletionOptions::default(),
            category: CompletionOptions {
                temperature: 0.3,
                max_tokens: 50,
            },
            support: CompletionOptions {
                temperature: 0.7,
                max_tokens: 300,
            },
        }
    }
}

impl TriageSettings {
    /// Settings from configuration; classification sampling follows the
    /// model gateway section.
    pub fn from_config(triage: &TriageConfig, model: &ModelGatewayConfig) -> Self {
        Self {
            max_history_turns: triage.max_history_turns,
            classification: CompletionOptions {
                temperature: model.temperature,
                max_tokens: model.max_tokens,
            },
            ..Self::default()
        }
    }
}

enum Engine {
    Llm(Arc<dyn LlmClient>),
    Offline(KeywordHeuristics),
}

/// Classifies tickets and answers support questions.
pub struct TriageService {
    engine: Engine,
    prompts: PromptBuilder,
    settings: TriageSettings,
}

impl TriageService {
    /// Service backed by a model provider.
    pub fn new(client: Arc<dyn LlmClient>, settings: TriageSettings) -> Result<Self> {
        Self::with_engine(Engine::Llm(client), settings)
    }

    /// Service answering from keyword heuristics without any provider call.
    pub fn offline(settings: TriageSettings) -> Result<Self> {
        Self::with_engine(Engine::Offline(KeywordHeuristics::new()), settings)
    }

    fn with_engine(engine: Engine, settings: TriageSettings) -> Result<Self> {
        Ok(Self {
            engine,
            prompts: PromptBuilder::new(settings.max_history_turns)?,
            settings,
        })
    }

    pub fn is_offline(&self) -> bool {
        matches!(self.engine, Engine::Offline(_))
    }

    /// Classify a ticket from its title and description.
    pub async fn classify_ticket(&self, title: &str, description: &str) -> Result<ClassificationResult> {
        Ok(self.classify_ticket_outcome(title, description).await?.into_value())
    }

    pub async fn classify_ticket_outcome(&self, title: &str, description: &str) -> Result<TriageOutcome> {
        prompt::require_subject(title, description)?;

        let client = match &self.engine {
            Engine::Llm(client) => client,
            Engine::Offline(heuristics) => return Ok(Outcome::Succeeded(heuristics.classify(title, description))),
        };

        Ok(self
            .run_classification(client.as_ref(), self.prompts.classification(title, description, None))
            .await)
    }

    /// Classify a ticket and answer the user's latest message.
    pub async fn converse(&self, request: &ClassificationRequest) -> Result<ClassificationResult> {
        Ok(self.converse_outcome(request).await?.into_value())
    }

    pub async fn converse_outcome(&self, request: &ClassificationRequest) -> Result<TriageOutcome> {
        prompt::require_conversation(request)?;

        tracing::info!(
            user = %request.user_email(),
            history_turns = request.history().len(),
            has_message = !request.message_text().is_empty(),
            "Conversational triage request"
        );

        let client = match &self.engine {
            Engine::Llm(client) => client,
            Engine::Offline(heuristics) => return Ok(Outcome::Succeeded(heuristics.converse(request))),
        };

        Ok(self
            .run_classification(client.as_ref(), self.prompts.conversation(request))
            .await)
    }

    /// Predict only the category of a ticket.
    pub async fn predict_category(&self, title: &str, description: &str) -> Result<CategoryPrediction> {
        Ok(self.predict_category_outcome(title, description).await?.into_value())
    }

    pub async fn predict_category_outcome(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Outcome<CategoryPrediction>> {
        prompt::require_subject(title, description)?;

        let client = match &self.engine {
            Engine::Llm(client) => client,
            Engine::Offline(heuristics) => {
                return Ok(Outcome::Succeeded(heuristics.predict_category(title, description)))
            }
        };

        let prompt = match self.prompts.category(title, description) {
            Ok(prompt) => prompt,
            Err(e) => return Ok(fallback(CategoryPrediction::fallback(), FallbackStage::Prompt, e)),
        };

        let answer = match self.complete(client.as_ref(), prompt, &self.settings.category).await {
            Ok(answer) => answer,
            Err(e) => return Ok(fallback(CategoryPrediction::fallback(), FallbackStage::Provider, e)),
        };

        Ok(match extract::parse_category(&answer) {
            Some(category) => Outcome::Succeeded(CategoryPrediction {
                category,
                confidence: Confidence::High,
            }),
            None => {
                tracing::debug!(raw = %answer, "Unrecognized category answer");
                fallback(
                    CategoryPrediction::fallback(),
                    FallbackStage::Unrecognized,
                    "answer names no known category",
                )
            }
        })
    }

    /// Free-text answer to a support question.
    pub async fn support_reply(&self, message: &str, ticket: Option<&TicketContext>) -> Result<SupportReply> {
        Ok(self.support_reply_outcome(message, ticket).await?.into_value())
    }

    pub async fn support_reply_outcome(
        &self,
        message: &str,
        ticket: Option<&TicketContext>,
    ) -> Result<Outcome<SupportReply>> {
        prompt::require_message(message)?;

        let client = match &self.engine {
            Engine::Llm(client) => client,
            Engine::Offline(heuristics) => {
                let priority = ticket
                    .and_then(|t| t.priority.as_deref())
                    .and_then(|p| TicketPriority::parse(p.trim()));
                return Ok(Outcome::Succeeded(heuristics.support_reply(message, priority)));
            }
        };

        let failure = || SupportReply::new(SUPPORT_FAILURE_REPLY);

        let prompt = match self.prompts.support(message, ticket) {
            Ok(prompt) => prompt,
            Err(e) => return Ok(fallback(failure(), FallbackStage::Prompt, e)),
        };

        Ok(match self.complete(client.as_ref(), prompt, &self.settings.support).await {
            Ok(answer) if answer.trim().is_empty() => Outcome::Succeeded(SupportReply::new(SUPPORT_EMPTY_REPLY)),
            Ok(answer) => Outcome::Succeeded(SupportReply::new(answer.trim())),
            Err(e) => fallback(failure(), FallbackStage::Provider, e),
        })
    }

    async fn run_classification(&self, client: &dyn LlmClient, prompt: Result<String>) -> TriageOutcome {
        let prompt = match prompt {
            Ok(prompt) => prompt,
            Err(e) => return fallback(ClassificationResult::fallback(), FallbackStage::Prompt, e),
        };

        let completion = match self.complete(client, prompt, &self.settings.classification).await {
            Ok(completion) => completion,
            Err(e) => return fallback(ClassificationResult::fallback(), FallbackStage::Provider, e),
        };

        match extract::parse_classification(completion.trim()) {
            Ok(result) => {
                tracing::debug!(
                    ticket_type = %result.ticket_type,
                    category = %result.category,
                    priority = %result.priority,
                    "Ticket classified"
                );
                Outcome::Succeeded(result)
            }
            Err(e) => {
                tracing::debug!(raw = %completion, "Unusable classification completion");
                fallback(ClassificationResult::fallback(), FallbackStage::from(&e), e)
            }
        }
    }

    /// One provider round trip, returning the completion text.
    async fn complete(&self, client: &dyn LlmClient, prompt: String, options: &CompletionOptions) -> Result<String> {
        let messages = prompt::messages(prompt);
        let started = Instant::now();
        let result = client.chat(&messages, options).await;
        track_llm_call(client.model_id(), started.elapsed().as_secs_f64(), result.is_ok());

        let response = result?;
        track_tokens(
            &response.model,
            response.usage.prompt_tokens,
            response.usage.completion_tokens,
        );
        Ok(response.content)
    }
}

fn fallback<T>(value: T, stage: FallbackStage, err: impl Display) -> Outcome<T> {
    let detail = err.to_string();
    tracing::warn!(stage = stage.as_str(), error = %detail, "Triage pipeline failed, returning fallback");
    track_fallback(stage.as_str());
    Outcome::Fallback { value, stage, detail }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smart_ticket_core::mocks::{MockFailure, MockLlm, MockReply};
    use smart_ticket_core::types::{TicketCategory, TicketType};

    fn service(mock: &Arc<MockLlm>) -> TriageService {
        TriageService::new(mock.clone(), TriageSettings::default()).unwrap()
    }

    #[tokio::test]
    async fn test_extraction_failure_stages() {
        let mock = Arc::new(MockLlm::scripted(vec![
            MockReply::Text("Je ne peux pas répondre.".to_string()),
            MockReply::Text("{type: incident}".to_string()),
        ]));
        let service = service(&mock);

        let first = service.classify_ticket_outcome("Titre", "").await.unwrap();
        assert_eq!(first.stage(), Some(FallbackStage::NoJsonSpan));
        assert_eq!(first.value(), &ClassificationResult::fallback());

        let second = service.classify_ticket_outcome("Titre", "").await.unwrap();
        assert_eq!(second.stage(), Some(FallbackStage::MalformedJson));
    }

    #[tokio::test]
    async fn test_provider_failure_stage() {
        let mock = Arc::new(MockLlm::failing(MockFailure::Status(503)));
        let outcome = service(&mock).classify_ticket_outcome("", "Lent").await.unwrap();
        assert_eq!(outcome.stage(), Some(FallbackStage::Provider));
        assert!(outcome.is_fallback());
    }

    #[tokio::test]
    async fn test_category_outcomes() {
        let mock = Arc::new(MockLlm::scripted(vec![
            MockReply::Text(" Billing.\n".to_string()),
            MockReply::Text("réseau".to_string()),
        ]));
        let service = service(&mock);

        let hit = service.predict_category_outcome("Facture", "").await.unwrap();
        assert_eq!(
            hit,
            Outcome::Succeeded(CategoryPrediction {
                category: TicketCategory::Billing,
                confidence: Confidence::High,
            })
        );

        let miss = service.predict_category_outcome("Wifi", "").await.unwrap();
        assert_eq!(miss.stage(), Some(FallbackStage::Unrecognized));
        assert_eq!(miss.into_value(), CategoryPrediction::fallback());
    }

    #[tokio::test]
    async fn test_blank_support_answer_uses_canned_reply() {
        let mock = Arc::new(MockLlm::constant("   "));
        let service = service(&mock);

        let reply = service.support_reply("Bonjour", None).await.unwrap();
        assert_eq!(reply.response, SUPPORT_EMPTY_REPLY);
    }

    #[tokio::test]
    async fn test_offline_engine_never_calls_provider() {
        let service = TriageService::offline(TriageSettings::default()).unwrap();
        assert!(service.is_offline());

        let result = service.classify_ticket("Bug d'affichage", "").await.unwrap();
        assert_eq!(result.ticket_type, TicketType::Incident);
        assert_eq!(result.category, TicketCategory::Bug);

        let ticket = TicketContext {
            priority: Some("high".to_string()),
            ..TicketContext::default()
        };
        let reply = service.support_reply("Quel délai ?", Some(&ticket)).await.unwrap();
        assert!(reply.response.contains("4 heures"));
    }

    #[test]
    fn test_settings_from_config() {
        let model = ModelGatewayConfig {
            temperature: 0.1,
            max_tokens: 200,
            ..ModelGatewayConfig::default()
        };
        let settings = TriageSettings::from_config(&TriageConfig { max_history_turns: 4 }, &model);
        assert_eq!(settings.max_history_turns, 4);
        assert_eq!(settings.classification.max_tokens, 200);
        assert_eq!(settings.support.max_tokens, 300);
    }
}
