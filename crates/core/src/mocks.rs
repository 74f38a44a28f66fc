//! Mock implementations of core traits for testing.
//!
//! These are used across the workspace for unit and integration tests that
//! must not reach a real provider.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::{
    traits::{ChatMessage, CompletionOptions, LlmClient, LlmResponse, LlmUsage},
    Error, Result,
};

// =============================================================================
// Mock LLM Client
// =============================================================================

/// A failure the mock should simulate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockFailure {
    /// Connection could not be established.
    Transport,
    /// The provider did not answer in time.
    Timeout,
    /// The provider answered with a non-2xx status.
    Status(u16),
    /// The provider answered 200 without any completion.
    MissingChoices,
}

impl MockFailure {
    fn to_error(&self) -> Error {
        match self {
            MockFailure::Transport => Error::Transport("mock connection refused".to_string()),
            MockFailure::Timeout => Error::Timeout("mock request timed out".to_string()),
            MockFailure::Status(status) => Error::ProviderStatus {
                status: *status,
                message: "mock provider error".to_string(),
            },
            MockFailure::MissingChoices => {
                Error::model_provider("response contained no choices")
            }
        }
    }
}

/// One scripted reaction of the mock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    Fail(MockFailure),
}

/// Scripted mock LLM that returns predefined replies and records every call.
///
/// Replies are consumed in order; once the script is exhausted the last
/// reply repeats.
pub struct MockLlm {
    script: Vec<MockReply>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
}

impl MockLlm {
    /// Create a mock from an ordered script.
    pub fn scripted(script: Vec<MockReply>) -> Self {
        Self {
            script,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Create a mock that always returns the same completion.
    pub fn constant(response: &str) -> Self {
        Self::scripted(vec![MockReply::Text(response.to_string())])
    }

    /// Create a mock that always fails.
    pub fn failing(failure: MockFailure) -> Self {
        Self::scripted(vec![MockReply::Fail(failure)])
    }

    /// Get the number of calls made to this mock.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Content of the last user message received, if any call was made.
    pub fn last_prompt(&self) -> Option<String> {
        self.calls
            .lock()
            .unwrap()
            .last()
            .and_then(|messages| messages.iter().rev().find(|m| m.role == "user"))
            .map(|m| m.content.clone())
    }

    /// All messages of the last call.
    pub fn last_messages(&self) -> Vec<ChatMessage> {
        self.calls.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn chat(&self, messages: &[ChatMessage], _options: &CompletionOptions) -> Result<LlmResponse> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(messages.to_vec());
            calls.len() - 1
        };

        let reply = self
            .script
            .get(index)
            .or_else(|| self.script.last())
            .cloned()
            .unwrap_or_else(|| MockReply::Text(String::new()));

        match reply {
            MockReply::Text(content) => Ok(LlmResponse {
                usage: LlmUsage {
                    prompt_tokens: 10,
                    completion_tokens: 20,
                    total_tokens: 30,
                },
                content,
                model: "mock".to_string(),
                finish_reason: Some("stop".to_string()),
            }),
            MockReply::Fail(failure) => Err(failure.to_error()),
        }
    }

    fn model_id(&self) -> &str {
        "mock"
    }
}
