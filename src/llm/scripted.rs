//! Scripted provider
//!
//! Replays canned responses in order and records every request, so dialog
//! flows can be exercised deterministically without a model server.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::{LeadflowError, Message, Result, ToolDefinition};
use crate::llm::traits::{GenerateOptions, LLMProvider, LLMResponse};

/// A request as seen by the scripted provider
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tool_names: Vec<String>,
}

impl RecordedRequest {
    /// The system prompt the request was made with, if any
    pub fn system_prompt(&self) -> Option<&str> {
        self.messages
            .first()
            .filter(|m| m.role == crate::core::Role::System)
            .map(|m| m.content.as_str())
    }
}

/// Provider returning pre-recorded responses
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<LLMResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedProvider {
    /// Create a provider that will answer with `responses`, in order
    pub fn new(responses: impl IntoIterator<Item = LLMResponse>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Queue another response
    pub fn push(&self, response: LLMResponse) {
        if let Ok(mut queue) = self.responses.lock() {
            queue.push_back(response);
        }
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|q| q.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn chat_with_tools(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.requests
            .lock()
            .map_err(|_| LeadflowError::llm("scripted provider poisoned"))?
            .push(RecordedRequest {
                model: model.to_string(),
                messages: messages.to_vec(),
                tool_names: tools.iter().map(|t| t.name().to_string()).collect(),
            });

        let mut response = self
            .responses
            .lock()
            .map_err(|_| LeadflowError::llm("scripted provider poisoned"))?
            .pop_front()
            .ok_or_else(|| LeadflowError::llm("scripted provider ran out of responses"))?;
        response.model = model.to_string();
        Ok(response)
    }

    async fn is_model_available(&self, _model: &str) -> Result<bool> {
        Ok(true)
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["scripted".to_string()])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
