//! Agent node
//!
//! Wraps one agent profile around a model provider. Given the history it
//! produces the next assistant message, retrying a bounded number of times
//! when the model answers with nothing.

use std::sync::Arc;

use chrono::Utc;
use chrono_tz::Tz;
use tracing::{debug, warn};

use crate::agent::profile::AgentProfile;
use crate::agent::prompts;
use crate::core::{AgentId, Message, Result, ToolCall};
use crate::llm::{GenerateOptions, LLMProvider, LLMResponse};

/// One LLM role bound to its provider
#[derive(Clone)]
pub struct AgentNode {
    profile: Arc<AgentProfile>,
    llm: Arc<dyn LLMProvider>,
    timezone: Tz,
    max_empty_retries: usize,
}

impl AgentNode {
    pub fn new(
        profile: AgentProfile,
        llm: Arc<dyn LLMProvider>,
        timezone: Tz,
        max_empty_retries: usize,
    ) -> Self {
        Self {
            profile: Arc::new(profile),
            llm,
            timezone,
            max_empty_retries,
        }
    }

    pub fn agent(&self) -> AgentId {
        self.profile.agent()
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Instructions plus the current time in the configured timezone
    pub fn system_prompt(&self) -> String {
        format!(
            "{}\nCurrent time: {}",
            self.profile.instructions(),
            Utc::now().with_timezone(&self.timezone).to_rfc3339()
        )
    }

    /// Produce the messages to append: one corrective prompt per empty
    /// output, followed by the agent's message.
    pub async fn respond(&self, history: &[Message]) -> Result<Vec<Message>> {
        let mut request = Vec::with_capacity(history.len() + 2);
        request.push(Message::system(self.system_prompt()));
        request.extend_from_slice(history);

        let options = GenerateOptions {
            temperature: self.profile.temperature(),
            ..Default::default()
        };

        let mut appended = Vec::new();
        let mut retries = 0;

        loop {
            let response = self
                .llm
                .chat_with_tools(
                    self.profile.model(),
                    &request,
                    self.profile.definitions(),
                    Some(options.clone()),
                )
                .await?;

            let message = into_message(response);
            if !message.is_blank() {
                debug!(
                    agent = %self.agent(),
                    tools = ?message.tool_names(),
                    retries,
                    "agent responded"
                );
                appended.push(message);
                return Ok(appended);
            }

            if retries >= self.max_empty_retries {
                warn!(agent = %self.agent(), retries, "model kept answering with nothing");
                appended.push(Message::assistant(prompts::FALLBACK_REPLY));
                return Ok(appended);
            }

            retries += 1;
            debug!(agent = %self.agent(), retries, "empty output, retrying");
            let nudge = Message::user(prompts::RETRY_PROMPT);
            request.push(nudge.clone());
            appended.push(nudge);
        }
    }
}

/// Build the assistant message, making call ids present and unique
fn into_message(response: LLMResponse) -> Message {
    let mut seen: Vec<String> = Vec::new();
    let calls = response
        .tool_calls
        .into_iter()
        .map(|call| {
            let call = if call.id.trim().is_empty() || seen.contains(&call.id) {
                ToolCall::new(call.name, call.arguments)
            } else {
                call
            };
            seen.push(call.id.clone());
            call
        })
        .collect();
    Message::assistant_with_tools(response.content, calls)
}
