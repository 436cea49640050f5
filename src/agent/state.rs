//! Conversation state
//!
//! The message history and dialog stack of one conversation thread, plus
//! the sensitive action waiting for confirmation, if any. This is the unit
//! the thread store persists between turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::{AgentId, Message, Role, ToolCall};

/// Opaque identifier of a conversation thread
pub type ThreadId = String;

/// Stack of specialists currently driving the conversation
///
/// Empty means the primary agent is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DialogStack(Vec<AgentId>);

impl DialogStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, agent: AgentId) {
        self.0.push(agent);
    }

    /// Pop the top agent; popping an empty stack does nothing
    pub fn pop(&mut self) -> Option<AgentId> {
        self.0.pop()
    }

    /// The agent owning the conversation
    pub fn active(&self) -> AgentId {
        self.0.last().copied().unwrap_or(AgentId::Primary)
    }

    pub fn depth(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[AgentId] {
        &self.0
    }

    pub fn apply(&mut self, op: StackOp) {
        match op {
            StackOp::Push(agent) => self.push(agent),
            StackOp::Pop => {
                self.pop();
            }
        }
    }
}

/// The only two valid dialog stack mutations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StackOp {
    Push(AgentId),
    Pop,
}

/// A partial state update produced by one node
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    /// Messages to append, in order
    pub messages: Vec<Message>,
    /// Stack change, if any
    pub stack: Option<StackOp>,
}

impl StateUpdate {
    pub fn messages(messages: Vec<Message>) -> Self {
        Self {
            messages,
            stack: None,
        }
    }

    pub fn message(message: Message) -> Self {
        Self::messages(vec![message])
    }

    pub fn with_stack(mut self, op: StackOp) -> Self {
        self.stack = Some(op);
        self
    }
}

/// A sensitive batch held back until the operator decides
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    /// Agent that requested the batch and will be resumed
    pub agent: AgentId,
    pub calls: Vec<ToolCall>,
    pub requested_at: DateTime<Utc>,
}

/// Persisted state of one conversation thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationState {
    pub thread_id: ThreadId,
    pub messages: Vec<Message>,
    pub dialog_stack: DialogStack,
    #[serde(default)]
    pub pending: Option<PendingAction>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationState {
    pub fn new(thread_id: impl Into<ThreadId>) -> Self {
        let now = Utc::now();
        Self {
            thread_id: thread_id.into(),
            messages: Vec::new(),
            dialog_stack: DialogStack::new(),
            pending: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Agent currently owning the conversation
    pub fn active_agent(&self) -> AgentId {
        self.dialog_stack.active()
    }

    /// Append messages and apply the stack operation
    pub fn apply(&mut self, update: StateUpdate) {
        self.messages.extend(update.messages);
        if let Some(op) = update.stack {
            let before = self.dialog_stack.active();
            self.dialog_stack.apply(op);
            debug!(
                thread = %self.thread_id,
                ?op,
                from = %before,
                to = %self.dialog_stack.active(),
                "dialog stack changed"
            );
        }
        self.updated_at = Utc::now();
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Tool calls of the last assistant message that were never answered
    pub fn unanswered_tool_calls(&self) -> Vec<ToolCall> {
        let Some(idx) = self
            .messages
            .iter()
            .rposition(|m| m.role == Role::Assistant)
        else {
            return Vec::new();
        };

        let answered: Vec<&str> = self.messages[idx + 1..]
            .iter()
            .filter_map(|m| m.tool_call_id.as_deref())
            .collect();

        self.messages[idx]
            .tool_calls
            .iter()
            .filter(|c| !answered.contains(&c.id.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stack_means_primary() {
        let stack = DialogStack::new();
        assert_eq!(stack.active(), AgentId::Primary);
    }

    #[test]
    fn test_top_of_stack_is_active() {
        let mut stack = DialogStack::new();
        stack.push(AgentId::LeadAgent);
        assert_eq!(stack.active(), AgentId::LeadAgent);
        assert_eq!(stack.pop(), Some(AgentId::LeadAgent));
        assert_eq!(stack.active(), AgentId::Primary);
    }

    #[test]
    fn test_pop_on_empty_is_noop() {
        let mut stack = DialogStack::new();
        assert_eq!(stack.pop(), None);
        stack.apply(StackOp::Pop);
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.active(), AgentId::Primary);
    }

    #[test]
    fn test_apply_appends_in_order() {
        let mut state = ConversationState::new("t1");
        let first = Message::user("one");
        let second = Message::assistant("two");
        let ids = (first.id, second.id);

        state.apply(StateUpdate::messages(vec![first, second]).with_stack(StackOp::Push(AgentId::LeadAgent)));

        assert_eq!(state.messages[0].id, ids.0);
        assert_eq!(state.messages[1].id, ids.1);
        assert_eq!(state.active_agent(), AgentId::LeadAgent);
    }

    #[test]
    fn test_unanswered_tool_calls() {
        let mut state = ConversationState::new("t1");
        let a = ToolCall::with_id("a", "x", serde_json::json!({}));
        let b = ToolCall::with_id("b", "y", serde_json::json!({}));
        state.apply(StateUpdate::messages(vec![
            Message::assistant_with_tools("", vec![a.clone(), b.clone()]),
            Message::tool(&a, "done"),
        ]));

        assert_eq!(state.unanswered_tool_calls(), vec![b]);
    }

    #[test]
    fn test_stack_serializes_as_list() {
        let mut stack = DialogStack::new();
        stack.push(AgentId::LeadAgent);
        assert_eq!(serde_json::to_string(&stack).unwrap(), r#"["lead_agent"]"#);
    }
}
