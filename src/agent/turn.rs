//! Turn bookkeeping
//!
//! Phases a turn moves through, how it ends, and the operator's decision
//! on a suspended sensitive action.

use serde::{Deserialize, Serialize};

use crate::agent::state::{ConversationState, ThreadId};
use crate::core::{AgentId, Message, ToolCall};

/// Where the scheduler is within a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnPhase {
    PrimaryActive,
    SpecialistActive(AgentId),
    AwaitingSafeTool,
    /// Suspension point; nothing sensitive runs from here without approval
    AwaitingSensitiveTool,
    TurnComplete,
}

impl TurnPhase {
    /// Phase in which `agent` is driving
    pub fn active(agent: AgentId) -> Self {
        match agent {
            AgentId::Primary => TurnPhase::PrimaryActive,
            other => TurnPhase::SpecialistActive(other),
        }
    }
}

impl std::fmt::Display for TurnPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TurnPhase::PrimaryActive => write!(f, "PRIMARY_ACTIVE"),
            TurnPhase::SpecialistActive(agent) => write!(f, "SPECIALIST_ACTIVE({})", agent),
            TurnPhase::AwaitingSafeTool => write!(f, "AWAITING_SAFE_TOOL"),
            TurnPhase::AwaitingSensitiveTool => write!(f, "AWAITING_SENSITIVE_TOOL"),
            TurnPhase::TurnComplete => write!(f, "TURN_COMPLETE"),
        }
    }
}

/// How a turn ended
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// The active agent replied without tool calls
    Completed { reply: String },
    /// Suspended before a sensitive batch
    AwaitingConfirmation { pending: Vec<ToolCall> },
    /// The router refused to guess about the requested batch
    Unresolved {
        reply: Option<String>,
        tools: Vec<String>,
    },
    /// The per-turn node budget ran out
    StepLimitReached,
}

impl TurnOutcome {
    pub fn is_suspended(&self) -> bool {
        matches!(self, TurnOutcome::AwaitingConfirmation { .. })
    }

    /// Text to show the operator, if the outcome carries one
    pub fn reply(&self) -> Option<&str> {
        match self {
            TurnOutcome::Completed { reply } => Some(reply),
            TurnOutcome::Unresolved { reply, .. } => reply.as_deref(),
            _ => None,
        }
    }
}

/// Operator decision on a pending sensitive action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Approve,
    Deny { reason: Option<String> },
}

impl Decision {
    /// Parse operator input: "y" approves, anything else denies with the
    /// input as the reason
    pub fn from_input(input: &str) -> Self {
        let trimmed = input.trim();
        if trimmed.eq_ignore_ascii_case("y") {
            Decision::Approve
        } else if trimmed.is_empty() {
            Decision::Deny { reason: None }
        } else {
            Decision::Deny {
                reason: Some(trimmed.to_string()),
            }
        }
    }
}

/// Everything a caller needs after a turn or resume
#[derive(Debug, Clone)]
pub struct TurnReport {
    pub thread_id: ThreadId,
    pub outcome: TurnOutcome,
    pub active_agent: AgentId,
    pub dialog_stack: Vec<AgentId>,
    /// Messages appended during this call, in order
    pub new_messages: Vec<Message>,
    /// Node executions spent
    pub steps: usize,
}

impl TurnReport {
    pub(crate) fn new(
        state: &ConversationState,
        outcome: TurnOutcome,
        first_new: usize,
        steps: usize,
    ) -> Self {
        Self {
            thread_id: state.thread_id.clone(),
            outcome,
            active_agent: state.active_agent(),
            dialog_stack: state.dialog_stack.as_slice().to_vec(),
            new_messages: state.messages[first_new.min(state.messages.len())..].to_vec(),
            steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision_from_input() {
        assert_eq!(Decision::from_input("y"), Decision::Approve);
        assert_eq!(Decision::from_input(" Y "), Decision::Approve);
        assert_eq!(
            Decision::from_input("use the other email"),
            Decision::Deny {
                reason: Some("use the other email".into())
            }
        );
        assert_eq!(Decision::from_input(""), Decision::Deny { reason: None });
    }

    #[test]
    fn test_active_phase() {
        assert_eq!(TurnPhase::active(AgentId::Primary), TurnPhase::PrimaryActive);
        assert_eq!(TurnPhase::active(AgentId::LeadAgent), TurnPhase::SpecialistActive(AgentId::LeadAgent));
    }
}
