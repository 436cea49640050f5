//! Delegation controller
//!
//! Turns transfer and escalation requests into dialog stack transitions.
//! Every call of the triggering batch is answered, so the history handed to
//! the next agent stays well-formed.

use tracing::info;

use crate::agent::prompts;
use crate::agent::state::{ConversationState, StackOp, StateUpdate};
use crate::core::{AgentId, Message, ToolCall};
use crate::tools::control::{EscalationRequest, HandoffRequest, COMPLETE_OR_ESCALATE};

fn answer_batch(calls: &[ToolCall], first: String, rest: &str) -> Vec<Message> {
    calls
        .iter()
        .enumerate()
        .map(|(i, call)| {
            if i == 0 {
                Message::tool(call, first.clone())
            } else {
                Message::tool(call, prompts::not_executed(rest))
            }
        })
        .collect()
}

/// Hand the dialog to `target`
pub fn enter(output: &Message, target: AgentId) -> StateUpdate {
    if let Some(call) = output.tool_calls.first() {
        let handoff: HandoffRequest =
            serde_json::from_value(call.arguments.clone()).unwrap_or_default();
        info!(
            agent = %target,
            request = %handoff.request,
            location = %handoff.location,
            "entering specialist"
        );
    }

    StateUpdate::messages(answer_batch(
        &output.tool_calls,
        prompts::mandate(target),
        "the dialog was transferred to a specialist",
    ))
    .with_stack(StackOp::Push(target))
}

/// Hand the dialog back to the agent below the top of the stack
pub fn leave(output: &Message) -> StateUpdate {
    let reason = output
        .tool_calls
        .iter()
        .find(|call| call.name == COMPLETE_OR_ESCALATE)
        .and_then(|call| serde_json::from_value::<EscalationRequest>(call.arguments.clone()).ok())
        .map(|req| req.reason)
        .unwrap_or_default();
    info!(reason = %reason, "leaving specialist");

    StateUpdate::messages(answer_batch(
        &output.tool_calls,
        prompts::RESUMPTION.to_string(),
        "dialog returned to the host assistant",
    ))
    .with_stack(StackOp::Pop)
}

/// Answer calls left unanswered when a previous turn ended on an ambiguous
/// batch or the step limit
pub fn seal_unanswered(state: &ConversationState) -> StateUpdate {
    let messages = state
        .unanswered_tool_calls()
        .iter()
        .map(|call| {
            Message::tool(
                call,
                prompts::not_executed("the request could not be routed"),
            )
        })
        .collect();
    StateUpdate::messages(messages)
}
