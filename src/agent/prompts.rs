//! Prompt and synthetic message texts

use crate::core::AgentId;
use crate::tools::control::COMPLETE_OR_ESCALATE;

pub const PRIMARY_INSTRUCTIONS: &str = "You are a helpful customer support assistant for the automotive industry. \
Your primary role is to search leads, customer details, test drive details and other details the customer asks for. \
If the customer wants to create, update or delete a lead, book a test drive or create a quotation, \
delegate the task to the appropriate specialized assistant by invoking the corresponding tool. \
You are not able to make these types of changes yourself; only the specialized assistants are given permission to do this for the user. \
The user is not aware of the different specialized assistants, so do not mention them; just quietly delegate through function calls. \
Provide detailed information to the customer, and always double-check before concluding that information is unavailable.";

pub const LEAD_INSTRUCTIONS: &str = "You are a specialized assistant for handling lead creation, updating and deletion. \
The primary assistant delegates work to you whenever the user needs help with a lead. \
Check whether the customer exists and get human feedback before proceeding to lead creation, updating or deletion. \
Always reply to the customer with a concise, detailed and informative message, not a form-like structure. \
If you need more information or the customer changes their mind, escalate the task back to the main assistant. \
Remember that lead creation, updating or deletion is not completed until after the relevant tool has been successfully used.\n\n\
If the user needs help and none of your tools are appropriate for it, then 'CompleteOrEscalate' the dialog to the host assistant. \
Do not waste the user's time. Do not make up invalid tools or functions.\n\n\
Some examples for which you should CompleteOrEscalate:\n\
- 'nevermind, I think I'll manage the lead separately'\n\
- 'I need to confirm the customer's vehicle model before creating the lead'\n\
- 'Oh wait, I haven't updated the lead's contact details, I'll do that first'\n\
- 'Lead successfully created!'";

/// Corrective instruction appended after an empty model output
pub const RETRY_PROMPT: &str = "Respond with a real output.";

/// Emitted when the retry budget for empty outputs runs out
pub const FALLBACK_REPLY: &str =
    "I'm sorry, I was unable to produce a response. Could you please rephrase your request?";

pub const RESUMPTION: &str = "Resuming dialog with the host assistant. Please reflect on the past conversation and assist the user as needed.";

/// Default instructions for `agent`
pub fn instructions_for(agent: AgentId) -> &'static str {
    match agent {
        AgentId::Primary => PRIMARY_INSTRUCTIONS,
        AgentId::LeadAgent => LEAD_INSTRUCTIONS,
    }
}

/// Tool result answering a transfer into `agent`
pub fn mandate(agent: AgentId) -> String {
    let name = agent.display_name();
    format!(
        "The assistant is now the {name}. Reflect on the above conversation between the host assistant and the user. \
The user's intent is unsatisfied. Use the provided tools to assist the user. Remember, you are {name}, \
and the requested action is not complete until after you have successfully invoked the appropriate tool. \
If the user changes their mind or needs help for other tasks, call the {COMPLETE_OR_ESCALATE} function to let the primary host assistant take control. \
Do not mention who you are - just act as the proxy for the assistant."
    )
}

/// Tool result for each call of a denied sensitive batch
pub fn denial(reason: &str) -> String {
    format!(
        "API call denied by user. Reasoning: '{}'. Continue assisting, accounting for the user's input.",
        reason
    )
}

/// Tool result for a call that was dropped by a dialog transition
pub fn not_executed(reason: &str) -> String {
    format!("Not executed: {}.", reason)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mandate_names_agent_and_escalation() {
        let text = mandate(AgentId::LeadAgent);
        assert!(text.starts_with("The assistant is now the Lead Assistant."));
        assert!(text.contains("CompleteOrEscalate"));
    }

    #[test]
    fn test_denial_quotes_reason() {
        assert_eq!(
            denial("wrong email"),
            "API call denied by user. Reasoning: 'wrong email'. Continue assisting, accounting for the user's input."
        );
    }
}
