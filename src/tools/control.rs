//! Dialog control pseudo-tools
//!
//! These are offered to the model like any other tool, but they are never
//! executed by the invoker: the routers recognise them and the delegation
//! controller turns them into dialog stack transitions.

use serde::{Deserialize, Serialize};

use crate::core::{AgentId, ToolDefinition};

/// Escalation signal issued by a specialist to hand control back
pub const COMPLETE_OR_ESCALATE: &str = "CompleteOrEscalate";

/// Whether `name` is a control pseudo-tool rather than an executable tool
pub fn is_control_tool(name: &str) -> bool {
    name == COMPLETE_OR_ESCALATE || AgentId::from_transfer_tool(name).is_some()
}

/// Arguments of a transfer to a specialist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HandoffRequest {
    /// Where the user wants the lead created, updated or deleted
    pub location: String,
    pub name: String,
    pub phone: String,
    pub email: String,
    #[serde(alias = "civilID")]
    pub civil_id: String,
    /// Free-text intent of the user
    pub request: String,
}

/// Arguments of the escalation signal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EscalationRequest {
    #[serde(default = "default_cancel")]
    pub cancel: bool,
    #[serde(default)]
    pub reason: String,
}

fn default_cancel() -> bool {
    true
}

/// Schema of the transfer pseudo-tool for `target`
pub fn transfer_definition(target: AgentId) -> Option<ToolDefinition> {
    let name = target.transfer_tool()?;
    Some(ToolDefinition::function(
        name,
        "Transfer work to a specialized assistant to handle the lead relevant details \
         (create, update or delete a lead).",
        serde_json::json!({
            "type": "object",
            "properties": {
                "location": {
                    "type": "string",
                    "description": "The location where the user wants to create, update or delete the lead."
                },
                "name": { "type": "string", "description": "Name of the customer." },
                "phone": { "type": "string", "description": "Phone number of the customer." },
                "email": { "type": "string", "description": "Email of the customer." },
                "civil_id": { "type": "string", "description": "Civil ID of the customer." },
                "request": {
                    "type": "string",
                    "description": "Any additional information or requests from the user regarding the lead."
                }
            },
            "required": ["name", "request"]
        }),
    ))
}

/// Schema of the escalation signal
pub fn escalation_definition() -> ToolDefinition {
    ToolDefinition::function(
        COMPLETE_OR_ESCALATE,
        "Mark the current task as completed and/or escalate control of the dialog to the main \
         assistant, who can re-route the dialog based on the user's needs.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "cancel": {
                    "type": "boolean",
                    "description": "Whether the current task is being abandoned.",
                    "default": true
                },
                "reason": {
                    "type": "string",
                    "description": "Why control is handed back, e.g. 'I have fully completed the task.'"
                }
            },
            "required": ["reason"]
        }),
    )
}
