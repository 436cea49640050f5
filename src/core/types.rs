//! Shared types used across Leadflow modules
//!
//! Contains message structures, tool definitions, agent identifiers and
//! the safety classification that drives routing.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role of a message author
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

/// A message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Stable identity, used by observers to print each message once
    pub id: Uuid,
    /// Role of the message sender
    pub role: Role,
    /// Content of the message
    pub content: String,
    /// Tool calls requested by the assistant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    /// For tool messages, the id of the call being answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    /// For tool messages, the name of the tool that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Message {
    fn with_role(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
            name: None,
        }
    }

    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::with_role(Role::User, content)
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::with_role(Role::Assistant, content)
    }

    /// Create an assistant message carrying tool calls
    pub fn assistant_with_tools(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls,
            ..Self::with_role(Role::Assistant, content)
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self::with_role(Role::System, content)
    }

    /// Create a tool result message answering `call`
    pub fn tool(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            tool_call_id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            ..Self::with_role(Role::Tool, content)
        }
    }

    /// Whether the message requests any tools
    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }

    /// An assistant output with neither text nor tool calls
    pub fn is_blank(&self) -> bool {
        self.tool_calls.is_empty() && self.content.trim().is_empty()
    }

    /// Names of the requested tools, in call order
    pub fn tool_names(&self) -> Vec<String> {
        self.tool_calls.iter().map(|c| c.name.clone()).collect()
    }
}

/// A tool call made by the LLM
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier, unique within the triggering message
    pub id: String,
    /// Name of the tool to invoke
    pub name: String,
    /// JSON arguments for the tool
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a new tool call with a generated id
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self::with_id(format!("call_{}", Uuid::new_v4().simple()), name, arguments)
    }

    /// Create a tool call with an explicit id
    pub fn with_id(
        id: impl Into<String>,
        name: impl Into<String>,
        arguments: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Definition of a tool that can be called by the LLM
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Type of tool (always "function" for now)
    #[serde(rename = "type")]
    pub tool_type: String,
    /// Function details
    pub function: FunctionDefinition,
}

/// Function definition within a tool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDefinition {
    /// Name of the function
    pub name: String,
    /// Description of what the function does
    pub description: String,
    /// JSON Schema for the parameters
    pub parameters: serde_json::Value,
}

impl ToolDefinition {
    /// Create a new function tool definition
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: description.into(),
                parameters,
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Result of executing a tool call
#[derive(Debug, Clone)]
pub struct ToolResult {
    /// Id of the call this result answers
    pub call_id: String,
    /// Name of the tool that was executed
    pub tool_name: String,
    /// Whether the execution was successful
    pub success: bool,
    /// Text handed back to the agent
    pub content: String,
}

impl ToolResult {
    /// Create a successful result
    pub fn success(call: &ToolCall, content: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: true,
            content: content.into(),
        }
    }

    /// Create a failed result
    pub fn failure(call: &ToolCall, error: impl Into<String>) -> Self {
        Self {
            call_id: call.id.clone(),
            tool_name: call.name.clone(),
            success: false,
            content: error.into(),
        }
    }

    /// Convert into the tool message appended to history
    pub fn into_message(self) -> Message {
        Message {
            tool_call_id: Some(self.call_id),
            name: Some(self.tool_name),
            ..Message::with_role(Role::Tool, self.content)
        }
    }
}

/// Side-effect classification of a tool, fixed per tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolSafety {
    /// Reads only; runs without confirmation
    Safe,
    /// Mutates persistent state; requires human confirmation
    Sensitive,
}

impl std::fmt::Display for ToolSafety {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolSafety::Safe => write!(f, "safe"),
            ToolSafety::Sensitive => write!(f, "sensitive"),
        }
    }
}

/// Identifier of an agent that can own the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    /// Host assistant; owns the conversation when the dialog stack is empty
    Primary,
    /// Specialist for lead creation, update and deletion
    LeadAgent,
}

impl AgentId {
    /// Specialists that can be pushed onto the dialog stack
    pub const SPECIALISTS: [AgentId; 1] = [AgentId::LeadAgent];

    /// Name of the pseudo-tool the primary agent calls to hand over
    pub fn transfer_tool(&self) -> Option<&'static str> {
        match self {
            AgentId::Primary => None,
            AgentId::LeadAgent => Some("ToLeadAssistant"),
        }
    }

    /// Resolve a transfer pseudo-tool name to the specialist it targets
    pub fn from_transfer_tool(name: &str) -> Option<AgentId> {
        Self::SPECIALISTS
            .into_iter()
            .find(|id| id.transfer_tool() == Some(name))
    }

    /// Human-readable name used in hand-off messages
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentId::Primary => "Primary Assistant",
            AgentId::LeadAgent => "Lead Assistant",
        }
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentId::Primary => write!(f, "primary_assistant"),
            AgentId::LeadAgent => write!(f, "lead_agent"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_message_links_call() {
        let call = ToolCall::with_id("call_1", "customer_existence_verification", serde_json::json!({}));
        let msg = Message::tool(&call, "ok");
        assert_eq!(msg.role, Role::Tool);
        assert_eq!(msg.tool_call_id.as_deref(), Some("call_1"));
        assert_eq!(msg.name.as_deref(), Some("customer_existence_verification"));
    }

    #[test]
    fn test_blank_detection() {
        assert!(Message::assistant("   ").is_blank());
        assert!(!Message::assistant("hi").is_blank());
        let with_call = Message::assistant_with_tools("", vec![ToolCall::new("x", serde_json::json!({}))]);
        assert!(!with_call.is_blank());
    }

    #[test]
    fn test_transfer_tool_lookup() {
        assert_eq!(AgentId::from_transfer_tool("ToLeadAssistant"), Some(AgentId::LeadAgent));
        assert_eq!(AgentId::from_transfer_tool("CompleteOrEscalate"), None);
        assert_eq!(AgentId::Primary.transfer_tool(), None);
    }

    #[test]
    fn test_message_ids_are_unique() {
        let a = Message::user("same");
        let b = Message::user("same");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_message_serde_skips_empty_calls() {
        let json = serde_json::to_value(Message::user("hello")).unwrap();
        assert!(json.get("tool_calls").is_none());
        assert_eq!(json["role"], "user");
    }
}
