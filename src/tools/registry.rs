//! Tool registry - typed catalogue of executable tools
//!
//! Every tool is stored together with its safety classification, decided
//! once at registration time. Routing and confirmation policy read the
//! classification from here instead of comparing tool names ad hoc.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::core::{LeadflowError, Result, ToolDefinition, ToolSafety};
use crate::tools::control;

/// What a tool hands back on success
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Text(String),
    Json(serde_json::Value),
}

impl ToolOutput {
    /// Render the output as the content of a tool message
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Json(value) => value.to_string(),
        }
    }
}

/// An executable tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Schema offered to the model
    fn definition(&self) -> ToolDefinition;

    /// Whether running this tool mutates persistent state
    fn safety(&self) -> ToolSafety;

    /// Run the tool. Errors are reported back to the agent, not raised
    /// further than the invoker.
    async fn invoke(&self, arguments: &serde_json::Value) -> Result<ToolOutput>;
}

/// A registered tool, tagged with its classification
#[derive(Clone)]
pub enum RegisteredTool {
    Safe(Arc<dyn Tool>),
    Sensitive(Arc<dyn Tool>),
}

impl RegisteredTool {
    fn new(tool: Arc<dyn Tool>) -> Self {
        match tool.safety() {
            ToolSafety::Safe => RegisteredTool::Safe(tool),
            ToolSafety::Sensitive => RegisteredTool::Sensitive(tool),
        }
    }

    pub fn safety(&self) -> ToolSafety {
        match self {
            RegisteredTool::Safe(_) => ToolSafety::Safe,
            RegisteredTool::Sensitive(_) => ToolSafety::Sensitive,
        }
    }

    pub fn tool(&self) -> &Arc<dyn Tool> {
        match self {
            RegisteredTool::Safe(tool) | RegisteredTool::Sensitive(tool) => tool,
        }
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.safety(), self.tool().definition().name())
    }
}

/// Registry of available tools
#[derive(Default, Debug)]
pub struct ToolRegistry {
    /// Tools indexed by name
    tools: HashMap<String, RegisteredTool>,
    /// Registration order, so definitions are offered deterministically
    order: Vec<String>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool. Names must be unique and must not shadow a control
    /// pseudo-tool.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let name = tool.definition().name().to_string();

        if name.trim().is_empty() {
            return Err(LeadflowError::registration("tool name must not be empty"));
        }
        if control::is_control_tool(&name) {
            return Err(LeadflowError::registration(format!(
                "'{}' is reserved for dialog control",
                name
            )));
        }
        if self.tools.contains_key(&name) {
            return Err(LeadflowError::registration(format!(
                "tool '{}' is already registered",
                name
            )));
        }

        let entry = RegisteredTool::new(tool);
        debug!(tool = %name, safety = %entry.safety(), "tool registered");
        self.order.push(name.clone());
        self.tools.insert(name, entry);
        Ok(())
    }

    /// Builder-style registration
    pub fn with(mut self, tool: Arc<dyn Tool>) -> Result<Self> {
        self.register(tool)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&RegisteredTool> {
        self.tools.get(name)
    }

    /// Safety classification of `name`, `None` when unknown
    pub fn classify(&self, name: &str) -> Option<ToolSafety> {
        self.tools.get(name).map(RegisteredTool::safety)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Names of every registered tool, in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Names with the given classification, in registration order
    pub fn names_by_safety(&self, safety: ToolSafety) -> Vec<String> {
        self.order
            .iter()
            .filter(|name| self.classify(name) == Some(safety))
            .cloned()
            .collect()
    }

    /// Definitions for the given names; unknown names are an error
    pub fn definitions_for(&self, names: &[String]) -> Result<Vec<ToolDefinition>> {
        names
            .iter()
            .map(|name| {
                self.tools
                    .get(name)
                    .map(|t| t.tool().definition())
                    .ok_or_else(|| {
                        LeadflowError::registration(format!("tool '{}' is not registered", name))
                    })
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}
