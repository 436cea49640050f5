//! Agent profiles
//!
//! A profile is the fixed configuration of one agent level: model,
//! instructions and toolbelt. The toolbelt is resolved against the tool
//! registry once, when the profile is built, so routing never has to guess
//! what a tool name means.

use std::collections::HashMap;

use crate::agent::prompts;
use crate::core::{AgentId, Config, LeadflowError, Result, ToolDefinition, ToolSafety};
use crate::tools::control::{self, COMPLETE_OR_ESCALATE};
use crate::tools::ToolRegistry;

/// What a tool name means to a particular agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    Safe,
    Sensitive,
    /// Hand the dialog to a specialist
    Transfer(AgentId),
    /// Hand the dialog back
    Escalation,
    /// Not on this agent's toolbelt
    Unknown,
}

impl From<ToolSafety> for ToolKind {
    fn from(safety: ToolSafety) -> Self {
        match safety {
            ToolSafety::Safe => ToolKind::Safe,
            ToolSafety::Sensitive => ToolKind::Sensitive,
        }
    }
}

/// Fixed configuration of one agent
#[derive(Debug, Clone)]
pub struct AgentProfile {
    agent: AgentId,
    model: String,
    temperature: Option<f32>,
    instructions: String,
    toolbelt: HashMap<String, ToolKind>,
    definitions: Vec<ToolDefinition>,
}

impl AgentProfile {
    /// Create a builder for `agent`
    pub fn builder(agent: AgentId) -> AgentProfileBuilder {
        AgentProfileBuilder::new(agent)
    }

    /// Host assistant: no tools of its own, can transfer to every specialist
    pub fn primary(config: &Config, registry: &ToolRegistry) -> Result<Self> {
        AgentProfile::builder(AgentId::Primary)
            .model(&config.models.primary)
            .temperature(config.models.primary_temperature)
            .transfers(AgentId::SPECIALISTS.to_vec())
            .build(registry)
    }

    /// Lead specialist: every registered lead tool plus the escalation signal
    pub fn lead(config: &Config, registry: &ToolRegistry) -> Result<Self> {
        AgentProfile::builder(AgentId::LeadAgent)
            .model(&config.models.specialist)
            .temperature(config.models.specialist_temperature)
            .tools(registry.names().to_vec())
            .escalation(true)
            .build(registry)
    }

    pub fn agent(&self) -> AgentId {
        self.agent
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> Option<f32> {
        self.temperature
    }

    pub fn instructions(&self) -> &str {
        &self.instructions
    }

    /// Every tool schema offered to the model, control tools included
    pub fn definitions(&self) -> &[ToolDefinition] {
        &self.definitions
    }

    /// Meaning of `name` for this agent
    pub fn classify(&self, name: &str) -> ToolKind {
        self.toolbelt.get(name).copied().unwrap_or(ToolKind::Unknown)
    }

    /// Whether this agent may hand the dialog back
    pub fn can_escalate(&self) -> bool {
        self.toolbelt.contains_key(COMPLETE_OR_ESCALATE)
    }
}

/// Builder for [`AgentProfile`]
pub struct AgentProfileBuilder {
    agent: AgentId,
    model: Option<String>,
    temperature: Option<f32>,
    instructions: Option<String>,
    tools: Vec<String>,
    transfers: Vec<AgentId>,
    escalation: bool,
}

impl AgentProfileBuilder {
    pub fn new(agent: AgentId) -> Self {
        Self {
            agent,
            model: None,
            temperature: None,
            instructions: None,
            tools: Vec::new(),
            transfers: Vec::new(),
            escalation: false,
        }
    }

    /// Set the model to use
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Override the default instructions for this agent
    pub fn instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Registered tools this agent may call
    pub fn tools(mut self, tools: Vec<String>) -> Self {
        self.tools = tools;
        self
    }

    /// Specialists this agent may hand the dialog to
    pub fn transfers(mut self, targets: Vec<AgentId>) -> Self {
        self.transfers = targets;
        self
    }

    /// Offer the escalation signal
    pub fn escalation(mut self, enabled: bool) -> Self {
        self.escalation = enabled;
        self
    }

    /// Resolve the toolbelt against `registry`
    pub fn build(self, registry: &ToolRegistry) -> Result<AgentProfile> {
        let mut toolbelt = HashMap::new();
        let mut definitions = registry.definitions_for(&self.tools)?;

        for name in &self.tools {
            let safety = registry.classify(name).ok_or_else(|| {
                LeadflowError::registration(format!("tool '{}' is not registered", name))
            })?;
            toolbelt.insert(name.clone(), ToolKind::from(safety));
        }

        for target in self.transfers {
            let definition = control::transfer_definition(target).ok_or_else(|| {
                LeadflowError::registration(format!("'{}' cannot be a transfer target", target))
            })?;
            toolbelt.insert(definition.name().to_string(), ToolKind::Transfer(target));
            definitions.push(definition);
        }

        if self.escalation {
            toolbelt.insert(COMPLETE_OR_ESCALATE.to_string(), ToolKind::Escalation);
            definitions.push(control::escalation_definition());
        }

        let model = self
            .model
            .ok_or_else(|| LeadflowError::config(format!("no model configured for '{}'", self.agent)))?;

        Ok(AgentProfile {
            agent: self.agent,
            model,
            temperature: self.temperature,
            instructions: self
                .instructions
                .unwrap_or_else(|| prompts::instructions_for(self.agent).to_string()),
            toolbelt,
            definitions,
        })
    }
}
