//! Assistant assembly
//!
//! Builds the model client, lead directory, tool registry, thread store and
//! the two agent levels once at start-up, and wires them into a
//! [`TurnScheduler`].

use std::sync::Arc;

use tracing::{debug, info};

use crate::agent::node::AgentNode;
use crate::agent::profile::AgentProfile;
use crate::agent::scheduler::TurnScheduler;
use crate::agent::state::{ConversationState, ThreadId};
use crate::agent::turn::{Decision, TurnReport};
use crate::core::{Config, LeadflowError, Result};
use crate::crm::{InMemoryLeadDirectory, LeadDirectory};
use crate::llm::{LLMProvider, OllamaClient};
use crate::store::{self, ThreadRegistry, ThreadStore};
use crate::tools::lead::register_lead_tools;
use crate::tools::{ToolInvoker, ToolRegistry};

/// The multi-agent assistant
pub struct Assistant {
    config: Config,
    llm: Arc<dyn LLMProvider>,
    tools: Arc<ToolRegistry>,
    scheduler: TurnScheduler,
}

impl Assistant {
    /// Create an assistant talking to Ollama, with the store from `config`.
    ///
    /// The lead directory is in-memory and does not survive a restart even
    /// when threads are file-backed: a pending creation approved after a
    /// restart is checked for duplicates only against leads created since.
    /// Use [`Assistant::with_parts`] to plug in a durable [`LeadDirectory`].
    pub fn with_config(config: Config) -> Result<Self> {
        let llm: Arc<dyn LLMProvider> = Arc::new(OllamaClient::from_config(&config)?);
        let directory: Arc<dyn LeadDirectory> = Arc::new(InMemoryLeadDirectory::new());
        let store = store::from_config(&config)?;
        Self::with_parts(config, llm, directory, store)
    }

    /// Create an assistant from explicit collaborators
    pub fn with_parts(
        config: Config,
        llm: Arc<dyn LLMProvider>,
        directory: Arc<dyn LeadDirectory>,
        store: Arc<dyn ThreadStore>,
    ) -> Result<Self> {
        let mut registry = ToolRegistry::new();
        register_lead_tools(&mut registry, directory, config.crm.name_match_threshold)?;
        let tools = Arc::new(registry);

        let timezone = config.timezone()?;
        let retries = config.agent.max_empty_retries;
        let primary = AgentProfile::primary(&config, &tools)?;
        let lead = AgentProfile::lead(&config, &tools)?;

        let scheduler = TurnScheduler::new(
            Arc::new(ThreadRegistry::new(store)),
            ToolInvoker::new(tools.clone()),
        )
        .with_node(AgentNode::new(primary, llm.clone(), timezone, retries))
        .with_node(AgentNode::new(lead, llm.clone(), timezone, retries))
        .with_max_steps(config.agent.max_steps_per_turn)
        .with_ambiguity_policy(config.agent.ambiguity_policy);

        debug!(tools = ?tools.names(), "assistant assembled");
        Ok(Self {
            config,
            llm,
            tools,
            scheduler,
        })
    }

    /// Check that the provider is reachable and both models are present
    pub async fn initialize(&self) -> Result<()> {
        let models = self
            .llm
            .list_models()
            .await
            .map_err(|_| LeadflowError::OllamaNotReachable(self.config.ollama_url()))?;
        debug!(?models, "available models");

        for model in [&self.config.models.primary, &self.config.models.specialist] {
            if !self.llm.is_model_available(model).await? {
                return Err(LeadflowError::ModelNotFound(model.clone()));
            }
        }

        info!(
            provider = self.llm.name(),
            primary = %self.config.models.primary,
            specialist = %self.config.models.specialist,
            "assistant ready"
        );
        Ok(())
    }

    /// Run one user turn
    pub async fn process(&self, thread_id: &str, input: &str) -> Result<TurnReport> {
        self.scheduler.run_turn(thread_id, input).await
    }

    /// Approve or deny the pending sensitive action
    pub async fn resume(&self, thread_id: &str, decision: Decision) -> Result<TurnReport> {
        self.scheduler.resume(thread_id, decision).await
    }

    /// Current state of a thread
    pub async fn state(&self, thread_id: &str) -> Result<ConversationState> {
        self.scheduler.threads().get(thread_id).await
    }

    /// Every persisted thread
    pub async fn threads(&self) -> Result<Vec<ThreadId>> {
        self.scheduler.threads().threads().await
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// List available models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.llm.list_models().await
    }

    /// Save current configuration to file
    pub fn save_config(&self) -> Result<std::path::PathBuf> {
        self.config.save_and_get_path()
    }
}
