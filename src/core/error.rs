//! Custom error types for Leadflow
//!
//! Provides a unified error handling system across all modules.
//! Conversational and business failures never travel through this type:
//! they are turned into tool results the agent can read. Only failures
//! that make a turn impossible to continue end up here.

use thiserror::Error;

/// Main error type for Leadflow operations
#[derive(Error, Debug)]
pub enum LeadflowError {
    /// Language model transport or API errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Model not available
    #[error("Model '{0}' not available in Ollama. Run: ollama pull {0}")]
    ModelNotFound(String),

    /// Ollama server could not be reached during startup checks
    #[error("Cannot reach Ollama at {0}. Is it running?")]
    OllamaNotReachable(String),

    /// Tool execution errors
    #[error("Tool execution error: {0}")]
    ToolExecution(String),

    /// Tool registration errors (duplicate or reserved names)
    #[error("Tool registration error: {0}")]
    Registration(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Thread state could not be loaded or persisted
    #[error("State store error: {0}")]
    Store(String),

    /// A new turn was requested while a sensitive action awaits confirmation
    #[error("Thread '{thread_id}' is waiting for confirmation of a pending action")]
    TurnSuspended { thread_id: String },

    /// A confirmation was given but nothing is pending
    #[error("Thread '{thread_id}' has no pending action to confirm")]
    NoPendingAction { thread_id: String },

    /// The model requested a batch the router refuses to guess about
    #[error("Ambiguous tool batch, refusing to route: {}", tools.join(", "))]
    RoutingAmbiguous { tools: Vec<String> },

    /// An agent identifier has no configured node
    #[error("No agent configured for '{0}'")]
    UnknownAgent(String),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Generic error for other cases
    #[error("{0}")]
    Other(String),
}

/// Convenience Result type for Leadflow operations
pub type Result<T> = std::result::Result<T, LeadflowError>;

impl LeadflowError {
    /// Create an LLM error
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Create a tool execution error
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::ToolExecution(msg.into())
    }

    /// Create a registration error
    pub fn registration(msg: impl Into<String>) -> Self {
        Self::Registration(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a store error
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Wrap an error with additional context
    pub fn with_context<E>(context: impl Into<String>, error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::WithContext {
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Whether the session has to stop: the thread can no longer be persisted.
    /// Everything else only ends the current turn.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ambiguous_message_lists_tools() {
        let err = LeadflowError::RoutingAmbiguous {
            tools: vec!["customer_lead_creation".into(), "lookup".into()],
        };
        assert_eq!(
            err.to_string(),
            "Ambiguous tool batch, refusing to route: customer_lead_creation, lookup"
        );
    }

    #[test]
    fn test_fatal_classification() {
        assert!(LeadflowError::store("disk full").is_fatal());
        assert!(!LeadflowError::tool("bad phone").is_fatal());
        assert!(!LeadflowError::llm("connection reset").is_fatal());
    }
}
