//! Leadflow - Multi-agent lead assistant
//!
//! A conversational assistant for automotive sales in which a host agent
//! hands lead work to a specialist, tracks who is driving the conversation
//! on a dialog stack, and holds every state-changing action until a human
//! approves it.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Provider abstraction with Ollama and scripted implementations
//! - **Tools**: Typed tool registry, invoker, control pseudo-tools, lead tools
//! - **CRM**: Customer/lead directory contract and in-memory directory
//! - **Agent**: Dialog state, routers, delegation and the turn scheduler
//! - **Store**: Thread persistence and per-thread leases
//! - **CLI**: Operator REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use leadflow::{Assistant, Config, Decision, TurnOutcome};
//!
//! #[tokio::main]
//! async fn main() -> leadflow::Result<()> {
//!     let assistant = Assistant::with_config(Config::load())?;
//!     assistant.initialize().await?;
//!
//!     let report = assistant.process("1", "Create a lead for John Doe").await?;
//!     if let TurnOutcome::AwaitingConfirmation { .. } = report.outcome {
//!         assistant.resume("1", Decision::Approve).await?;
//!     }
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod crm;
pub mod llm;
pub mod store;
pub mod tools;

// Re-export commonly used items
pub use agent::{Assistant, Decision, TurnOutcome, TurnReport, TurnScheduler};
pub use cli::Repl;
pub use core::{AgentId, Config, LeadflowError, Result, StoreBackend};
