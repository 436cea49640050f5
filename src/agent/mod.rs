//! Agent module - dialog routing and hand-off
//!
//! Contains the conversation state and dialog stack, the agent nodes, the
//! routers, the delegation controller and the turn scheduler that ties
//! them together.

pub mod delegation;
pub mod node;
pub mod orchestrator;
pub mod profile;
pub mod prompts;
pub mod router;
pub mod scheduler;
pub mod state;
pub mod turn;

pub use node::AgentNode;
pub use orchestrator::Assistant;
pub use profile::{AgentProfile, AgentProfileBuilder, ToolKind};
pub use router::{Route, Router};
pub use scheduler::TurnScheduler;
pub use state::{ConversationState, DialogStack, PendingAction, StackOp, StateUpdate, ThreadId};
pub use turn::{Decision, TurnOutcome, TurnPhase, TurnReport};
