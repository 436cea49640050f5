//! Tools module - Tool implementations for the agents
//!
//! Contains the typed registry, the invoker, the dialog control
//! pseudo-tools and the lead tools.

pub mod control;
pub mod invoker;
pub mod lead;
pub mod registry;
pub mod validation;

pub use invoker::ToolInvoker;
pub use registry::{RegisteredTool, Tool, ToolOutput, ToolRegistry};
