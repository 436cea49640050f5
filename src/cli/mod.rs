//! CLI module - command-line interface
//!
//! Contains the REPL, the message printer and command parsing.

pub mod commands;
pub mod repl;

pub use repl::{MessagePrinter, Repl};
