//! LLM module - Language Model integrations
//!
//! Provides the provider abstraction, the Ollama backend, and a scripted
//! provider for deterministic dialog tests.

pub mod ollama;
pub mod scripted;
pub mod traits;

pub use ollama::OllamaClient;
pub use scripted::{RecordedRequest, ScriptedProvider};
pub use traits::{GenerateOptions, LLMProvider, LLMResponse, TokenUsage};
