//! Store module - thread state persistence
//!
//! A [`ThreadStore`] keeps conversation state between turns. The
//! [`ThreadRegistry`] sits in front of it and guarantees at most one writer
//! per thread.

pub mod file;
pub mod memory;
pub mod registry;

use std::sync::Arc;

use async_trait::async_trait;

use crate::agent::state::{ConversationState, ThreadId};
use crate::core::{Config, Result, StoreBackend};

pub use file::FileThreadStore;
pub use memory::InMemoryThreadStore;
pub use registry::{ThreadLease, ThreadRegistry};

/// Persistence backend for conversation state
#[async_trait]
pub trait ThreadStore: Send + Sync {
    /// Load a thread, `None` if it was never saved
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>>;

    /// Persist the full state of a thread
    async fn save(&self, state: &ConversationState) -> Result<()>;

    /// Every known thread id
    async fn list(&self) -> Result<Vec<ThreadId>>;
}

/// Build the store selected in `config`
pub fn from_config(config: &Config) -> Result<Arc<dyn ThreadStore>> {
    Ok(match config.store.backend {
        StoreBackend::Memory => Arc::new(InMemoryThreadStore::new()),
        StoreBackend::File => Arc::new(FileThreadStore::new(&config.store.path)?),
    })
}
