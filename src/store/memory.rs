//! In-memory thread store

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::agent::state::{ConversationState, ThreadId};
use crate::core::Result;
use crate::store::ThreadStore;

/// Thread store that lives as long as the process
#[derive(Debug, Default)]
pub struct InMemoryThreadStore {
    threads: RwLock<HashMap<ThreadId, ConversationState>>,
}

impl InMemoryThreadStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ThreadStore for InMemoryThreadStore {
    async fn load(&self, thread_id: &str) -> Result<Option<ConversationState>> {
        Ok(self.threads.read().await.get(thread_id).cloned())
    }

    async fn save(&self, state: &ConversationState) -> Result<()> {
        self.threads
            .write()
            .await
            .insert(state.thread_id.clone(), state.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ThreadId>> {
        let mut ids: Vec<ThreadId> = self.threads.read().await.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
