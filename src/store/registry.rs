//! Thread registry
//!
//! Hands out leases on conversation threads. A lease holds the thread's
//! lock for as long as it lives, so turns on the same thread run strictly
//! one after another while other threads proceed independently. Every
//! change made through a lease is persisted before it is acknowledged.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;

use crate::agent::state::{ConversationState, PendingAction, StateUpdate, ThreadId};
use crate::core::{LeadflowError, Result};
use crate::store::ThreadStore;

/// Per-thread serialisation in front of a [`ThreadStore`]
pub struct ThreadRegistry {
    store: Arc<dyn ThreadStore>,
    locks: Mutex<HashMap<ThreadId, Arc<AsyncMutex<()>>>>,
}

impl ThreadRegistry {
    pub fn new(store: Arc<dyn ThreadStore>) -> Self {
        Self {
            store,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self) -> &Arc<dyn ThreadStore> {
        &self.store
    }

    fn lock_for(&self, thread_id: &str) -> Result<Arc<AsyncMutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| LeadflowError::store("thread lock table poisoned"))?;
        // A lock only the table refers to has no holder and no waiter
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        Ok(locks
            .entry(thread_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone())
    }

    #[cfg(test)]
    fn tracked_locks(&self) -> usize {
        self.locks.lock().map(|locks| locks.len()).unwrap_or(0)
    }

    /// Take exclusive ownership of a thread, creating it on first use
    pub async fn lease(&self, thread_id: &str) -> Result<ThreadLease> {
        let guard = self.lock_for(thread_id)?.lock_owned().await;

        let state = match self.store.load(thread_id).await? {
            Some(state) => state,
            None => {
                debug!(thread = %thread_id, "new thread");
                ConversationState::new(thread_id)
            }
        };

        Ok(ThreadLease {
            _guard: guard,
            state,
            store: self.store.clone(),
        })
    }

    /// Snapshot of a thread
    pub async fn get(&self, thread_id: &str) -> Result<ConversationState> {
        Ok(self.lease(thread_id).await?.into_state())
    }

    /// Apply one update to a thread and return the new state
    pub async fn apply(&self, thread_id: &str, update: StateUpdate) -> Result<ConversationState> {
        let mut lease = self.lease(thread_id).await?;
        lease.apply(update).await?;
        Ok(lease.into_state())
    }

    /// Every known thread id
    pub async fn threads(&self) -> Result<Vec<ThreadId>> {
        self.store.list().await
    }
}

/// Exclusive, persisting handle on one thread
pub struct ThreadLease {
    _guard: OwnedMutexGuard<()>,
    state: ConversationState,
    store: Arc<dyn ThreadStore>,
}

impl ThreadLease {
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    pub fn into_state(self) -> ConversationState {
        self.state
    }

    /// Append messages, apply the stack op, persist
    pub async fn apply(&mut self, update: StateUpdate) -> Result<()> {
        self.state.apply(update);
        self.store.save(&self.state).await
    }

    /// Record the sensitive batch awaiting confirmation, persist
    pub async fn suspend(&mut self, pending: PendingAction) -> Result<()> {
        self.state.pending = Some(pending);
        self.state.updated_at = Utc::now();
        self.store.save(&self.state).await
    }

    /// Clear the pending action and apply the operator's outcome in one write
    pub async fn resolve(&mut self, update: StateUpdate) -> Result<()> {
        self.state.pending = None;
        self.apply(update).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::state::StackOp;
    use crate::core::{AgentId, Message};
    use crate::store::InMemoryThreadStore;
    use std::time::Duration;

    fn registry() -> Arc<ThreadRegistry> {
        Arc::new(ThreadRegistry::new(Arc::new(InMemoryThreadStore::new())))
    }

    #[tokio::test]
    async fn test_idle_thread_locks_are_released() {
        let registry = registry();
        drop(registry.lease("a").await.unwrap());

        let b = registry.lease("b").await.unwrap();
        let c = registry.lease("c").await.unwrap();
        assert_eq!(registry.tracked_locks(), 2);

        drop(b);
        drop(c);
        let _d = registry.lease("d").await.unwrap();
        assert_eq!(registry.tracked_locks(), 1);
    }

    #[tokio::test]
    async fn test_get_creates_empty_thread() {
        let state = registry().get("1").await.unwrap();
        assert!(state.messages.is_empty());
        assert_eq!(state.active_agent(), AgentId::Primary);
    }

    #[tokio::test]
    async fn test_apply_persists() {
        let registry = registry();
        registry
            .apply(
                "1",
                StateUpdate::message(Message::user("hi")).with_stack(StackOp::Push(AgentId::LeadAgent)),
            )
            .await
            .unwrap();

        let stored = registry.store().load("1").await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 1);
        assert_eq!(stored.active_agent(), AgentId::LeadAgent);
    }

    #[tokio::test]
    async fn test_leases_serialise_writers() {
        let registry = registry();
        let held = registry.lease("1").await.unwrap();

        let contender = {
            let registry = registry.clone();
            tokio::spawn(async move {
                registry.apply("1", StateUpdate::message(Message::user("second"))).await
            })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!contender.is_finished());

        let mut held = held;
        held.apply(StateUpdate::message(Message::user("first"))).await.unwrap();
        drop(held);

        let state = contender.await.unwrap().unwrap();
        let contents: Vec<&str> = state.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
    }

    #[tokio::test]
    async fn test_other_threads_are_not_blocked() {
        let registry = registry();
        let _held = registry.lease("1").await.unwrap();
        let other = tokio::time::timeout(Duration::from_millis(200), registry.get("2")).await;
        assert!(other.is_ok());
    }
}
