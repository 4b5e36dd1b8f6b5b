//! Per-conversation turn serialization.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

type Locks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Ensures at most one turn is in flight per conversation.
///
/// Turns for different conversations never wait on each other. A
/// conversation's lock is dropped from the map once no turn holds or awaits it.
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone, Default)]
pub struct TurnGate {
    locks: Locks,
}

/// Held for the duration of one turn.
pub struct TurnGuard {
    guard: Option<OwnedMutexGuard<()>>,
    conversation_id: String,
    locks: Locks,
}

impl TurnGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until no other turn holds `conversation_id`, then holds it until the guard drops.
    pub async fn acquire(&self, conversation_id: &str) -> TurnGuard {
        let lock = self.locks.entry(conversation_id.to_string()).or_default().clone();
        let guard = lock.lock_owned().await;

        TurnGuard {
            guard: Some(guard),
            conversation_id: conversation_id.to_string(),
            locks: self.locks.clone(),
        }
    }
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        // Release first so the guard's own reference is not counted.
        self.guard.take();

        // Waiters hold a clone, so only the map's reference remains when nobody is queued.
        self.locks.remove_if(&self.conversation_id, |_, lock| Arc::strong_count(lock) == 1);
    }
}
