//! Registry of running cancellable effects.
//!
//! Each [`EffectId`] maps to at most one running task. The store cancels the
//! previous holder of an id before launching a new effect under it, so a
//! long-running effect such as a live query can be swapped without ever having
//! two copies alive.

use brewstand_core::effect::EffectId;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::task::AbortHandle;

struct Registration {
    token: u64,
    abort: AbortHandle,
}

/// Shared map from effect id to the abort handle of its running task.
#[derive(Clone, Default)]
pub struct CancellationRegistry {
    entries: Arc<Mutex<HashMap<EffectId, Registration>>>,
    next_token: Arc<AtomicU64>,
}

impl CancellationRegistry {
    /// Create an empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned map is still structurally valid: every write is a single insert/remove.
    fn entries(&self) -> MutexGuard<'_, HashMap<EffectId, Registration>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve a token identifying the next registration
    pub(crate) fn next_token(&self) -> u64 {
        self.next_token.fetch_add(1, Ordering::Relaxed)
    }

    /// Record `abort` as the running task for `id`.
    ///
    /// Any task still registered under `id` is aborted.
    pub(crate) fn insert(&self, id: EffectId, token: u64, abort: AbortHandle) {
        if let Some(previous) = self.entries().insert(id, Registration { token, abort }) {
            previous.abort.abort();
        }
    }

    /// Drop the registration for `id` if it still belongs to `token`.
    ///
    /// Called by a task when it finishes on its own.
    pub(crate) fn finish(&self, id: EffectId, token: u64) {
        let mut entries = self.entries();
        if entries.get(&id).is_some_and(|entry| entry.token == token) {
            entries.remove(&id);
        }
    }

    /// Abort the task registered under `id`.
    ///
    /// Returns `true` if a task was registered.
    pub fn cancel(&self, id: EffectId) -> bool {
        let removed = self.entries().remove(&id);
        match removed {
            Some(entry) => {
                entry.abort.abort();
                true
            },
            None => false,
        }
    }

    /// Abort every registered task and return how many there were.
    pub fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self.entries().drain().collect();
        for (_, entry) in &drained {
            entry.abort.abort();
        }
        drained.len()
    }

    /// Whether a task registered under `id` is still running
    #[must_use]
    pub fn is_active(&self, id: EffectId) -> bool {
        self.entries()
            .get(&id)
            .is_some_and(|entry| !entry.abort.is_finished())
    }

    /// Number of registered tasks that are still running
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.entries()
            .values()
            .filter(|entry| !entry.abort.is_finished())
            .count()
    }
}

impl std::fmt::Debug for CancellationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<EffectId> = self.entries().keys().copied().collect();
        f.debug_struct("CancellationRegistry")
            .field("ids", &ids)
            .finish_non_exhaustive()
    }
}
