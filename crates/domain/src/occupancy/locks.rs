use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use common::CageId;
use tokio::sync::OwnedMutexGuard;

type Registry = Arc<Mutex<HashMap<CageId, Arc<tokio::sync::Mutex<()>>>>>;

/// Keyed async mutex, one lock per cage.
///
/// Clones share the same registry, so every service that mutates a cage must
/// be built from the same `CageLocks`. Entries are dropped once the last
/// holder or waiter releases them.
#[derive(Clone, Default)]
pub struct CageLocks {
    registry: Registry,
}

impl CageLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `cage_id`.
    pub async fn lock(&self, cage_id: CageId) -> CageGuard {
        let mutex = {
            let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.entry(cage_id).or_default().clone()
        };
        let guard = mutex.lock_owned().await;

        CageGuard {
            cage_id,
            guard: Some(guard),
            registry: self.registry.clone(),
        }
    }

    /// Number of cages with a live lock entry.
    pub fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for CageLocks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CageLocks")
            .field("entries", &self.len())
            .finish()
    }
}

/// Exclusive access to one cage. Released on drop.
pub struct CageGuard {
    cage_id: CageId,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
}

impl CageGuard {
    pub fn cage_id(&self) -> CageId {
        self.cage_id
    }
}

impl Drop for CageGuard {
    fn drop(&mut self) {
        // Release before pruning so the count below only sees the registry's
        // own reference and any waiters.
        drop(self.guard.take());

        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        let idle = registry
            .get(&self.cage_id)
            .is_some_and(|mutex| Arc::strong_count(mutex) == 1);
        if idle {
            registry.remove(&self.cage_id);
        }
    }
}
