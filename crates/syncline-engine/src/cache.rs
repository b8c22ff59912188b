//! In-memory projection of the target system's state.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use syncline_core::{CorrelationKey, TargetId, TargetRecord};

/// Mutex-guarded map of correlation key to target-assigned identifier.
///
/// The cache is the differ's view of the target system. It is rebuilt
/// wholesale via [`replace`](Self::replace) and maintained incrementally by
/// the applier: [`record`](Self::record) after a confirmed creation,
/// [`forget`](Self::forget) after a confirmed deletion. Failed operations
/// never touch it, which is what makes the next cycle retry them.
///
/// Every operation is a single short map touch under the lock; nothing ever
/// awaits while holding it.
#[derive(Debug, Default)]
pub struct TargetStateCache {
    entries: Mutex<HashMap<CorrelationKey, TargetId>>,
}

impl TargetStateCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<CorrelationKey, TargetId>> {
        self.entries.lock().expect("state cache mutex poisoned")
    }

    /// Returns the cached state as a target snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<TargetRecord> {
        self.entries()
            .iter()
            .map(|(key, id)| TargetRecord::new(key.clone(), id.clone()))
            .collect()
    }

    /// Records a confirmed mirror creation.
    pub fn record(&self, key: CorrelationKey, target_id: TargetId) {
        self.entries().insert(key, target_id);
    }

    /// Drops a confirmed mirror deletion.
    pub fn forget(&self, key: &CorrelationKey) {
        self.entries().remove(key);
    }

    /// Replaces the whole cache with a fresh target listing.
    pub fn replace(&self, records: Vec<TargetRecord>) {
        let mut entries = self.entries();
        entries.clear();
        for record in records {
            entries.insert(record.key, record.target_id);
        }
    }

    /// Looks up the target identifier cached for a key.
    #[must_use]
    pub fn get(&self, key: &CorrelationKey) -> Option<TargetId> {
        self.entries().get(key).cloned()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Returns `true` when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }
}
