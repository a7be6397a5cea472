use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use crate::models::LibraryId;

/// Per-library advisory locks for dependency rewrites.
///
/// Two writers rebuilding the same library's edges must not interleave;
/// writers touching different libraries stay independent. Clones share
/// the same lock table, so every registry handle over one database
/// should hold clones of a single `DependencyLocks`.
#[derive(Clone, Default)]
pub struct DependencyLocks {
    locks: Arc<Mutex<HashMap<i64, Arc<Mutex<()>>>>>,
}

impl DependencyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the lock for `library_id`.
    ///
    /// The lock is held for the whole closure and released on return or
    /// panic. A poisoned lock is recovered: the guarded section touches
    /// no shared state of its own, so a previous holder's panic leaves
    /// nothing inconsistent behind.
    pub fn with_library<T>(&self, library_id: LibraryId, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut table = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            table
                .entry(library_id.get())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };

        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
