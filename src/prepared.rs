use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

/// In-memory map from opaque handle to stored SQL text, backing
/// `prepare_query`/`execute_prepared`.
///
/// Handles are monotonic per process and never expire; restart is the only
/// reclamation. Callers that prepare dynamically generated SQL in a loop will
/// grow this without bound.
#[derive(Debug, Default)]
pub struct PreparedRegistry {
    next_id: AtomicU64,
    entries: RwLock<HashMap<String, Arc<String>>>,
}

impl PreparedRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `sql` under a freshly allocated handle. Distinct ids are
    /// guaranteed even under concurrent callers.
    pub fn register(&self, sql: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let handle = format!("prepared:{id}");
        self.write().insert(handle.clone(), Arc::new(sql.to_string()));
        handle
    }

    /// Look up the SQL stored for `handle`.
    #[must_use]
    pub fn resolve(&self, handle: &str) -> Option<Arc<String>> {
        self.read().get(handle).cloned()
    }

    /// Number of registered handles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, Arc<String>>> {
        match self.entries.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, Arc<String>>> {
        match self.entries.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
