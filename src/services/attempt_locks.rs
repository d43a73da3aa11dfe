use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-attempt critical sections. Every state transition for a given
/// (assignment, user) pair runs under the same key, so concurrent requests
/// for one attempt serialize while unrelated attempts proceed in parallel.
pub struct AttemptLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AttemptLocks {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut map = self.inner.lock().await;
            if map.len() > 1024 {
                // drop entries nobody is holding or waiting on
                map.retain(|_, lock| Arc::strong_count(lock) > 1);
            }
            Arc::clone(
                map.entry(key.to_string())
                    .or_insert_with(|| Arc::new(Mutex::new(()))),
            )
        };
        entry.lock_owned().await
    }
}

impl Default for AttemptLocks {
    fn default() -> Self {
        Self::new()
    }
}
