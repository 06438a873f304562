use indexmap::IndexMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Cumulative per-source failure counts, shared by every collection task for
/// the lifetime of the process.
#[derive(Debug, Default)]
pub struct ErrorTally {
    counts: Mutex<IndexMap<String, u64>>,
}

impl ErrorTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increments the count for `source`, starting at 1 on first failure.
    pub fn record_failure(&self, source: &str) {
        let mut counts = self.lock();
        match counts.get_mut(source) {
            Some(count) => *count = count.saturating_add(1),
            None => {
                counts.insert(source.to_string(), 1);
            }
        }
    }

    /// Copy of the current counts, in first-failure order.
    pub fn snapshot(&self) -> IndexMap<String, u64> {
        self.lock().clone()
    }

    pub fn count(&self, source: &str) -> u64 {
        self.lock().get(source).copied().unwrap_or_default()
    }

    // A panic while holding the lock cannot leave a half-written count behind.
    fn lock(&self) -> MutexGuard<'_, IndexMap<String, u64>> {
        self.counts.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
