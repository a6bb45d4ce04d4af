use serde::Serialize;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

/// Per-batch outcome reported by a worker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransferResult {
    pub success: u64,
    pub failed: u64,
}

/// Counters for one destination table. Only ever mutated through
/// [`ProgressTracker::report`]; reads are point-in-time copies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableProgress {
    pub completed_batches: u64,
    pub total_batches: u64,
    pub success: u64,
    pub failed: u64,
}

impl TableProgress {
    pub fn is_complete(&self) -> bool {
        self.completed_batches == self.total_batches
    }

    pub fn records_done(&self) -> u64 {
        self.success + self.failed
    }

    pub fn percent(&self) -> f64 {
        if self.total_batches == 0 {
            return 100.0;
        }
        self.completed_batches as f64 / self.total_batches as f64 * 100.0
    }
}

/// Shared accumulator of per-table transfer progress. Cloning is cheap and
/// every clone reports into the same counters.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    inner: Arc<Mutex<HashMap<String, TableProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        ProgressTracker::default()
    }

    /// Registers (or resets) a table with its planned batch count.
    pub fn begin_table(&self, table: &str, total_batches: u64) {
        let mut tables = self.lock();
        tables.insert(
            table.to_string(),
            TableProgress {
                total_batches,
                ..TableProgress::default()
            },
        );
    }

    /// Folds one batch result into the table's counters and returns the
    /// updated view, so callers can emit progress without a second lock.
    pub fn report(&self, table: &str, result: &TransferResult) -> TableProgress {
        let mut tables = self.lock();
        let progress = tables.entry(table.to_string()).or_default();
        debug_assert!(
            progress.completed_batches < progress.total_batches,
            "more batch reports than planned for '{table}'"
        );
        progress.completed_batches += 1;
        progress.success += result.success;
        progress.failed += result.failed;
        *progress
    }

    /// Consistent point-in-time view of one table.
    pub fn snapshot(&self, table: &str) -> Option<TableProgress> {
        self.lock().get(table).copied()
    }

    pub fn tables(&self) -> Vec<(String, TableProgress)> {
        let tables = self.lock();
        let mut entries: Vec<_> = tables.iter().map(|(k, v)| (k.clone(), *v)).collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, TableProgress>> {
        // Counter updates cannot leave the map inconsistent, so a poisoned
        // lock is still usable.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
