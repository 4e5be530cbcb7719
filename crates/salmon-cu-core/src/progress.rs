use crate::sort::{MoveOutcome, PlanEntry};

/// Trait for reporting extraction and sorting progress.
///
/// The CLI implements it with indicatif bars; tests use [`SilentReporter`].
/// All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    fn on_load_table(&self, _table: &str, _rows: usize) {}
    fn on_extract_start(&self, _total_queries: usize) {}
    fn on_query_complete(&self, _name: &str, _rows: usize) {}
    fn on_extract_complete(&self, _files_written: usize, _duration_secs: f64) {}
    fn on_sort_start(&self, _total_entries: usize) {}
    fn on_entry_complete(&self, _entry: &PlanEntry, _outcome: &MoveOutcome) {}
    fn on_sort_complete(&self, _moved: usize, _skipped: usize, _failed: usize) {}
}

/// No-op progress reporter for silent operation.
pub struct SilentReporter;

impl ProgressReporter for SilentReporter {}
