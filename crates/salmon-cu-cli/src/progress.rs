use indicatif::{ProgressBar, ProgressStyle};
use salmon_cu_core::sort::{MoveOutcome, PlanEntry};
use salmon_cu_core::ProgressReporter;
use std::sync::Mutex;
use std::time::Duration;

const TICKS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏";

/// CLI progress reporter using indicatif progress bars.
///
/// - Extract phase: bar over the selected queries
/// - Sort phase: bar over the plan entries
pub struct CliReporter {
    bar: Mutex<Option<ProgressBar>>,
}

impl CliReporter {
    pub fn new() -> Self {
        Self {
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, total: usize, label: &str) {
        let pb = ProgressBar::new(total as u64);
        let template = format!(
            "  {{spinner:.cyan}} {} [{{bar:30.cyan/dim}}] {{pos}}/{{len}} {{msg}}",
            label
        );
        let style = ProgressStyle::with_template(&template)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("━╸─")
            .tick_chars(TICKS);
        pb.set_style(style);
        pb.enable_steady_tick(Duration::from_millis(80));

        if let Ok(mut guard) = self.bar.lock() {
            if let Some(old) = guard.take() {
                old.finish_and_clear();
            }
            *guard = Some(pb);
        }
    }

    fn advance(&self, message: String) {
        if let Ok(guard) = self.bar.lock() {
            if let Some(pb) = guard.as_ref() {
                pb.inc(1);
                pb.set_message(message);
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some(pb) = guard.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for CliReporter {
    fn on_load_table(&self, table: &str, rows: usize) {
        eprintln!("  \x1b[32m✓\x1b[0m Loaded {}: {} rows", table, rows);
    }

    fn on_extract_start(&self, total_queries: usize) {
        self.start_bar(total_queries, "Extracting");
    }

    fn on_query_complete(&self, name: &str, rows: usize) {
        self.advance(format!("{} ({} rows)", name, rows));
    }

    fn on_extract_complete(&self, files_written: usize, duration_secs: f64) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Extraction complete: {} files in {:.2}s",
            files_written, duration_secs
        );
    }

    fn on_sort_start(&self, total_entries: usize) {
        self.start_bar(total_entries, "Sorting");
    }

    fn on_entry_complete(&self, entry: &PlanEntry, outcome: &MoveOutcome) {
        self.advance(format!("{}: {}", entry.file_name, outcome));
    }

    fn on_sort_complete(&self, moved: usize, skipped: usize, failed: usize) {
        self.finish_bar();
        eprintln!(
            "  \x1b[32m✓\x1b[0m Sort complete: {} moved, {} skipped, {} failed",
            moved, skipped, failed
        );
    }
}
