use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;

use super::rules::RuleTable;
use crate::error::Error;

/// One candidate file and where it would go. Built before anything moves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub file_name: String,
    pub label: Option<String>,
    pub destination: Option<PathBuf>,
    pub destination_exists: bool,
}

impl PlanEntry {
    pub fn is_classified(&self) -> bool {
        self.destination.is_some()
    }

    pub fn destination_dir(&self) -> Option<&Path> {
        self.destination.as_deref().and_then(Path::parent)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PlanSummary {
    pub classified: usize,
    pub unclassified: usize,
    pub existing: usize,
    pub destination_dirs: BTreeSet<PathBuf>,
}

impl PlanSummary {
    pub fn from_entries(plan: &[PlanEntry]) -> Self {
        let mut summary = PlanSummary::default();
        for entry in plan {
            match entry.destination_dir() {
                Some(dir) => {
                    summary.classified += 1;
                    summary.destination_dirs.insert(dir.to_path_buf());
                    if entry.destination_exists {
                        summary.existing += 1;
                    }
                }
                None => summary.unclassified += 1,
            }
        }
        summary
    }
}

/// `<label>_<YYYYMMDD>`
pub fn destination_folder_name(label: &str, today: NaiveDate) -> String {
    format!("{}_{}", label, today.format("%Y%m%d"))
}

/// List the `.csv` files directly inside `directory` and classify each one.
/// Reads the filesystem only; nothing is created or moved.
///
/// `file_name` on each entry is for display and matching. The destination
/// keeps the original name byte for byte.
pub fn build_plan(
    directory: &Path,
    rules: &RuleTable,
    today: NaiveDate,
) -> Result<Vec<PlanEntry>, Error> {
    let mut plan = Vec::new();

    for entry in WalkDir::new(directory).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| {
            Error::Other(format!(
                "Error reading directory {}: {}",
                directory.display(),
                err
            ))
        })?;

        // Follows symlinks, unlike `entry.file_type()`.
        if !entry.path().is_file() {
            continue;
        }

        let file_name = entry.file_name().to_string_lossy().into_owned();
        if !file_name.to_lowercase().ends_with(".csv") {
            continue;
        }

        let label = rules.classify(&file_name).map(str::to_string);
        let destination = label.as_deref().map(|label| {
            directory
                .join(destination_folder_name(label, today))
                .join(entry.file_name())
        });
        let destination_exists = destination.as_deref().is_some_and(Path::exists);

        debug!("{} -> {:?}", file_name, destination);

        plan.push(PlanEntry {
            source: entry.into_path(),
            file_name,
            label,
            destination,
            destination_exists,
        });
    }

    plan.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(plan)
}
