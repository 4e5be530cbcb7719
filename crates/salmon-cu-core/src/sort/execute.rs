use std::collections::{BTreeMap, BTreeSet};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use super::plan::PlanEntry;
use crate::progress::ProgressReporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    NoRuleMatch,
    DestinationExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveMethod {
    Rename,
    CopyThenDelete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Skipped(SkipReason),
    Moved(MoveMethod),
    Failed(String),
}

impl MoveOutcome {
    pub fn is_moved(&self) -> bool {
        matches!(self, MoveOutcome::Moved(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, MoveOutcome::Skipped(_))
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, MoveOutcome::Failed(_))
    }
}

impl fmt::Display for MoveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveOutcome::Skipped(SkipReason::NoRuleMatch) => write!(f, "skipped (no rule match)"),
            MoveOutcome::Skipped(SkipReason::DestinationExists) => write!(f, "skipped (exists)"),
            MoveOutcome::Moved(MoveMethod::Rename) => write!(f, "moved"),
            MoveOutcome::Moved(MoveMethod::CopyThenDelete) => write!(f, "moved (copy + delete)"),
            MoveOutcome::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    pub entry: PlanEntry,
    pub outcome: MoveOutcome,
}

/// Carry out a plan built by [`super::build_plan`].
///
/// Each destination folder is created once before the first move into it.
/// A file that fails does not stop the rest of the batch, and a failed file
/// is always left at its source path.
pub fn execute_plan(
    plan: &[PlanEntry],
    overwrite: bool,
    reporter: &dyn ProgressReporter,
) -> Vec<MoveRecord> {
    reporter.on_sort_start(plan.len());

    let dirs: BTreeSet<&Path> = plan.iter().filter_map(PlanEntry::destination_dir).collect();
    let mut dir_errors: BTreeMap<PathBuf, String> = BTreeMap::new();
    for dir in dirs {
        if dir.is_dir() {
            continue;
        }
        match fs::create_dir_all(dir) {
            Ok(()) => debug!("Created {}", dir.display()),
            Err(err) => {
                error!("Error creating directory {}: {}", dir.display(), err);
                dir_errors.insert(dir.to_path_buf(), err.to_string());
            }
        }
    }

    let mut records = Vec::with_capacity(plan.len());
    for entry in plan {
        let outcome = match (&entry.destination, entry.destination_dir()) {
            (Some(destination), Some(dir)) => match dir_errors.get(dir) {
                Some(err) => MoveOutcome::Failed(format!(
                    "cannot create {}: {}",
                    dir.display(),
                    err
                )),
                None => move_entry(&entry.source, destination, overwrite),
            },
            _ => MoveOutcome::Skipped(SkipReason::NoRuleMatch),
        };

        match &outcome {
            MoveOutcome::Failed(reason) => {
                error!("Failed to move '{}': {}", entry.source.display(), reason)
            }
            MoveOutcome::Skipped(SkipReason::NoRuleMatch) => {
                warn!("No rule matches '{}', leaving it in place", entry.file_name)
            }
            other => debug!("{}: {}", entry.file_name, other),
        }

        reporter.on_entry_complete(entry, &outcome);
        records.push(MoveRecord {
            entry: entry.clone(),
            outcome,
        });
    }

    let moved = records.iter().filter(|r| r.outcome.is_moved()).count();
    let skipped = records.iter().filter(|r| r.outcome.is_skipped()).count();
    let failed = records.iter().filter(|r| r.outcome.is_failed()).count();
    info!(
        "Sort executed: {} moved, {} skipped, {} failed",
        moved, skipped, failed
    );
    reporter.on_sort_complete(moved, skipped, failed);

    records
}

fn move_entry(source: &Path, destination: &Path, overwrite: bool) -> MoveOutcome {
    // Checked again here since the plan may be stale.
    if destination.exists() && !overwrite {
        return MoveOutcome::Skipped(SkipReason::DestinationExists);
    }

    if !source.is_file() {
        return MoveOutcome::Failed("source file no longer exists".to_string());
    }

    match fs::rename(source, destination) {
        Ok(()) => return MoveOutcome::Moved(MoveMethod::Rename),
        Err(err) => debug!(
            "Rename {} failed ({}), falling back to copy",
            source.display(),
            err
        ),
    }

    copy_then_delete(
        source,
        destination,
        |from, to| fs::copy(from, to),
        |path| fs::remove_file(path),
    )
}

/// The copy lands in a hidden sibling first and is renamed into place only
/// once complete, so `destination` never holds a partial file.
fn copy_then_delete<C, R>(source: &Path, destination: &Path, copy: C, remove: R) -> MoveOutcome
where
    C: Fn(&Path, &Path) -> io::Result<u64>,
    R: Fn(&Path) -> io::Result<()>,
{
    let partial = partial_path(destination);
    if let Err(err) = copy(source, &partial).and_then(|_| fs::rename(&partial, destination)) {
        discard(&partial);
        return MoveOutcome::Failed(format!("copy failed: {}", err));
    }

    match remove(source) {
        Ok(()) => MoveOutcome::Moved(MoveMethod::CopyThenDelete),
        Err(err) => {
            // Leave exactly one copy behind: the source.
            discard(destination);
            MoveOutcome::Failed(format!("could not remove source after copy: {}", err))
        }
    }
}

/// `<dir>/.<name>.partial`
fn partial_path(destination: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(destination.file_name().unwrap_or_default());
    name.push(".partial");
    destination.with_file_name(name)
}

fn discard(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!("Could not remove {}: {}", path.display(), err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::SilentReporter;
    use crate::sort::plan::build_plan;
    use crate::sort::rules::RuleTable;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 5).unwrap()
    }

    #[test]
    fn test_moves_classified_and_leaves_unmatched() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("CK_CU_SITES_En.csv"), "x\n").unwrap();
        fs::write(dir.path().join("random_report.csv"), "y\n").unwrap();

        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        let records = execute_plan(&plan, false, &SilentReporter);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, MoveOutcome::Moved(MoveMethod::Rename));
        assert_eq!(
            records[1].outcome,
            MoveOutcome::Skipped(SkipReason::NoRuleMatch)
        );

        let moved = dir
            .path()
            .join("Chinook_Salmon_CU_20260205")
            .join("CK_CU_SITES_En.csv");
        assert_eq!(fs::read_to_string(moved).unwrap(), "x\n");
        assert!(!dir.path().join("CK_CU_SITES_En.csv").exists());
        assert!(dir.path().join("random_report.csv").exists());
    }

    #[test]
    fn test_existing_destination_is_skipped_without_overwrite() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("CO_CU_STATUS_En.csv"), "new\n").unwrap();
        let target_dir = dir.path().join("Coho_Salmon_CU_20260205");
        fs::create_dir(&target_dir).unwrap();
        fs::write(target_dir.join("CO_CU_STATUS_En.csv"), "old\n").unwrap();

        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        let records = execute_plan(&plan, false, &SilentReporter);

        assert_eq!(
            records[0].outcome,
            MoveOutcome::Skipped(SkipReason::DestinationExists)
        );
        assert!(dir.path().join("CO_CU_STATUS_En.csv").exists());
        assert_eq!(
            fs::read_to_string(target_dir.join("CO_CU_STATUS_En.csv")).unwrap(),
            "old\n"
        );
    }

    #[test]
    fn test_overwrite_replaces_existing_destination() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("CO_CU_STATUS_En.csv"), "new\n").unwrap();
        let target_dir = dir.path().join("Coho_Salmon_CU_20260205");
        fs::create_dir(&target_dir).unwrap();
        fs::write(target_dir.join("CO_CU_STATUS_En.csv"), "old\n").unwrap();

        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        let records = execute_plan(&plan, true, &SilentReporter);

        assert!(records[0].outcome.is_moved());
        assert!(!dir.path().join("CO_CU_STATUS_En.csv").exists());
        assert_eq!(
            fs::read_to_string(target_dir.join("CO_CU_STATUS_En.csv")).unwrap(),
            "new\n"
        );
    }

    #[test]
    fn test_failed_directory_keeps_source_and_other_files_proceed() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("CM_CU_SITES_En.csv"), "chum\n").unwrap();
        fs::write(dir.path().join("CO_CU_SITES_En.csv"), "coho\n").unwrap();
        // A plain file where the Chum folder should go blocks its creation.
        fs::write(dir.path().join("Chum_Salmon_CU_20260205"), "blocker").unwrap();

        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        let records = execute_plan(&plan, false, &SilentReporter);

        let chum = records
            .iter()
            .find(|r| r.entry.file_name == "CM_CU_SITES_En.csv")
            .unwrap();
        assert!(chum.outcome.is_failed());
        assert!(dir.path().join("CM_CU_SITES_En.csv").exists());

        let coho = records
            .iter()
            .find(|r| r.entry.file_name == "CO_CU_SITES_En.csv")
            .unwrap();
        assert!(coho.outcome.is_moved());
    }

    #[test]
    fn test_vanished_source_fails() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("PKO_CU_SITES_En.csv");
        fs::write(&source, "pink\n").unwrap();

        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        fs::remove_file(&source).unwrap();
        let records = execute_plan(&plan, false, &SilentReporter);
        assert!(records[0].outcome.is_failed());
    }

    fn no_partial_files(dir: &Path) -> bool {
        fs::read_dir(dir)
            .unwrap()
            .all(|e| !e.unwrap().file_name().to_string_lossy().ends_with(".partial"))
    }

    #[test]
    fn test_copy_then_delete_moves_and_replaces() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("SER_CU_SITES_En.csv");
        fs::write(&source, "river\n").unwrap();
        let target_dir = dir.path().join("Sockeye_River_CU_20260205");
        fs::create_dir(&target_dir).unwrap();
        let destination = target_dir.join("SER_CU_SITES_En.csv");
        fs::write(&destination, "old\n").unwrap();

        let outcome = copy_then_delete(
            &source,
            &destination,
            |from, to| fs::copy(from, to),
            |path| fs::remove_file(path),
        );

        assert_eq!(outcome, MoveOutcome::Moved(MoveMethod::CopyThenDelete));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "river\n");
        assert!(no_partial_files(&target_dir));
    }

    #[test]
    fn test_interrupted_copy_leaves_nothing_at_destination() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("CK_CU_SITES_En.csv");
        fs::write(&source, "CU_INDEX,SITE_ID\nCK-03,201\n").unwrap();
        let target_dir = dir.path().join("Chinook_Salmon_CU_20260205");
        fs::create_dir(&target_dir).unwrap();
        let destination = target_dir.join("CK_CU_SITES_En.csv");

        // Writes a few bytes, then runs out of space.
        let outcome = copy_then_delete(
            &source,
            &destination,
            |_: &Path, to: &Path| -> io::Result<u64> {
                fs::write(to, "CU_I")?;
                Err(io::Error::new(io::ErrorKind::Other, "No space left on device"))
            },
            |path| fs::remove_file(path),
        );

        assert!(outcome.is_failed());
        assert_eq!(
            fs::read_to_string(&source).unwrap(),
            "CU_INDEX,SITE_ID\nCK-03,201\n"
        );
        assert!(!destination.exists());
        assert!(no_partial_files(&target_dir));

        // The next run is not fooled into "skipped (exists)".
        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        assert!(!plan[0].destination_exists);
        let records = execute_plan(&plan, false, &SilentReporter);
        assert!(records[0].outcome.is_moved());
        assert_eq!(
            fs::read_to_string(&destination).unwrap(),
            "CU_INDEX,SITE_ID\nCK-03,201\n"
        );
    }

    #[test]
    fn test_source_that_cannot_be_removed_rolls_back_copy() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("PKE_CU_STATUS_En.csv");
        fs::write(&source, "even\n").unwrap();
        let target_dir = dir.path().join("Pink_Salmon_Even_CU_20260205");
        fs::create_dir(&target_dir).unwrap();
        let destination = target_dir.join("PKE_CU_STATUS_En.csv");

        let outcome = copy_then_delete(
            &source,
            &destination,
            |from, to| fs::copy(from, to),
            |_| Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only")),
        );

        match outcome {
            MoveOutcome::Failed(reason) => assert!(reason.contains("could not remove source")),
            other => panic!("expected Failed, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&source).unwrap(), "even\n");
        assert!(!destination.exists());
        assert!(no_partial_files(&target_dir));
    }

    #[test]
    fn test_directory_in_the_way_fails_and_keeps_source() {
        let dir = tempdir().unwrap();
        let source = dir.path().join("CO_CU_STATUS_En.csv");
        fs::write(&source, "coho\n").unwrap();
        // A non-empty directory named like the destination file defeats both
        // the rename and the final step of the copy fallback.
        let blocker = dir
            .path()
            .join("Coho_Salmon_CU_20260205")
            .join("CO_CU_STATUS_En.csv");
        fs::create_dir_all(&blocker).unwrap();
        fs::write(blocker.join("keep.txt"), "keep").unwrap();

        let plan = build_plan(dir.path(), &RuleTable::standard(), date()).unwrap();
        let records = execute_plan(&plan, true, &SilentReporter);

        assert!(records[0].outcome.is_failed());
        assert_eq!(fs::read_to_string(&source).unwrap(), "coho\n");
        assert!(blocker.join("keep.txt").exists());
        assert!(no_partial_files(&dir.path().join("Coho_Salmon_CU_20260205")));
    }

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        assert_eq!(
            partial_path(Path::new("out/Chum_Salmon_CU_20260205/CM_CU_SITES_En.csv")),
            Path::new("out/Chum_Salmon_CU_20260205/.CM_CU_SITES_En.csv.partial")
        );
    }

    #[test]
    fn test_outcome_display() {
        assert_eq!(
            MoveOutcome::Skipped(SkipReason::DestinationExists).to_string(),
            "skipped (exists)"
        );
        assert_eq!(
            MoveOutcome::Skipped(SkipReason::NoRuleMatch).to_string(),
            "skipped (no rule match)"
        );
    }
}
