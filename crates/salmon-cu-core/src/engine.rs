use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::config::{ExtractConfig, SortConfig};
use crate::error::Error;
use crate::extract::query::{LOCALIZED_NAMES_TABLE, TRANSLATION_TABLE};
use crate::extract::{self, QuerySpec};
use crate::progress::ProgressReporter;
use crate::sort::{self, MoveOutcome, MoveRecord, PlanEntry, RuleTable};
use crate::storage::{source, Database};

pub struct ExtractEngine {
    config: ExtractConfig,
    catalog: Vec<QuerySpec>,
}

#[derive(Debug)]
pub struct ExtractResult {
    pub load_duration: Duration,
    pub query_duration: Duration,
    pub tables_loaded: usize,
    pub files_written: Vec<PathBuf>,
    pub total_rows: usize,
    /// Localized variants not run because their join tables were not loaded.
    pub skipped: Vec<String>,
    /// Variants that ran but whose joins still need checking against real data.
    pub pending_validation: Vec<String>,
}

impl ExtractEngine {
    pub fn new(config: ExtractConfig) -> Self {
        Self {
            config,
            catalog: extract::standard_catalog(),
        }
    }

    pub fn with_catalog(mut self, catalog: Vec<QuerySpec>) -> Self {
        self.catalog = catalog;
        self
    }

    /// The catalog entries this run will execute, honouring `queries`.
    pub fn selected_queries(&self) -> Vec<&QuerySpec> {
        if self.config.queries.is_empty() {
            return self.catalog.iter().collect();
        }
        for wanted in &self.config.queries {
            if !self.catalog.iter().any(|q| &q.name == wanted) {
                warn!("Unknown query '{}' ignored", wanted);
            }
        }
        self.catalog
            .iter()
            .filter(|q| self.config.queries.contains(&q.name))
            .collect()
    }

    /// Run the extraction stage:
    /// 1. Load every configured export into the in-memory store
    /// 2. Run each selected query
    /// 3. Write `<output_dir>/<stem>.csv` per query
    pub fn run(&self, reporter: &dyn ProgressReporter) -> Result<ExtractResult, Error> {
        // Phase 1: Load
        info!("Loading source tables...");
        let load_start = Instant::now();
        let (db, tables_loaded) = self.load_sources(reporter)?;
        let load_duration = load_start.elapsed();

        let localization_ready =
            db.has_table(TRANSLATION_TABLE)? && db.has_table(LOCALIZED_NAMES_TABLE)?;

        // Phase 2: Query and write
        let queries = self.selected_queries();
        info!("Running {} queries...", queries.len());
        reporter.on_extract_start(queries.len());
        let query_start = Instant::now();

        let mut files_written = Vec::new();
        let mut total_rows = 0;
        let mut skipped = Vec::new();
        let mut pending_validation = Vec::new();

        for spec in queries {
            if spec.localization.is_some() && !localization_ready {
                warn!(
                    "Skipping {}: translation tables '{}' and '{}' not loaded",
                    spec.name, TRANSLATION_TABLE, LOCALIZED_NAMES_TABLE
                );
                skipped.push(spec.name.clone());
                continue;
            }
            if spec.needs_validation {
                warn!("{} uses unverified joins; check output against source data", spec.name);
                pending_validation.push(spec.name.clone());
            }

            let result = extract::run_query(&db, spec)?;
            let path = extract::write_csv(&result, &self.config.output_dir)?;
            debug!("Wrote {} rows to {}", result.rows.len(), path.display());

            total_rows += result.rows.len();
            reporter.on_query_complete(&spec.name, result.rows.len());
            files_written.push(path);
        }

        let query_duration = query_start.elapsed();
        reporter.on_extract_complete(files_written.len(), query_duration.as_secs_f64());

        Ok(ExtractResult {
            load_duration,
            query_duration,
            tables_loaded,
            files_written,
            total_rows,
            skipped,
            pending_validation,
        })
    }

    fn load_sources(&self, reporter: &dyn ProgressReporter) -> Result<(Database, usize), Error> {
        let mut db = Database::open_in_memory()?;
        let mut loaded = 0;

        for (name, source_file) in &self.config.sources {
            let path = self.config.input_dir.join(&source_file.file);
            if !path.exists() {
                if source_file.required {
                    return Err(Error::Other(format!(
                        "Required source '{}' not found at {}",
                        name,
                        path.display()
                    )));
                }
                warn!("Optional source '{}' not found at {}", name, path.display());
                continue;
            }

            let table = source::read_table(&path, name, source_file.sheet.as_deref())?;
            let rows = db.load_table(&table)?;
            reporter.on_load_table(name, rows);
            info!("Loaded '{}' ({} rows)", name, rows);
            loaded += 1;
        }

        Ok((db, loaded))
    }
}

pub struct SortEngine {
    config: SortConfig,
    rules: RuleTable,
}

#[derive(Debug)]
pub struct SortResult {
    pub dry_run: bool,
    pub plan: Vec<PlanEntry>,
    /// Empty on a dry run.
    pub records: Vec<MoveRecord>,
    pub duration: Duration,
}

impl SortResult {
    fn count(&self, wanted: fn(&MoveOutcome) -> bool) -> usize {
        self.records.iter().filter(|r| wanted(&r.outcome)).count()
    }

    pub fn moved(&self) -> usize {
        self.count(MoveOutcome::is_moved)
    }

    pub fn skipped(&self) -> usize {
        self.count(MoveOutcome::is_skipped)
    }

    pub fn failed(&self) -> usize {
        self.count(MoveOutcome::is_failed)
    }
}

impl SortEngine {
    pub fn new(config: SortConfig) -> Result<Self, Error> {
        let rules = config.rule_table()?;
        for (earlier, later) in rules.shadowed() {
            warn!(
                "Rule '{}' can never match: earlier keyword '{}' always wins",
                later.keyword, earlier.keyword
            );
        }
        Ok(Self { config, rules })
    }

    pub fn rules(&self) -> &RuleTable {
        &self.rules
    }

    pub fn plan(&self, today: NaiveDate) -> Result<Vec<PlanEntry>, Error> {
        sort::build_plan(&self.config.output_root, &self.rules, today)
    }

    /// Build the plan and, unless this is a dry run, execute it.
    pub fn run(
        &self,
        today: NaiveDate,
        reporter: &dyn ProgressReporter,
    ) -> Result<SortResult, Error> {
        let start = Instant::now();
        let plan = self.plan(today)?;
        info!(
            "Planned {} files from {}",
            plan.len(),
            self.config.output_root.display()
        );

        let records = if self.config.dry_run {
            info!("Dry run: nothing will be moved");
            Vec::new()
        } else {
            sort::execute_plan(&plan, self.config.overwrite, reporter)
        };

        Ok(SortResult {
            dry_run: self.config.dry_run,
            plan,
            records,
            duration: start.elapsed(),
        })
    }
}
