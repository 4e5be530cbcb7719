mod commands;
mod logging;
mod progress;

use std::process;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{CommandFactory, Parser};
use colored::*;
use commands::{Cli, Commands, SortTarget};
use dotenv::dotenv;
use progress::CliReporter;
use salmon_cu_core::config::SortConfig;
use salmon_cu_core::sort::{MoveOutcome, PlanEntry, PlanSummary};
use salmon_cu_core::{AppConfig, ExtractEngine, SortEngine};
use tracing::{error, info, warn};

fn main() {
    dotenv().ok();

    let _guard = logging::init_logger();

    let config = match salmon_cu_core::config::load_configuration() {
        Ok(config) => config,
        Err(err) => {
            error!("Error loading configuration: {}", err);
            process::exit(1);
        }
    };

    let args = Cli::parse();

    let outcome = match args.command {
        Some(Commands::Extract { only }) => run_extract(config, only),
        Some(Commands::Plan { target }) => run_plan(config.sort, &target),
        Some(Commands::Sort {
            target,
            dry_run,
            overwrite,
        }) => run_sort(config.sort, &target, dry_run, overwrite),
        Some(Commands::ListQueries) => {
            list_queries();
            Ok(())
        }
        Some(Commands::Rules) => print_rules(&config.sort),
        Some(Commands::PrintConfig) => {
            println!("Configuration: {:#?}", config);
            Ok(())
        }
        None => {
            let _ = Cli::command().print_long_help();
            Ok(())
        }
    };

    if let Err(err) = outcome {
        error!("Error: {:#}", err);
        process::exit(1);
    }
}

fn run_extract(config: AppConfig, only: Vec<String>) -> Result<()> {
    let mut extract = config.extract;
    if !only.is_empty() {
        extract.queries = only;
    }
    let output_dir = extract.output_dir.clone();

    let engine = ExtractEngine::new(extract);
    let result = engine.run(&CliReporter::new())?;

    println!();
    info!(
        "Load: {}, Queries: {}",
        format!("{:.2}s", result.load_duration.as_secs_f64()).green(),
        format!("{:.2}s", result.query_duration.as_secs_f64()).green(),
    );
    info!(
        "{} tables loaded, {} files written to {}, {} rows",
        format!("{}", result.tables_loaded).cyan(),
        format!("{}", result.files_written.len()).cyan(),
        output_dir.display(),
        format!("{}", result.total_rows).cyan(),
    );
    if !result.skipped.is_empty() {
        warn!(
            "{} localized variants skipped: {}",
            format!("{}", result.skipped.len()).yellow(),
            result.skipped.join(", ")
        );
    }
    if !result.pending_validation.is_empty() {
        warn!(
            "{} variants need checking against source data: {}",
            format!("{}", result.pending_validation.len()).yellow(),
            result.pending_validation.join(", ")
        );
    }

    Ok(())
}

fn apply_target(mut sort: SortConfig, target: &SortTarget) -> Result<(SortConfig, NaiveDate)> {
    if let Some(root) = &target.output_root {
        sort.output_root = root.clone();
    }
    let today = match &target.date {
        Some(date) => NaiveDate::parse_from_str(date, "%Y%m%d")
            .with_context(|| format!("Invalid --date '{}', expected YYYYMMDD", date))?,
        None => Local::now().date_naive(),
    };
    Ok((sort, today))
}

fn run_plan(sort: SortConfig, target: &SortTarget) -> Result<()> {
    let (sort, today) = apply_target(sort, target)?;
    let engine = SortEngine::new(sort)?;
    let plan = engine.plan(today)?;
    print_plan(&plan);
    Ok(())
}

fn run_sort(sort: SortConfig, target: &SortTarget, dry_run: bool, overwrite: bool) -> Result<()> {
    let (mut sort, today) = apply_target(sort, target)?;
    sort.dry_run |= dry_run;
    sort.overwrite |= overwrite;

    let engine = SortEngine::new(sort)?;
    let result = engine.run(today, &CliReporter::new())?;

    if result.dry_run {
        print_plan(&result.plan);
        return Ok(());
    }

    for record in &result.records {
        let outcome = match &record.outcome {
            MoveOutcome::Moved(_) => record.outcome.to_string().green(),
            MoveOutcome::Skipped(_) => record.outcome.to_string().yellow(),
            MoveOutcome::Failed(_) => record.outcome.to_string().red(),
        };
        println!("  {} {}", record.entry.file_name, outcome);
    }

    println!();
    info!(
        "Sort: {} moved, {} skipped, {} failed in {}",
        format!("{}", result.moved()).green(),
        format!("{}", result.skipped()).yellow(),
        format!("{}", result.failed()).red(),
        format!("{:.2}s", result.duration.as_secs_f64()).green(),
    );

    if result.failed() > 0 {
        anyhow::bail!("{} files could not be moved", result.failed());
    }
    Ok(())
}

fn print_plan(plan: &[PlanEntry]) {
    for entry in plan {
        match (&entry.destination, entry.destination_exists) {
            (Some(dest), false) => {
                println!("  {} -> {}", entry.file_name, dest.display().to_string().green())
            }
            (Some(dest), true) => println!(
                "  {} -> {} {}",
                entry.file_name,
                dest.display(),
                "(exists)".yellow()
            ),
            (None, _) => println!("  {} {}", entry.file_name, "(no rule match)".yellow()),
        }
    }

    let summary = PlanSummary::from_entries(plan);
    println!();
    info!(
        "{} files to route into {} folders ({} already present), {} unmatched",
        format!("{}", summary.classified).cyan(),
        format!("{}", summary.destination_dirs.len()).cyan(),
        format!("{}", summary.existing).yellow(),
        format!("{}", summary.unclassified).yellow(),
    );
}

fn list_queries() {
    for query in salmon_cu_core::extract::standard_catalog() {
        let marker = if query.needs_validation {
            " (needs validation)".yellow().to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<24} {:<12} {}{}",
            query.name.cyan(),
            query.table,
            query.title,
            marker
        );
    }
}

fn print_rules(sort: &SortConfig) -> Result<()> {
    let rules = sort.rule_table()?;
    for (position, rule) in rules.rules().iter().enumerate() {
        println!("  {:>2}. {:<10} -> {}", position + 1, rule.keyword.cyan(), rule.label);
    }
    for (earlier, later) in rules.shadowed() {
        warn!(
            "Rule '{}' is shadowed by earlier keyword '{}'",
            later.keyword, earlier.keyword
        );
    }
    Ok(())
}
