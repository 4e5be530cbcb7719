use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "salmon-cu")]
#[command(about = "Extract salmon Conservation Unit tables and sort the exports", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Load the spreadsheet exports and write one CSV per catalog query
    Extract {
        /// Run only the named queries (repeatable)
        #[arg(long = "only", value_name = "NAME")]
        only: Vec<String>,
    },
    /// Show where each CSV in the output folder would be moved
    Plan {
        #[command(flatten)]
        target: SortTarget,
    },
    /// Move each CSV in the output folder into its dated keyword subfolder
    Sort {
        #[command(flatten)]
        target: SortTarget,
        /// Print the plan without moving anything
        #[arg(long)]
        dry_run: bool,
        /// Replace files already present at the destination
        #[arg(long)]
        overwrite: bool,
    },
    /// List the extraction catalog
    ListQueries,
    /// Print the active keyword rule table
    Rules,
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, clap::Args)]
pub struct SortTarget {
    /// Folder holding the extracted CSVs
    #[arg(long, value_name = "DIR")]
    pub output_root: Option<PathBuf>,
    /// Date stamped on destination folders, YYYYMMDD (default: today)
    #[arg(long, value_name = "YYYYMMDD")]
    pub date: Option<String>,
}
