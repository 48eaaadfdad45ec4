use crate::commands::CommandReport;
use crate::commands::index::{self, IndexOptions};
use crate::commands::reconcile::{self, ReconcileOptions};
use crate::commands::sweep::{self, SweepOptions};
use crate::custodian::cleanup::CleanupStrategy;
use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "custodian",
    version,
    about = "Keep a blueprint repository consistent with its metadata store"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Partition on-disk groups against the store and clean up orphans.
    ///
    /// Without --execute this is a simulation: every planned action is
    /// reported and nothing on disk changes.
    Reconcile {
        /// Actually move/delete files instead of simulating.
        #[arg(long)]
        execute: bool,
        /// Cleanup strategy for orphaned groups (default: configured, move).
        #[arg(long, value_enum)]
        strategy: Option<CleanupStrategy>,
    },
    /// Build the canonical index.json manifest.
    Index {
        /// Cross-check on-disk groups against the store's ids.
        #[arg(long)]
        validate: bool,
    },
    /// Purge quarantined files older than the retention window.
    Sweep {
        /// Actually delete expired files instead of simulating.
        #[arg(long)]
        execute: bool,
    },
}

fn print_report(report: &CommandReport) {
    println!("[{}] ok={}", report.command, report.ok);
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        eprintln!("  issue: {issue}");
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let report = match cli.command {
        Command::Reconcile { execute, strategy } => {
            reconcile::run(&ReconcileOptions { execute, strategy })?
        }
        Command::Index { validate } => index::run(&IndexOptions { validate })?,
        Command::Sweep { execute } => sweep::run(&SweepOptions { execute })?,
    };

    print_report(&report);
    Ok(())
}
