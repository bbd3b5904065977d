//! oxide-reconcile CLI
//!
//! Command-line tool for building, reconciling and exporting database schemas.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use oxide_reconcile::prelude::*;

/// Keep a database schema in line with a directory of SQL definitions.
#[derive(Parser)]
#[command(name = "oxide-reconcile")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Report format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new database and run every definition script.
    Build {
        /// Database URL of the database to create.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Definitions directory.
        #[arg(short, long, env = "OXIDE_SCRIPTS_DIR")]
        scripts_dir: PathBuf,
    },

    /// Apply the changes needed to match the definitions.
    #[command(alias = "update")]
    Reconcile {
        /// Database URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Definitions directory.
        #[arg(short, long, env = "OXIDE_SCRIPTS_DIR")]
        scripts_dir: PathBuf,

        /// Show the statements without executing them.
        #[arg(long)]
        dry_run: bool,
    },

    /// Write the live schema as definition scripts.
    Export {
        /// Database URL.
        #[arg(short, long, env = "DATABASE_URL")]
        database: String,

        /// Output directory.
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Build {
            database,
            scripts_dir,
        } => {
            let report = oxide_reconcile::build(&database, &scripts_dir).await?;
            output(cli.format, &report, || {
                println!(
                    "Built database: {} domain(s), {} table(s), {} procedure(s)",
                    report.domains, report.tables, report.procedures
                );
                print_warnings(&report.warnings);
            })?;
        }

        Commands::Reconcile {
            database,
            scripts_dir,
            dry_run,
        } => {
            let options = ReconcileOptions::new().dry_run(dry_run);
            let report = oxide_reconcile::reconcile(&database, &scripts_dir, options).await?;
            output(cli.format, &report, || print_reconcile(&report))?;
        }

        Commands::Export {
            database,
            output_dir,
        } => {
            let report = oxide_reconcile::export(&database, &output_dir).await?;
            output(cli.format, &report, || {
                println!(
                    "Exported {} domain(s), {} table(s), {} procedure(s) to {} ({} file(s))",
                    report.domains,
                    report.tables,
                    report.procedures,
                    report.output_dir.display(),
                    report.files_written
                );
                print_warnings(&report.warnings);
            })?;
        }
    }

    Ok(())
}

fn output<T: Serialize>(format: OutputFormat, report: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => text(),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

fn print_reconcile(report: &ReconcileReport) {
    if report.is_in_sync() {
        println!("Schema already in sync.");
        print_warnings(&report.warnings);
        return;
    }

    if report.dry_run {
        println!("\nStatements to apply:");
        println!("{:-<60}", "");
        for statement in &report.statements {
            println!("{statement}");
            println!();
        }
    }

    println!(
        "Domains: {} created, {} altered",
        report.domains_created, report.domains_altered
    );
    println!(
        "Tables: {} created, {} altered",
        report.tables_created, report.tables_altered
    );
    println!("Procedures: {} created or replaced", report.procedures_replaced);
    print_warnings(&report.warnings);
}

fn print_warnings(warnings: &[String]) {
    if warnings.is_empty() {
        return;
    }
    println!("\nSkipped:");
    for warning in warnings {
        println!("  {warning}");
    }
}
