use std::env;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use database::{transaction, Database};
use extractor::{read_export, BatchError, BatchParser, BatchResult};
use serde::Serialize;
use tracing::info;

const DEFAULT_DATABASE_URL: &str = "sqlite:momo_transactions.db?mode=rwc";

#[derive(Debug, Parser)]
#[command(name = "ingester")]
#[command(about = "Parse mobile-money SMS exports and load them into the transaction store")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// SQLite database URL. Falls back to DATABASE_URL env.
    #[arg(long, global = true)]
    database_url: Option<String>,

    /// Worker threads used for extraction
    #[arg(long, global = true, default_value_t = 1)]
    workers: usize,

    /// Write the rejection log (index and reason per message) to this JSON file
    #[arg(long, global = true)]
    reject_log: Option<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Create the database schema and seed the category table.
    Setup,
    /// Parse an export and write the accepted records as JSON.
    Parse {
        /// SMS backup XML or JSON export
        file: PathBuf,

        /// Output path for the cleaned records
        #[arg(long, default_value = "cleaned_data.json")]
        output: PathBuf,
    },
    /// Parse an export and insert the accepted records into the database.
    Process {
        /// SMS backup XML or JSON export
        file: PathBuf,
    },
    /// Print transaction totals per category and per month.
    Summary,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let global = &cli.global;

    match &cli.command {
        Command::Setup => {
            let db = open_database(global).await?;
            db.close().await;
        }
        Command::Parse { file, output } => {
            let result = run_batch(global, file)?;
            write_json(output, &result.accepted)?;
            info!(
                output = %output.display(),
                records = result.accepted.len(),
                "Wrote cleaned records"
            );
        }
        Command::Process { file } => {
            let result = run_batch(global, file)?;
            let db = open_database(global).await?;
            let inserted = transaction::insert_transactions(db.pool(), &result.accepted).await?;
            info!(inserted, "Stored batch");
            db.close().await;
        }
        Command::Summary => {
            let db = open_database(global).await?;
            print_summary(&db).await?;
            db.close().await;
        }
    }

    Ok(())
}

fn database_url(global: &GlobalArgs) -> String {
    global
        .database_url
        .clone()
        .or_else(|| env::var("DATABASE_URL").ok())
        .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string())
}

async fn open_database(global: &GlobalArgs) -> Result<Database, Box<dyn Error>> {
    let db = Database::connect(&database_url(global)).await?;
    db.migrate().await?;
    Ok(db)
}

/// Read and extract one export. The rejection log is written even when the
/// batch as a whole fails.
fn run_batch(global: &GlobalArgs, file: &Path) -> Result<BatchResult, Box<dyn Error>> {
    let messages = read_export(file)?;
    info!(file = %file.display(), messages = messages.len(), "Loaded export");

    let parser = BatchParser::default().with_workers(global.workers);
    let result = match parser.process(&messages) {
        Ok(result) => result,
        Err(err) => {
            if let (BatchError::NoneAccepted { log, .. }, Some(path)) = (&err, &global.reject_log) {
                write_json(path, log)?;
            }
            return Err(err.into());
        }
    };

    if let Some(path) = &global.reject_log {
        write_json(path, &result.rejection_log)?;
    }

    let summary = result.summary();
    println!(
        "{} messages: {} accepted, {} rejected, {} unmatched",
        summary.total, summary.accepted, summary.rejected, summary.unmatched
    );

    Ok(result)
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json)?;
    Ok(())
}

async fn print_summary(db: &Database) -> Result<(), Box<dyn Error>> {
    let pool = db.pool();
    let count = transaction::count_transactions(pool).await?;
    let by_category = transaction::summary_by_category(pool).await?;
    let by_month = transaction::summary_by_month(pool).await?;

    println!("Transactions: {count}");
    println!();
    println!("{:<22} {:>8} {:>18}", "Category", "Count", "Total (RWF)");
    for (category, totals) in &by_category {
        println!(
            "{:<22} {:>8} {:>18.2}",
            category.label(),
            totals.count,
            totals.total_amount
        );
    }
    println!();
    println!("{:<22} {:>8} {:>18}", "Month", "Count", "Total (RWF)");
    for (month, totals) in &by_month {
        println!(
            "{:<22} {:>8} {:>18.2}",
            month, totals.count, totals.total_amount
        );
    }

    Ok(())
}
