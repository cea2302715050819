//! # Stockbook Operator Tool
//!
//! Inspects and backs up a ledger from the command line.
//!
//! ## Usage
//! ```bash
//! # Collection counts, dashboard totals, backup reminder
//! cargo run -p stockbook-store --bin stockbook -- status
//!
//! # Write a full JSON backup into the configured backup directory
//! cargo run -p stockbook-store --bin stockbook -- backup
//!
//! # Replace the ledger with a backup's contents
//! cargo run -p stockbook-store --bin stockbook -- restore ./Stockbook_Full_Data_2026-05-01.json
//!
//! # Report whether first-run seeding has happened
//! cargo run -p stockbook-store --bin stockbook -- seed-check --db ./dev.db
//! ```

use chrono::Utc;
use std::env;
use std::path::PathBuf;
use stockbook_core::Collection;
use stockbook_store::{CollectionRepository, Ledger, LedgerConfig};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq)]
enum Command {
    Status,
    Backup,
    Restore(PathBuf),
    SeedCheck,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut command = None;
    let mut config_path: Option<PathBuf> = None;
    let mut db_path: Option<PathBuf> = None;
    let mut out_dir: Option<PathBuf> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "status" => command = Some(Command::Status),
            "backup" => command = Some(Command::Backup),
            "seed-check" => command = Some(Command::SeedCheck),
            "restore" => {
                if i + 1 < args.len() {
                    command = Some(Command::Restore(PathBuf::from(&args[i + 1])));
                    i += 1;
                }
            }
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--out" | "-o" => {
                if i + 1 < args.len() {
                    out_dir = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other => eprintln!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }

    let Some(command) = command else {
        print_help();
        return Ok(());
    };

    init_tracing();

    let mut config = LedgerConfig::load(config_path)?;
    if let Some(path) = db_path {
        config.database_path = path;
    }

    println!("Database: {}", config.database_path.display());
    let ledger = Ledger::open(config).await?;

    match command {
        Command::Status => print_status(&ledger).await,
        Command::Backup => {
            let dir = out_dir.unwrap_or_else(|| ledger.config().backup_dir.clone());
            let receipt = ledger.backups().create_backup(&dir)?;
            println!("✓ Backup created");
            println!("  Path: {}", receipt.path.display());
            println!("  Records: {}", receipt.record_count);
            println!("  Taken: {}", receipt.backup_date.to_rfc3339());
        }
        Command::Restore(path) => {
            let restored = ledger.backups().restore_backup(&path)?;
            println!("✓ Restored {} records from {}", restored, path.display());
        }
        Command::SeedCheck => {
            match ledger.first_run_completed().await? {
                Some(at) => println!("✓ First run completed at {}", at),
                None => println!("⚠ First run not recorded"),
            }
            println!("  Products: {}", ledger.products().count());
        }
    }

    ledger.flush().await?;
    let stats = ledger.sink_stats();
    if stats.failed > 0 {
        eprintln!(
            "⚠ {} write(s) failed; last error: {}",
            stats.failed,
            stats.last_error.unwrap_or_default()
        );
    }
    ledger.shutdown().await?;

    Ok(())
}

async fn print_status(ledger: &Ledger) {
    let snapshot = ledger.cache().snapshot();
    let counts = [
        (Collection::Products, snapshot.products.len()),
        (Collection::Invoices, snapshot.invoices.len()),
        (Collection::Transactions, snapshot.transactions.len()),
        (Collection::Customers, snapshot.customers.len()),
        (Collection::Proposals, snapshot.proposals.len()),
        (Collection::Employees, snapshot.employees.len()),
    ];

    println!("Store: {}", ledger.store_name());
    match ledger.health_check().await {
        Some(true) => println!("Database: ✓ healthy"),
        Some(false) => println!("Database: ✗ not answering"),
        None => {}
    }
    println!();
    for (collection, count) in counts {
        println!("  {:<14}{:>6}", collection.name(), count);
    }

    let stats = ledger.dashboard();
    println!();
    println!("  Income        {:>14}", stats.total_income);
    println!("  Expense       {:>14}", stats.total_expense);
    println!("  Net           {:>14}", stats.net);
    println!("  Receivables   {:>14}", stats.pending_receivables);
    println!("  Stock value   {:>14}", stats.stock_value);
    println!("  Overdue       {:>14}", stats.overdue_count);
    println!("  Low stock     {:>14}", stats.low_stock_count);

    let backups = ledger.backups();
    println!();
    match backups.last_backup_date() {
        Some(at) => println!("Last backup: {}", at.to_rfc3339()),
        None => println!("Last backup: never"),
    }
    if backups.needs_backup(Utc::now()) {
        println!("⚠ A backup is due");
    }
}

fn print_help() {
    println!("Stockbook Operator Tool");
    println!();
    println!("Usage: stockbook <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  status             Collection counts, totals and backup reminder");
    println!("  backup             Write a full JSON backup");
    println!("  restore <FILE>     Replace all data with a backup's contents");
    println!("  seed-check         Show whether first-run seeding has happened");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir)");
    println!("  -d, --db <PATH>      Database file (overrides config)");
    println!("  -o, --out <DIR>      Backup directory (overrides config)");
    println!("  -h, --help           Show this help message");
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,stockbook=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();
}
