use clap::{Parser, ValueEnum};
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use temple_ledger::TempleLedger;
use temple_ledger::config::LedgerConfig;
use temple_ledger::domain::ports::LedgerStoreRef;
use temple_ledger::infrastructure::in_memory::InMemoryLedgerStore;
use temple_ledger::interfaces::csv::command_reader::CommandReader;
use temple_ledger::interfaces::csv::report_writer::ReportWriter;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Report {
    /// Per-temple counts and successful revenue
    Summary,
    /// Every ticket with its user, temple and payment
    Tickets,
}

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Input commands CSV file
    input: PathBuf,

    /// Path to persistent database (optional). If provided, uses RocksDB.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// JSON configuration file (optional). TEMPLE_LEDGER_* variables override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which report to write to stdout once all commands have run
    #[arg(long, value_enum, default_value_t = Report::Summary)]
    report: Report,
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

fn open_store(db_path: Option<PathBuf>, config: &LedgerConfig) -> Result<LedgerStoreRef> {
    #[cfg(feature = "storage-rocksdb")]
    if let Some(db_path) = db_path {
        let store = temple_ledger::infrastructure::rocksdb::RocksDBLedgerStore::open(
            db_path,
            config.lock_timeout(),
        )
        .into_diagnostic()?;
        return Ok(Arc::new(store));
    }

    #[cfg(not(feature = "storage-rocksdb"))]
    if db_path.is_some() {
        warn!(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
        );
    }

    Ok(Arc::new(InMemoryLedgerStore::new(config.lock_timeout())))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = LedgerConfig::load(cli.config.as_deref()).into_diagnostic()?;
    let store = open_store(cli.db_path, &config)?;
    let ledger = TempleLedger::with_defaults(store, &config);

    // Process commands
    let file = File::open(cli.input).into_diagnostic()?;
    let reader = CommandReader::new(file);
    for (index, command) in reader.commands().enumerate() {
        let record = index + 1;
        match command {
            Ok(command) => match ledger.execute(command).await {
                Ok(outcome) => debug!(record, %outcome, "command applied"),
                Err(e) => warn!(record, error = %e, "Error processing command"),
            },
            Err(e) => warn!(record, error = %e, "Error reading command"),
        }
    }

    let stdout = io::stdout();
    match cli.report {
        Report::Summary => {
            let summaries = ledger.revenue.temple_summaries().await.into_diagnostic()?;
            ReportWriter::new(stdout.lock())
                .write_summaries(&summaries)
                .into_diagnostic()?;
        }
        Report::Tickets => {
            let rows = ledger.revenue.ticket_report().await.into_diagnostic()?;
            ReportWriter::new(stdout.lock())
                .write_ticket_report(&rows)
                .into_diagnostic()?;
        }
    }

    Ok(())
}
