//! ntdocs main entry point
//!
//! This is the command-line interface for the Windows API documentation
//! scraper.

use anyhow::Context;
use clap::{ArgGroup, Parser};
use ntdocs::config::{load_config_with_hash, Config};
use ntdocs::crawler::{scrape, ScrapeTarget};
use ntdocs::ingest::{fill_function_records, fill_structure_records};
use ntdocs::lookup::SymbolLookup;
use ntdocs::output::{load_statistics, print_statistics};
use ntdocs::storage::{self, SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// ntdocs: a Windows API documentation scraper
///
/// ntdocs fetches Win32 documentation pages politely, archives their
/// article content, and parses the archive into function and structure
/// records stored in SQLite.
#[derive(Parser, Debug)]
#[command(name = "ntdocs")]
#[command(version)]
#[command(about = "A Windows API documentation scraper", long_about = None)]
#[command(group(
    ArgGroup::new("mode")
        .required(true)
        .args(["scrape_functions", "scrape_structures", "fill_function_records", "fill_structure_records", "lookup", "stats"]),
))]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Fetch and archive every function page not archived yet
    #[arg(long)]
    scrape_functions: bool,

    /// Fetch and archive structures used by recorded functions
    #[arg(long)]
    scrape_structures: bool,

    /// Parse archived function pages into function records
    #[arg(long)]
    fill_function_records: bool,

    /// Parse archived structure pages into structure records
    #[arg(long)]
    fill_structure_records: bool,

    /// Print the stored record of one function as JSON
    #[arg(long, value_name = "NAME")]
    lookup: Option<String>,

    /// Show statistics from the database and exit
    #[arg(long)]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.scrape_functions {
        handle_scrape(config, config_hash, ScrapeTarget::Functions).await
    } else if cli.scrape_structures {
        handle_scrape(config, config_hash, ScrapeTarget::Structures).await
    } else if cli.fill_function_records {
        handle_fill(&config, &config_hash, ScrapeTarget::Functions)
    } else if cli.fill_structure_records {
        handle_fill(&config, &config_hash, ScrapeTarget::Structures)
    } else if let Some(name) = cli.lookup.as_deref() {
        handle_lookup(&config, name)
    } else {
        handle_stats(&config)
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ntdocs=info,warn"),
            1 => EnvFilter::new("ntdocs=debug,info"),
            2 => EnvFilter::new("ntdocs=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

fn open_storage(config: &Config) -> anyhow::Result<SqliteStorage> {
    storage::open_storage(Path::new(&config.output.database_path))
        .with_context(|| format!("failed to open database {}", config.output.database_path))
}

/// Handles the scrape modes; Ctrl-C stops further dispatch
async fn handle_scrape(
    config: Config,
    config_hash: String,
    target: ScrapeTarget,
) -> anyhow::Result<()> {
    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight fetches");
            let _ = cancel_tx.send(true);
        }
    });

    let outcome = scrape(config, config_hash, target, cancel_rx)
        .await
        .with_context(|| format!("{} failed", target.run_kind()))?;

    outcome.tally.report(target.run_kind());
    if outcome.report.undelivered > 0 {
        println!("  Undelivered: {}", outcome.report.undelivered);
    }
    if outcome.report.skipped > 0 {
        println!("  Not dispatched: {}", outcome.report.skipped);
    }
    Ok(())
}

/// Handles the offline parse passes
fn handle_fill(config: &Config, config_hash: &str, target: ScrapeTarget) -> anyhow::Result<()> {
    let mut storage = open_storage(config)?;
    let (pass, tally) = match target {
        ScrapeTarget::Functions => (
            ntdocs::ingest::FUNCTION_PASS,
            fill_function_records(&mut storage, config_hash)?,
        ),
        ScrapeTarget::Structures => (
            ntdocs::ingest::STRUCTURE_PASS,
            fill_structure_records(&mut storage, config_hash)?,
        ),
    };
    tally.report(pass);
    Ok(())
}

/// Handles the --lookup mode
fn handle_lookup(config: &Config, name: &str) -> anyhow::Result<()> {
    let storage = open_storage(config)?;
    let mut lookup = SymbolLookup::new(storage, config.lookup.cache_capacity);

    let Some(data) = lookup.get(name)? else {
        anyhow::bail!("no function record named '{}'", name);
    };

    let parameters: Vec<serde_json::Value> = data
        .parameters
        .iter()
        .map(|p| {
            serde_json::json!({
                "name": p.name,
                "datatype": p.datatype,
                "usage": p.usage,
                "documentation": p.documentation,
            })
        })
        .collect();
    let requirements: serde_json::Value =
        serde_json::from_str(&data.requirements).unwrap_or(serde_json::Value::Null);

    let rendered = serde_json::json!({
        "name": data.name,
        "return": data.return_type,
        "arity": data.arity,
        "description": data.description,
        "requirements": requirements,
        "parameters": parameters,
    });
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(config)?;
    let stats = load_statistics(&storage)?;
    let latest = storage.get_latest_run()?;

    print_statistics(&stats, latest.as_ref());
    Ok(())
}
