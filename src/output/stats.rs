//! Statistics generation from the documentation database
//!
//! This module provides functionality for extracting and displaying
//! database statistics from the storage layer.

use crate::storage::{RunRecord, Storage};
use crate::NtdocsError;

/// Database statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocStatistics {
    /// Symbols in the index
    pub symbols: u64,

    /// Archived pages
    pub raw_pages: u64,

    /// Symbols still waiting for their page
    pub unscraped: u64,

    /// Parsed function records
    pub function_records: u64,

    /// Parsed structure records
    pub structure_records: u64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(DocStatistics)` - Successfully loaded statistics
/// * `Err(NtdocsError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<DocStatistics, NtdocsError> {
    Ok(DocStatistics {
        symbols: storage.count_symbols()?,
        raw_pages: storage.count_raw_pages()?,
        unscraped: storage.count_unscraped()?,
        function_records: storage.count_function_records()?,
        structure_records: storage.count_structure_records()?,
    })
}

fn percentage(part: u64, whole: u64) -> f64 {
    if whole > 0 {
        (part as f64 / whole as f64) * 100.0
    } else {
        0.0
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
/// * `latest_run` - The most recent pass, if any
pub fn print_statistics(stats: &DocStatistics, latest_run: Option<&RunRecord>) {
    println!("=== Documentation Statistics ===\n");

    println!("Symbol index:");
    println!("  Symbols: {}", stats.symbols);
    println!(
        "  Archived pages: {} ({:.1}%)",
        stats.raw_pages,
        percentage(stats.symbols - stats.unscraped.min(stats.symbols), stats.symbols)
    );
    println!("  Waiting to be scraped: {}", stats.unscraped);
    println!();

    println!("Parsed records:");
    println!("  Functions: {}", stats.function_records);
    println!("  Structures: {}", stats.structure_records);
    println!();

    if let Some(run) = latest_run {
        println!("Latest run:");
        println!("  #{} {} ({})", run.id, run.kind, run.status.to_db_string());
        println!("  Started: {}", run.started_at);
        if let Some(finished) = &run.finished_at {
            println!("  Finished: {}", finished);
        }
        println!("  Succeeded: {}, failed: {}", run.succeeded, run.failed);
    }
}
