//! Output module for pass summaries and database statistics
//!
//! This module handles:
//! - Tallying per-record outcomes of a scrape or fill pass
//! - Loading and printing database statistics

pub mod stats;
mod tally;

pub use stats::{load_statistics, print_statistics, DocStatistics};
pub use tally::RunTally;
