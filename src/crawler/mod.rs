//! Crawler module for fetching documentation pages
//!
//! This module contains the scrape pass, including:
//! - HTTP fetching of single pages
//! - Bounded, paced dispatch of fetches across a batch of symbols
//! - Archiving delivered pages and recording the pass

mod coordinator;
mod fetcher;
mod scheduler;

pub use coordinator::{
    archive_page, archive_results, Coordinator, ScrapeOutcome, ScrapeTarget,
};
pub use fetcher::{build_http_client, FetchError, PageFetcher};
pub use scheduler::{FetchResult, FetchScheduler, ScheduleReport};

use crate::config::Config;
use crate::NtdocsError;
use tokio::sync::watch;

/// Runs a complete scrape pass
///
/// This is the main entry point for scraping. It will:
/// 1. Open the database
/// 2. Select the symbols with no archived page
/// 3. Fetch them with bounded concurrency and pacing
/// 4. Archive each page's main content
/// 5. Record the run and its tally
///
/// # Arguments
///
/// * `config` - The validated configuration
/// * `config_hash` - Hash recorded with the run
/// * `target` - Function pages or structures in use
/// * `cancel` - Set to `true` to stop dispatching further fetches
pub async fn scrape(
    config: Config,
    config_hash: String,
    target: ScrapeTarget,
    cancel: watch::Receiver<bool>,
) -> Result<ScrapeOutcome, NtdocsError> {
    let mut coordinator = Coordinator::new(config, config_hash)?;
    coordinator.run(target, cancel).await
}
