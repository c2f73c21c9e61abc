//! Scrape pass coordinator
//!
//! This module ties the scrape pass together:
//! - Selecting the symbols whose pages are not archived yet
//! - Driving the fetch scheduler over them
//! - Extracting, compressing and archiving each delivered page
//! - Recording the pass and its tally as a run

use crate::codec;
use crate::config::Config;
use crate::crawler::{FetchResult, FetchScheduler, PageFetcher, ScheduleReport};
use crate::document::{extract_main_content, parse_page, ContentSource};
use crate::output::RunTally;
use crate::storage::{open_storage, RunStatus, SqliteStorage, Storage, SymbolKind};
use crate::NtdocsError;
use std::path::Path;
use tokio::sync::{mpsc, watch};

/// Which symbols a scrape pass goes after
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeTarget {
    /// Every function page not yet archived
    Functions,
    /// Structures referenced by stored function parameters
    Structures,
}

impl ScrapeTarget {
    pub fn run_kind(&self) -> &'static str {
        match self {
            Self::Functions => "scrape-functions",
            Self::Structures => "scrape-structures",
        }
    }
}

/// Result of one scrape pass
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub run_id: i64,
    pub tally: RunTally,
    pub report: ScheduleReport,
}

/// Main scrape coordinator structure
pub struct Coordinator {
    config: Config,
    storage: SqliteStorage,
    config_hash: String,
}

impl Coordinator {
    /// Creates a coordinator on the configured database
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `config_hash` - Hash recorded with every run
    pub fn new(config: Config, config_hash: String) -> Result<Self, NtdocsError> {
        let storage = open_storage(Path::new(&config.output.database_path))?;
        Ok(Self::with_storage(config, storage, config_hash))
    }

    pub fn with_storage(config: Config, storage: SqliteStorage, config_hash: String) -> Self {
        Self {
            config,
            storage,
            config_hash,
        }
    }

    pub fn storage(&self) -> &SqliteStorage {
        &self.storage
    }

    /// Runs one scrape pass
    ///
    /// Symbols already archived are never dispatched again. The pass is
    /// recorded as interrupted when `cancel` fired before it ended.
    pub async fn run(
        &mut self,
        target: ScrapeTarget,
        cancel: watch::Receiver<bool>,
    ) -> Result<ScrapeOutcome, NtdocsError> {
        let symbols = match target {
            ScrapeTarget::Functions => self
                .storage
                .list_unscraped_symbols(Some(&SymbolKind::Function))?,
            ScrapeTarget::Structures => self.storage.list_unscraped_structures_in_use()?,
        };

        // No run row until the client exists
        let fetcher = PageFetcher::new(&self.config.source, self.config.scraper.request_timeout())?;

        let run_id = self
            .storage
            .create_run(target.run_kind(), &self.config_hash)?;
        tracing::info!(
            "Starting {} run {} with {} symbols",
            target.run_kind(),
            run_id,
            symbols.len()
        );

        let scheduler =
            FetchScheduler::new(fetcher, &self.config.scraper, &self.config.source.base_url);
        let (mut results, handle) = scheduler.schedule(symbols, cancel.clone());

        let tally = archive_results(&mut self.storage, &mut results).await;

        let report = match handle.await {
            Ok(report) => report,
            Err(e) => {
                self.storage
                    .finish_run(run_id, RunStatus::Failed, tally.succeeded, tally.failed())?;
                return Err(e.into());
            }
        };

        let status = if *cancel.borrow() {
            RunStatus::Interrupted
        } else {
            RunStatus::Completed
        };
        self.storage
            .finish_run(run_id, status, tally.succeeded, tally.failed())?;

        tracing::info!(
            "Run {} {}: {} archived, {} failed, {} left pending",
            run_id,
            status.to_db_string(),
            tally.succeeded,
            tally.failed(),
            report.skipped
        );

        Ok(ScrapeOutcome {
            run_id,
            tally,
            report,
        })
    }
}

/// Extracts the article container of a live page and encodes it for storage
pub fn archive_page(body: &[u8]) -> Result<String, NtdocsError> {
    let document = parse_page(body);
    let content = extract_main_content(&document, ContentSource::LivePage)?;
    Ok(codec::compress(&content.outer_html())?)
}

/// Sink loop: archives every delivered page until the stream closes
///
/// Results are handled one at a time, so storage writes are serialized here.
/// A failed fetch or an unusable page is tallied and the symbol stays
/// unscraped for the next pass.
pub async fn archive_results<S: Storage>(
    storage: &mut S,
    results: &mut mpsc::Receiver<FetchResult>,
) -> RunTally {
    let mut tally = RunTally::new();

    while let Some(result) = results.recv().await {
        let Some(payload) = result.payload else {
            tally.record_failure("fetch_failed");
            continue;
        };

        let stored = archive_page(&payload).and_then(|blob| {
            storage
                .store_raw_page(&result.symbol_name, &blob)
                .map_err(NtdocsError::from)
        });

        match stored {
            Ok(()) => {
                tracing::debug!(symbol = %result.symbol_name, "Archived page");
                tally.record_success();
            }
            Err(e) => {
                tracing::warn!(symbol = %result.symbol_name, "Failed to archive page: {}", e);
                tally.record_failure(e.kind());
            }
        }
    }

    tally
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIVE_PAGE: &str = r#"<html><body>
        <div class="content"><nav>Docs</nav></div>
        <div class="content"><p>Releases memory.</p><h2 id="syntax">Syntax</h2></div>
        </body></html>"#;

    #[test]
    fn test_archive_page_keeps_article_container_only() {
        let blob = archive_page(LIVE_PAGE.as_bytes()).unwrap();
        let html = codec::decompress(&blob).unwrap();

        assert!(html.starts_with("<div class=\"content\">"));
        assert!(html.contains("Releases memory."));
        assert!(!html.contains("<nav>"));
    }

    #[test]
    fn test_archive_page_without_article() {
        let result = archive_page(b"<div class=\"content\"><nav>Docs</nav></div>");
        assert!(matches!(result, Err(NtdocsError::Extract(_))));
    }

    #[test]
    fn test_scrape_target_run_kind() {
        assert_eq!(ScrapeTarget::Functions.run_kind(), "scrape-functions");
        assert_eq!(ScrapeTarget::Structures.run_kind(), "scrape-structures");
    }

    #[tokio::test]
    async fn test_archive_results_tallies_each_result() {
        let mut storage = SqliteStorage::new_in_memory().unwrap();
        let (tx, mut rx) = mpsc::channel(4);

        tx.send(FetchResult {
            symbol_name: "VirtualFree".to_string(),
            payload: Some(LIVE_PAGE.as_bytes().to_vec()),
        })
        .await
        .unwrap();
        tx.send(FetchResult {
            symbol_name: "VirtualAlloc".to_string(),
            payload: None,
        })
        .await
        .unwrap();
        tx.send(FetchResult {
            symbol_name: "Broken".to_string(),
            payload: Some(b"<html></html>".to_vec()),
        })
        .await
        .unwrap();
        drop(tx);

        let tally = archive_results(&mut storage, &mut rx).await;

        assert_eq!(tally.succeeded, 1);
        assert_eq!(tally.failures["fetch_failed"], 1);
        assert_eq!(tally.failures["extract_failed"], 1);
        assert_eq!(storage.count_raw_pages().unwrap(), 1);
    }
}
