//! Fetch scheduler
//!
//! This module handles:
//! - Global concurrency limiting via a semaphore
//! - A minimum delay between two dispatches
//! - Handing results to the sink through a bounded channel
//! - Cooperative cancellation of further dispatch
//!
//! Per symbol the lifecycle is `Pending -> InFlight -> {Delivered, Failed}`.
//! The result channel closes only after every spawned worker has finished.

use crate::config::ScraperConfig;
use crate::crawler::PageFetcher;
use crate::state::{DispatchState, SymbolState};
use crate::storage::SymbolReference;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::{JoinHandle, JoinSet};

/// Product of one fetch attempt
#[derive(Debug)]
pub struct FetchResult {
    pub symbol_name: String,
    /// Raw body, `None` when the fetch failed
    pub payload: Option<Vec<u8>>,
}

/// What happened to a batch once every worker has settled
#[derive(Debug, Clone, Default)]
pub struct ScheduleReport {
    /// Fetches started
    pub dispatched: usize,
    /// Results handed to the sink, failures included
    pub delivered: usize,
    /// Fetches that produced no payload
    pub failed: usize,
    /// Results dropped because the sink did not accept them in time
    pub undelivered: usize,
    /// Symbols never dispatched because the batch was cancelled
    pub skipped: usize,
    /// Final state of every symbol in the batch
    pub states: HashMap<String, SymbolState>,
}

impl ScheduleReport {
    pub fn count_in(&self, state: SymbolState) -> usize {
        self.states.values().filter(|&&s| s == state).count()
    }
}

#[derive(Debug)]
struct WorkerOutcome {
    symbol_name: String,
    fetched: bool,
    delivered: bool,
}

/// Drives the page fetcher across a batch of symbols
#[derive(Debug, Clone)]
pub struct FetchScheduler {
    fetcher: PageFetcher,
    base_url: String,
    max_concurrent: usize,
    dispatch_delay: Duration,
    delivery_timeout: Duration,
    result_buffer: usize,
}

impl FetchScheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `fetcher` - The page fetcher shared by all workers
    /// * `config` - Concurrency, pacing and delivery limits
    /// * `base_url` - Documentation host that symbol paths are joined to
    pub fn new(fetcher: PageFetcher, config: &ScraperConfig, base_url: &str) -> Self {
        Self {
            fetcher,
            base_url: base_url.to_string(),
            max_concurrent: config.max_concurrent_fetches.max(1) as usize,
            dispatch_delay: config.dispatch_delay(),
            delivery_timeout: config.delivery_timeout(),
            result_buffer: config.result_buffer.max(1),
        }
    }

    /// Starts fetching a batch in the background
    ///
    /// Results arrive on the returned receiver in completion order, keyed by
    /// symbol name. The receiver yields `None` once every dispatched fetch
    /// has been delivered or given up on. Setting `cancel` to `true` stops
    /// further dispatch; fetches already in flight still complete.
    ///
    /// # Returns
    ///
    /// The result stream and a handle resolving to the batch report
    pub fn schedule(
        self,
        symbols: Vec<SymbolReference>,
        cancel: watch::Receiver<bool>,
    ) -> (mpsc::Receiver<FetchResult>, JoinHandle<ScheduleReport>) {
        let (tx, rx) = mpsc::channel(self.result_buffer);
        let handle = tokio::spawn(self.dispatch_all(symbols, tx, cancel));
        (rx, handle)
    }

    async fn dispatch_all(
        self,
        symbols: Vec<SymbolReference>,
        tx: mpsc::Sender<FetchResult>,
        mut cancel: watch::Receiver<bool>,
    ) -> ScheduleReport {
        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut pacing = DispatchState::new(self.dispatch_delay);
        let mut workers = JoinSet::new();
        let mut report = ScheduleReport {
            states: symbols
                .iter()
                .map(|s| (s.name.clone(), SymbolState::Pending))
                .collect(),
            ..Default::default()
        };

        tracing::info!(
            "Dispatching {} symbols ({} concurrent, {:?} apart)",
            symbols.len(),
            self.max_concurrent,
            self.dispatch_delay
        );

        let total = symbols.len();
        for (index, symbol) in symbols.into_iter().enumerate() {
            if *cancel.borrow() {
                report.skipped = total - index;
                tracing::info!("Dispatch cancelled, {} symbols left pending", report.skipped);
                break;
            }

            if let Some(wait) = pacing.time_until_next_dispatch(Instant::now()) {
                tokio::select! {
                    _ = tokio::time::sleep(wait) => {}
                    _ = cancelled(&mut cancel) => {
                        report.skipped = total - index;
                        tracing::info!("Dispatch cancelled, {} symbols left pending", report.skipped);
                        break;
                    }
                }
            }

            let permit = tokio::select! {
                permit = semaphore.clone().acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = cancelled(&mut cancel) => {
                    report.skipped = total - index;
                    tracing::info!("Dispatch cancelled, {} symbols left pending", report.skipped);
                    break;
                }
            };

            pacing.record_dispatch(Instant::now());
            advance(&mut report.states, &symbol.name, SymbolState::InFlight);
            report.dispatched += 1;

            let url = symbol.absolute_url(&self.base_url);
            let fetcher = self.fetcher.clone();
            let tx = tx.clone();
            let delivery_timeout = self.delivery_timeout;
            let symbol_name = symbol.name;

            tracing::debug!(symbol = %symbol_name, %url, "Dispatching fetch");

            workers.spawn(async move {
                let _permit = permit;

                let payload = match fetcher.fetch(&url).await {
                    Ok(body) => Some(body),
                    Err(e) => {
                        tracing::warn!(symbol = %symbol_name, "{}", e);
                        None
                    }
                };
                let fetched = payload.is_some();

                let result = FetchResult {
                    symbol_name: symbol_name.clone(),
                    payload,
                };
                let delivered = match tx.send_timeout(result, delivery_timeout).await {
                    Ok(()) => true,
                    Err(e) => {
                        tracing::error!(
                            symbol = %symbol_name,
                            "Result not delivered: {}",
                            e
                        );
                        false
                    }
                };

                WorkerOutcome {
                    symbol_name,
                    fetched,
                    delivered,
                }
            });
        }

        // The stream must not close before every worker has sent or given up
        drop(tx);
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    if outcome.delivered {
                        report.delivered += 1;
                    } else {
                        report.undelivered += 1;
                    }
                    if !outcome.fetched {
                        report.failed += 1;
                    }

                    let next = if outcome.fetched && outcome.delivered {
                        SymbolState::Delivered
                    } else {
                        SymbolState::Failed
                    };
                    advance(&mut report.states, &outcome.symbol_name, next);
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::error!("Fetch worker aborted: {}", e);
                }
            }
        }

        tracing::info!(
            "Batch settled: {} dispatched, {} delivered, {} failed, {} undelivered",
            report.dispatched,
            report.delivered,
            report.failed,
            report.undelivered
        );

        report
    }
}

/// Resolves once cancellation is requested; never resolves if the sender is gone
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    if cancel.wait_for(|&requested| requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

fn advance(states: &mut HashMap<String, SymbolState>, name: &str, next: SymbolState) {
    match states.get_mut(name) {
        Some(state) if state.can_transition_to(next) => *state = next,
        Some(state) => {
            tracing::warn!(symbol = name, "Ignoring transition {} -> {}", state, next);
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_follows_lifecycle() {
        let mut states = HashMap::new();
        states.insert("Foo".to_string(), SymbolState::Pending);

        advance(&mut states, "Foo", SymbolState::Delivered);
        assert_eq!(states["Foo"], SymbolState::Pending);

        advance(&mut states, "Foo", SymbolState::InFlight);
        advance(&mut states, "Foo", SymbolState::Failed);
        assert_eq!(states["Foo"], SymbolState::Failed);

        advance(&mut states, "Foo", SymbolState::InFlight);
        assert_eq!(states["Foo"], SymbolState::Failed);
    }

    #[test]
    fn test_report_count_in() {
        let mut report = ScheduleReport::default();
        report.states.insert("a".into(), SymbolState::Delivered);
        report.states.insert("b".into(), SymbolState::Failed);
        report.states.insert("c".into(), SymbolState::Delivered);

        assert_eq!(report.count_in(SymbolState::Delivered), 2);
        assert_eq!(report.count_in(SymbolState::Pending), 0);
    }

    #[tokio::test]
    async fn test_cancelled_resolves_on_signal() {
        let (tx, mut rx) = watch::channel(false);
        let waiter = tokio::spawn(async move { cancelled(&mut rx).await });

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_cancelled_pends_when_sender_dropped() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);

        let result = tokio::time::timeout(Duration::from_millis(50), cancelled(&mut rx)).await;
        assert!(result.is_err());
    }
}
