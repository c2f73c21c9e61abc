//! Integration tests for the fetch scheduler
//!
//! A wiremock responder records when each request reaches the host, which is
//! enough to check concurrency and pacing from the outside.

use ntdocs::config::{ScraperConfig, SourceConfig};
use ntdocs::crawler::{FetchResult, FetchScheduler, PageFetcher, ScheduleReport};
use ntdocs::{SymbolKind, SymbolReference, SymbolState};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

/// Answers every request after `delay`, remembering when each one arrived
#[derive(Clone)]
struct RecordingResponder {
    arrivals: Arc<Mutex<Vec<Instant>>>,
    delay: Duration,
}

impl Respond for RecordingResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        self.arrivals.lock().unwrap().push(Instant::now());
        ResponseTemplate::new(200)
            .set_body_string("<p>page</p>")
            .set_delay(self.delay)
    }
}

async fn recording_server(delay: Duration) -> (MockServer, Arc<Mutex<Vec<Instant>>>) {
    let server = MockServer::start().await;
    let arrivals = Arc::new(Mutex::new(Vec::new()));
    Mock::given(method("GET"))
        .and(path_regex("^/api/"))
        .respond_with(RecordingResponder {
            arrivals: arrivals.clone(),
            delay,
        })
        .mount(&server)
        .await;
    (server, arrivals)
}

fn scraper_config(max_concurrent: u32, delay_ms: u64, delivery_secs: u64, buffer: usize) -> ScraperConfig {
    ScraperConfig {
        max_concurrent_fetches: max_concurrent,
        dispatch_delay_ms: delay_ms,
        request_timeout_secs: 5,
        delivery_timeout_secs: delivery_secs,
        result_buffer: buffer,
    }
}

fn symbols(count: usize) -> Vec<SymbolReference> {
    (0..count)
        .map(|i| SymbolReference {
            header: "winbase.h".to_string(),
            name: format!("Func{}", i),
            kind: SymbolKind::Function,
            url: format!("/api/func{}", i),
        })
        .collect()
}

fn scheduler(server: &MockServer, config: &ScraperConfig) -> FetchScheduler {
    let source = SourceConfig {
        base_url: server.uri(),
        user_agent: "ntdocs-test/0.1".to_string(),
    };
    let fetcher = PageFetcher::new(&source, config.request_timeout()).unwrap();
    FetchScheduler::new(fetcher, config, &server.uri())
}

async fn drain(mut results: mpsc::Receiver<FetchResult>) -> Vec<FetchResult> {
    let mut received = Vec::new();
    while let Some(result) = results.recv().await {
        received.push(result);
    }
    received
}

fn sorted(arrivals: &Arc<Mutex<Vec<Instant>>>) -> Vec<Instant> {
    let mut arrivals = arrivals.lock().unwrap().clone();
    arrivals.sort();
    arrivals
}

#[tokio::test]
async fn test_in_flight_fetches_never_exceed_limit() {
    let response_delay = Duration::from_millis(200);
    let (server, arrivals) = recording_server(response_delay).await;
    let config = scraper_config(2, 10, 5, 8);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let (results, handle) = scheduler(&server, &config).schedule(symbols(6), cancel_rx);
    let received = drain(results).await;
    let report: ScheduleReport = handle.await.unwrap();

    assert_eq!(received.len(), 6);
    assert_eq!(report.delivered, 6);

    // Each request holds a slot until its delayed response is read, so a
    // third request can only start once the one two places earlier is done.
    let arrivals = sorted(&arrivals);
    assert_eq!(arrivals.len(), 6);
    for window in arrivals.windows(3) {
        assert!(
            window[2].duration_since(window[0]) >= response_delay,
            "three requests overlapped: {:?} apart",
            window[2].duration_since(window[0])
        );
    }
}

#[tokio::test]
async fn test_dispatches_are_spaced_by_delay() {
    let delay = Duration::from_millis(150);
    let (server, arrivals) = recording_server(Duration::ZERO).await;
    let config = scraper_config(4, delay.as_millis() as u64, 5, 8);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    let started = Instant::now();
    let (results, handle) = scheduler(&server, &config).schedule(symbols(4), cancel_rx);
    drain(results).await;
    handle.await.unwrap();

    let arrivals = sorted(&arrivals);
    assert_eq!(arrivals.len(), 4);
    assert!(arrivals[3].duration_since(started) >= delay * 3);
    for pair in arrivals.windows(2) {
        // Request latency varies a little, the dispatch spacing does not.
        assert!(pair[1].duration_since(pair[0]) >= delay - Duration::from_millis(50));
    }
}

#[tokio::test]
async fn test_stalled_sink_marks_results_undelivered() {
    let (server, _arrivals) = recording_server(Duration::ZERO).await;
    let config = scraper_config(4, 10, 1, 1);
    let (_cancel_tx, cancel_rx) = watch::channel(false);

    // The receiver is held but never read, so only the buffered slot fills.
    let (_results, handle) = scheduler(&server, &config).schedule(symbols(5), cancel_rx);

    let report = tokio::time::timeout(Duration::from_secs(10), handle)
        .await
        .expect("scheduler did not settle with a stalled sink")
        .unwrap();

    assert_eq!(report.dispatched, 5);
    assert_eq!(report.delivered + report.undelivered, 5);
    assert_eq!(report.delivered, 1);
    assert_eq!(report.undelivered, 4);
    assert_eq!(report.failed, 0);
    assert_eq!(report.count_in(SymbolState::Failed), report.undelivered);
    assert_eq!(report.count_in(SymbolState::Delivered), 1);
    assert_eq!(report.count_in(SymbolState::Pending), 0);
    assert_eq!(report.count_in(SymbolState::InFlight), 0);
}
