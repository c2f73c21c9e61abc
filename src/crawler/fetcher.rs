//! HTTP fetcher implementation
//!
//! One GET per page, no retry. A failed fetch leaves the symbol unscraped so
//! the next pass picks it up again.

use crate::config::SourceConfig;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by a single page fetch
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request to {url} failed: {source}")]
    FetchFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to read body of {url}: {source}")]
    ReadFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The documentation host configuration
/// * `timeout` - Deadline for a whole request, body included
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(FetchError)` - Failed to build client
pub fn build_http_client(config: &SourceConfig, timeout: Duration) -> Result<Client, FetchError> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .gzip(true)
        .brotli(true)
        .build()
        .map_err(FetchError::Client)
}

/// Fetches raw page bodies
///
/// Cloning is cheap; the underlying client shares its connection pool.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(config: &SourceConfig, timeout: Duration) -> Result<Self, FetchError> {
        Ok(Self {
            client: build_http_client(config, timeout)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Issues one GET and reads the whole body
    ///
    /// Transport errors and non-success statuses are `FetchFailed`; a
    /// response whose body cannot be read is `ReadFailed`.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|source| FetchError::FetchFailed {
                url: url.to_string(),
                source,
            })?;

        let body = response
            .bytes()
            .await
            .map_err(|source| FetchError::ReadFailed {
                url: url.to_string(),
                source,
            })?;

        tracing::debug!(url, bytes = body.len(), "Fetched page");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn source(base_url: &str) -> SourceConfig {
        SourceConfig {
            base_url: base_url.to_string(),
            user_agent: "ntdocs-test/0.1".to_string(),
        }
    }

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&source("http://localhost"), Duration::from_secs(5));
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/foo"))
            .and(header("user-agent", "ntdocs-test/0.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&source(&server.uri()), Duration::from_secs(5)).unwrap();
        let body = fetcher
            .fetch(&format!("{}/api/foo", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, b"<html>ok</html>");
    }

    #[tokio::test]
    async fn test_http_error_is_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&source(&server.uri()), Duration::from_secs(5)).unwrap();
        let result = fetcher.fetch(&format!("{}/missing", server.uri())).await;

        assert!(matches!(result, Err(FetchError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_connection_refused_is_fetch_failed() {
        let fetcher =
            PageFetcher::new(&source("http://127.0.0.1:1"), Duration::from_secs(2)).unwrap();
        let result = fetcher.fetch("http://127.0.0.1:1/page").await;

        assert!(matches!(result, Err(FetchError::FetchFailed { .. })));
    }

    #[tokio::test]
    async fn test_timeout_is_fetch_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let fetcher =
            PageFetcher::new(&source(&server.uri()), Duration::from_millis(300)).unwrap();
        let result = fetcher.fetch(&format!("{}/slow", server.uri())).await;

        assert!(matches!(result, Err(FetchError::FetchFailed { .. })));
    }
}
