use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for ntdocs
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub scraper: ScraperConfig,
    pub source: SourceConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub lookup: LookupConfig,
}

/// Fetch scheduler configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ScraperConfig {
    /// Maximum number of fetches in flight at once
    #[serde(rename = "max-concurrent-fetches")]
    pub max_concurrent_fetches: u32,

    /// Minimum time between two dispatches (milliseconds)
    #[serde(rename = "dispatch-delay-ms")]
    pub dispatch_delay_ms: u64,

    /// Deadline for a single HTTP request, body included (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// How long a worker waits for room in the result channel (seconds)
    #[serde(rename = "delivery-timeout-secs")]
    pub delivery_timeout_secs: u64,

    /// Capacity of the bounded result channel
    #[serde(rename = "result-buffer")]
    pub result_buffer: usize,
}

impl ScraperConfig {
    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_secs(self.delivery_timeout_secs)
    }
}

/// Documentation host configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL that symbol paths are appended to
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,
}

/// Read-through lookup cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LookupConfig {
    /// Maximum number of function records kept in memory
    #[serde(rename = "cache-capacity")]
    pub cache_capacity: usize,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self { cache_capacity: 256 }
    }
}
